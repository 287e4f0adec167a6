// 📥 Raw Records - Untyped rows as they arrive from each source
// Tickets, servicios and validaciones share nothing but "a row of cells"

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// RAW VALUE
// ============================================================================

/// RawValue - One untyped cell
///
/// Decoders produce whatever they can infer: CSV gives `Text`/`Null`,
/// JSON can also give numbers and booleans. `Date` is for decoders that
/// already typed the cell (spreadsheets with date cells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Other(serde_json::Value),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Falsy cell: absent, empty text, zero or `false`.
    ///
    /// Whitespace-only text is NOT blank here; callers that care trim first.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Bool(b) => !b,
            RawValue::Number(n) => *n == 0.0 || n.is_nan(),
            RawValue::Text(s) => s.is_empty(),
            RawValue::Date(_) => false,
            RawValue::Other(v) => v.is_null(),
        }
    }

    /// Render the cell as text, without trimming.
    ///
    /// Integral numbers drop the fractional part ("1", not "1.0").
    pub fn to_text(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Number(n) => format_number(*n),
            RawValue::Text(s) => s.clone(),
            RawValue::Date(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            RawValue::Other(v) => match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// RawRecord - An ordered row: source column name → cell
///
/// Column order is preserved. When two columns normalize to the same
/// canonical field, the later one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        RawRecord { fields: Vec::new() }
    }

    /// Build a record from (column, value) pairs, keeping their order
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawRecord {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Builder pattern: append a column
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Append a column, replacing an existing column with the exact same name
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RawRecordVisitor;

impl<'de> Visitor<'de> for RawRecordVisitor {
    type Value = RawRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object mapping column names to cells")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRecord, A::Error> {
        let mut record = RawRecord::new();
        while let Some((column, value)) = access.next_entry::<String, RawValue>()? {
            record.insert(column, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawRecordVisitor)
    }
}

// ============================================================================
// DATASET SLOTS
// ============================================================================

/// SourceKind - Which of the three sources a record set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Tickets,
    Servicios,
    Validaciones,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Tickets,
        SourceKind::Servicios,
        SourceKind::Validaciones,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::Tickets => "Tickets",
            SourceKind::Servicios => "Servicios",
            SourceKind::Validaciones => "Validaciones",
        }
    }

    /// Short code, also used in URLs
    pub fn code(&self) -> &str {
        match self {
            SourceKind::Tickets => "tickets",
            SourceKind::Servicios => "servicios",
            SourceKind::Validaciones => "validaciones",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// FileData - The three optional record sets
///
/// `None` means "not supplied yet". The pipeline returns an empty bundle
/// until all three are present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    #[serde(default)]
    pub tickets: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub servicios: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub validaciones: Option<Vec<RawRecord>>,
}

impl FileData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, kind: SourceKind) -> Option<&Vec<RawRecord>> {
        match kind {
            SourceKind::Tickets => self.tickets.as_ref(),
            SourceKind::Servicios => self.servicios.as_ref(),
            SourceKind::Validaciones => self.validaciones.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: SourceKind) -> &mut Option<Vec<RawRecord>> {
        match kind {
            SourceKind::Tickets => &mut self.tickets,
            SourceKind::Servicios => &mut self.servicios,
            SourceKind::Validaciones => &mut self.validaciones,
        }
    }

    /// Replace one source. Returns true when a previous set was replaced.
    pub fn set(&mut self, kind: SourceKind, records: Vec<RawRecord>) -> bool {
        self.slot_mut(kind).replace(records).is_some()
    }

    /// Remove one source. Returns true when something was removed.
    pub fn clear(&mut self, kind: SourceKind) -> bool {
        self.slot_mut(kind).take().is_some()
    }

    /// At least one source holds rows
    pub fn has_data(&self) -> bool {
        SourceKind::ALL
            .iter()
            .any(|kind| self.slot(*kind).map_or(false, |rows| !rows.is_empty()))
    }

    /// All three sources are present with at least one row each
    pub fn is_complete(&self) -> bool {
        SourceKind::ALL
            .iter()
            .all(|kind| self.slot(*kind).map_or(false, |rows| !rows.is_empty()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
