// 🧹 Field Normalizer - One canonical shape for three messy sources
// Column renaming + value normalizers (dates, user types, plain strings)

use crate::config::ColumnMap;
use crate::records::{RawRecord, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ============================================================================
// CANONICAL FIELDS & LABELS
// ============================================================================

pub mod fields {
    pub const ID_SALIDA: &str = "id_salida";
    pub const USUARIO: &str = "usuario";
    pub const TIPO_USUARIO: &str = "tipo_usuario";
    pub const FECHA: &str = "fecha";
    pub const TIPO_PASE: &str = "tipo_pase";
    pub const RUTA: &str = "ruta";
    pub const VALIDADO: &str = "validado";
}

pub const STUDENT: &str = "Estudiante";
pub const COLLABORATOR: &str = "Colaborador";
pub const UNKNOWN_USER_TYPE: &str = "Desconocido";
pub const UNKNOWN_ROUTE: &str = "Desconocida";

/// Spreadsheet serial of 1970-01-01 (day 0 = 1899-12-30)
const SERIAL_UNIX_EPOCH: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// ROW NORMALIZATION
// ============================================================================

/// NormalizedRow - A raw row with canonical, lower-cased column names
///
/// Values are still untyped; the typed records (`Ticket`,
/// `EnrichedValidation`) are built from this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    fields: Vec<(String, RawValue)>,
}

impl NormalizedRow {
    /// Cell for a canonical field. `Some(Null)` means the column exists but
    /// the cell is empty.
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// `normalize_string` of a field, "" when absent
    pub fn string(&self, field: &str) -> String {
        normalize_string(self.get(field))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    fn set(&mut self, column: String, value: RawValue) {
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }
}

/// Lower-case and trim every column, then rename through the alias table
pub fn normalize_row(row: &RawRecord, columns: &ColumnMap) -> NormalizedRow {
    let mut normalized = NormalizedRow::default();
    for (column, value) in row.iter() {
        let key = column.trim().to_lowercase();
        let key = match columns.canonical(&key) {
            Some(canonical) => canonical.to_string(),
            None => key,
        };
        normalized.set(key, value.clone());
    }
    normalized
}

// ============================================================================
// VALUE NORMALIZERS
// ============================================================================

/// Trimmed text; blank/absent → ""
pub fn normalize_string(value: Option<&RawValue>) -> String {
    match value {
        Some(v) if !v.is_blank() => v.to_text().trim().to_string(),
        _ => String::new(),
    }
}

/// First letter upper-case, the rest lower-case (after trimming)
pub fn capitalize(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Map the many spellings of a user category to one label
///
/// Unknown categories are kept (capitalized); only blank values become
/// "Desconocido".
pub fn normalize_user_type(value: Option<&RawValue>) -> String {
    let text = normalize_string(value);
    if text.is_empty() {
        return UNKNOWN_USER_TYPE.to_string();
    }

    match text.to_lowercase().as_str() {
        "alumno" | "estudiante" => STUDENT.to_string(),
        "staff" | "colaborador" => COLLABORATOR.to_string(),
        _ => capitalize(&text),
    }
}

/// Normalize any date-ish cell to `YYYY-MM-DD` (UTC), "" when unparseable
pub fn normalize_date(value: Option<&RawValue>) -> String {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => return String::new(),
    };

    let parsed = match value {
        RawValue::Date(dt) => Some(dt.date()),
        RawValue::Number(serial) => from_serial(*serial),
        RawValue::Text(_) | RawValue::Other(_) => {
            let text = value.to_text();
            let text = text.trim();
            parse_date_text(text).or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .and_then(from_serial)
            })
        }
        RawValue::Null | RawValue::Bool(_) => None,
    };

    parsed
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Generic textual date parsing. Offsets are converted to UTC.
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Spreadsheet serial day → calendar date (UTC)
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial == 0.0 {
        return None;
    }
    let millis = ((serial - SERIAL_UNIX_EPOCH) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

/// Split a normalized `YYYY-MM-DD` into (year, month)
pub fn year_month(fecha: &str) -> (&str, &str) {
    let mut parts = fecha.split('-');
    let year = parts.next().unwrap_or("");
    let month = parts.next().unwrap_or("");
    (year, month)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::text(s)
    }

    #[test]
    fn test_normalize_row_renames_and_lowercases() {
        let row = RawRecord::new()
            .with(" ID Salida ", "7")
            .with("Email de Usuario", "a@x.mx")
            .with("Extra Column", "keep");

        let normalized = normalize_row(&row, &ColumnMap::default());
        let columns: Vec<&str> = normalized.columns().collect();

        assert_eq!(columns, vec!["id_salida", "usuario", "extra column"]);
        assert_eq!(normalized.string("usuario"), "a@x.mx");
        assert_eq!(normalized.string("extra column"), "keep");
    }

    #[test]
    fn test_normalize_row_later_alias_wins() {
        let row = RawRecord::new()
            .with("Fecha Inicio", "2024-01-01")
            .with("Fecha Término", "2024-01-31");

        let normalized = normalize_row(&row, &ColumnMap::default());
        assert_eq!(normalized.get("fecha"), Some(&text("2024-01-31")));
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_string(Some(&text("  A  "))), "A");
        assert_eq!(normalize_string(Some(&RawValue::Null)), "");
        assert_eq!(normalize_string(None), "");
        assert_eq!(normalize_string(Some(&RawValue::Number(12.0))), "12");
    }

    #[test]
    fn test_normalize_user_type_known_aliases() {
        assert_eq!(normalize_user_type(Some(&text("Alumno"))), "Estudiante");
        assert_eq!(normalize_user_type(Some(&text(" ESTUDIANTE "))), "Estudiante");
        assert_eq!(normalize_user_type(Some(&text("staff"))), "Colaborador");
        assert_eq!(normalize_user_type(Some(&text("Colaborador"))), "Colaborador");
    }

    #[test]
    fn test_normalize_user_type_unknown_and_blank() {
        assert_eq!(normalize_user_type(Some(&text("INVITADO"))), "Invitado");
        assert_eq!(normalize_user_type(Some(&text("   "))), "Desconocido");
        assert_eq!(normalize_user_type(Some(&RawValue::Null)), "Desconocido");
        assert_eq!(normalize_user_type(None), "Desconocido");
    }

    #[test]
    fn test_capitalize_unicode() {
        assert_eq!(capitalize("éXTERNO"), "Éxterno");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_normalize_date_iso_and_datetime() {
        assert_eq!(normalize_date(Some(&text("2024-03-01"))), "2024-03-01");
        assert_eq!(normalize_date(Some(&text("2024-03-01 08:15:00"))), "2024-03-01");
        assert_eq!(normalize_date(Some(&text("2024-03-01T08:15:00.250"))), "2024-03-01");
        assert_eq!(normalize_date(Some(&text("03/15/2024"))), "2024-03-15");
        assert_eq!(normalize_date(Some(&text("2024/03/15"))), "2024-03-15");
    }

    #[test]
    fn test_normalize_date_offset_converted_to_utc() {
        assert_eq!(
            normalize_date(Some(&text("2024-03-01T23:30:00-06:00"))),
            "2024-03-02"
        );
    }

    #[test]
    fn test_normalize_date_spreadsheet_serial() {
        assert_eq!(normalize_date(Some(&RawValue::Number(45000.0))), "2023-03-15");
        assert_eq!(normalize_date(Some(&text("45000"))), "2023-03-15");
        assert_eq!(normalize_date(Some(&RawValue::Number(25569.0))), "1970-01-01");
    }

    #[test]
    fn test_normalize_date_typed_value() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(normalize_date(Some(&RawValue::Date(dt))), "2024-05-06");
    }

    #[test]
    fn test_normalize_date_garbage_is_empty() {
        assert_eq!(normalize_date(Some(&text("not a date"))), "");
        assert_eq!(normalize_date(Some(&text("31/12/2024"))), "");
        assert_eq!(normalize_date(Some(&RawValue::Null)), "");
        assert_eq!(normalize_date(Some(&RawValue::Number(0.0))), "");
        assert_eq!(normalize_date(Some(&RawValue::Bool(true))), "");
        assert_eq!(normalize_date(Some(&RawValue::Number(1e300))), "");
        assert_eq!(normalize_date(None), "");
    }

    #[test]
    fn test_year_month() {
        assert_eq!(year_month("2024-03-01"), ("2024", "03"));
        assert_eq!(year_month(""), ("", ""));
    }
}
