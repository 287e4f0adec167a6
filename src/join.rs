// 🔗 Record Joiner - Validations meet their scheduled service
// Service rows only backfill what the validation itself does not carry

use crate::normalizer::{
    fields, normalize_date, normalize_string, normalize_user_type, NormalizedRow, UNKNOWN_ROUTE,
};
use crate::records::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// ENRICHED VALIDATION
// ============================================================================

/// EnrichedValidation - A validation event merged with its service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedValidation {
    pub id_salida: String,
    pub usuario: String,
    pub tipo_usuario: String,

    /// `YYYY-MM-DD`, or "" when neither the validation nor the service had
    /// a usable date
    pub fecha: String,

    /// Route label, "Desconocida" when unknown
    pub ruta: String,

    pub tipo_pase: String,

    /// `Some` when the merged row had a `validado` column, even if empty
    pub validado: Option<String>,
}

impl EnrichedValidation {
    /// Absent flag counts as success; otherwise it must read "si"
    pub fn is_successful(&self) -> bool {
        match &self.validado {
            Some(flag) => flag.trim().to_lowercase() == "si",
            None => true,
        }
    }

    pub fn has_route(&self) -> bool {
        !self.ruta.is_empty() && self.ruta != UNKNOWN_ROUTE
    }
}

// ============================================================================
// SERVICE INDEX
// ============================================================================

/// ServiceIndex - `id_salida` → service row
///
/// Duplicate identifiers: the last row wins. Rows with a blank identifier
/// are not indexed.
#[derive(Debug, Default)]
pub struct ServiceIndex<'a> {
    services: HashMap<String, &'a NormalizedRow>,
}

impl<'a> ServiceIndex<'a> {
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedRow>,
    {
        let mut services = HashMap::new();
        for row in rows {
            let id = row.string(fields::ID_SALIDA);
            if !id.is_empty() {
                services.insert(id, row);
            }
        }
        ServiceIndex { services }
    }

    pub fn get(&self, id_salida: &str) -> Option<&'a NormalizedRow> {
        if id_salida.is_empty() {
            return None;
        }
        self.services.get(id_salida).copied()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ============================================================================
// JOIN
// ============================================================================

/// Validation cell if the column exists, else the service's cell
fn overlay<'a>(
    validation: &'a NormalizedRow,
    service: Option<&'a NormalizedRow>,
    field: &str,
) -> Option<&'a RawValue> {
    validation
        .get(field)
        .or_else(|| service.and_then(|s| s.get(field)))
}

/// Merge one validation with its service (if any)
pub fn enrich(validation: &NormalizedRow, services: &ServiceIndex<'_>) -> EnrichedValidation {
    let service = services.get(&validation.string(fields::ID_SALIDA));

    let raw_date = match validation.get(fields::FECHA) {
        Some(value) if !value.is_blank() => Some(value),
        _ => service.and_then(|s| s.get(fields::FECHA)),
    };

    let ruta = [
        validation.string(fields::RUTA),
        service.map(|s| s.string(fields::RUTA)).unwrap_or_default(),
    ]
    .into_iter()
    .find(|route| !route.is_empty())
    .unwrap_or_else(|| UNKNOWN_ROUTE.to_string());

    EnrichedValidation {
        id_salida: normalize_string(overlay(validation, service, fields::ID_SALIDA)),
        usuario: validation.string(fields::USUARIO),
        tipo_usuario: normalize_user_type(validation.get(fields::TIPO_USUARIO)),
        fecha: normalize_date(raw_date),
        ruta,
        tipo_pase: normalize_string(overlay(validation, service, fields::TIPO_PASE)),
        validado: overlay(validation, service, fields::VALIDADO)
            .map(|flag| normalize_string(Some(flag))),
    }
}

/// Enrich every validation, keeping input order
pub fn join_validations<'a, I>(validations: I, services: &ServiceIndex<'_>) -> Vec<EnrichedValidation>
where
    I: IntoIterator<Item = &'a NormalizedRow>,
{
    validations
        .into_iter()
        .map(|validation| enrich(validation, services))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
