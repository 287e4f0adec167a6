// 🪪 User-Type Resolver - Validations decide who is a student
// Tickets carry a weaker (often missing) signal; the validation feed wins

use crate::normalizer::{
    fields, normalize_date, normalize_user_type, NormalizedRow, UNKNOWN_USER_TYPE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// USER-TYPE MAP
// ============================================================================

/// UserTypeMap - user identifier → resolved category
///
/// First writer wins: once a user has a category, later validation rows for
/// the same user do not change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserTypeMap {
    types: HashMap<String, String>,
}

impl UserTypeMap {
    /// Build from normalized validation rows, in input order
    pub fn from_validations<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedRow>,
    {
        let mut map = UserTypeMap::default();
        for row in rows {
            let user = row.string(fields::USUARIO);
            let user_type = normalize_user_type(row.get(fields::TIPO_USUARIO));
            map.record(user, user_type);
        }
        map
    }

    /// Record a mapping unless the user is blank, the type is unknown, or
    /// the user is already mapped. Returns true when inserted.
    pub fn record(&mut self, user: String, user_type: String) -> bool {
        if user.is_empty() || user_type == UNKNOWN_USER_TYPE {
            return false;
        }
        if self.types.contains_key(&user) {
            return false;
        }
        self.types.insert(user, user_type);
        true
    }

    pub fn get(&self, user: &str) -> Option<&str> {
        self.types.get(user).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ============================================================================
// TICKET
// ============================================================================

/// Ticket - A sold pass with its resolved user category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub usuario: String,

    /// From the UserTypeMap when known, otherwise the ticket's own label
    pub tipo_usuario: String,

    /// `YYYY-MM-DD`, or "" when the ticket's date could not be parsed
    pub fecha: String,

    pub tipo_pase: String,
}

impl Ticket {
    pub fn has_date(&self) -> bool {
        !self.fecha.is_empty()
    }
}

/// Relabel one normalized ticket row through the authoritative map
pub fn resolve_ticket(row: &NormalizedRow, user_types: &UserTypeMap) -> Ticket {
    let usuario = row.string(fields::USUARIO);
    let tipo_usuario = match user_types.get(&usuario) {
        Some(resolved) => resolved.to_string(),
        None => normalize_user_type(row.get(fields::TIPO_USUARIO)),
    };

    Ticket {
        tipo_usuario,
        fecha: normalize_date(row.get(fields::FECHA)),
        tipo_pase: row.string(fields::TIPO_PASE),
        usuario,
    }
}

// ============================================================================
// TESTS
// ============================================================================
