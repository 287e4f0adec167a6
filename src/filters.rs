// 🔎 Filter Applier - Narrow both feeds to one (year, month, user type)

use crate::join::EnrichedValidation;
use crate::normalizer::year_month;
use crate::user_types::Ticket;
use serde::{Deserialize, Serialize};

/// Selection value meaning "no restriction on this axis"
pub const ALL: &str = "all";

fn all() -> String {
    ALL.to_string()
}

/// FilterSelection - The active (year, month, userType) restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    #[serde(default = "all")]
    pub year: String,

    #[serde(default = "all")]
    pub month: String,

    #[serde(default = "all")]
    pub user_type: String,
}

impl FilterSelection {
    pub fn all() -> Self {
        FilterSelection {
            year: all(),
            month: all(),
            user_type: all(),
        }
    }

    pub fn new(year: &str, month: &str, user_type: &str) -> Self {
        FilterSelection {
            year: year.to_string(),
            month: month.to_string(),
            user_type: user_type.to_string(),
        }
    }

    fn axis_matches(selected: &str, value: &str) -> bool {
        selected == ALL || selected == value
    }

    /// Year and month only (used for "new user" detection)
    pub fn matches_period(&self, fecha: &str) -> bool {
        let (year, month) = year_month(fecha);
        Self::axis_matches(&self.year, year) && Self::axis_matches(&self.month, month)
    }

    pub fn matches(&self, fecha: &str, user_type: &str) -> bool {
        self.matches_period(fecha) && Self::axis_matches(&self.user_type, user_type)
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// FilteredView - Borrowed slices of the prepared data for one selection
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub validations: Vec<&'a EnrichedValidation>,
    pub tickets: Vec<&'a Ticket>,
}

/// Successful validations and dated tickets matching the selection
pub fn apply_filters<'a>(
    successful: &'a [EnrichedValidation],
    tickets: &'a [Ticket],
    selection: &FilterSelection,
) -> FilteredView<'a> {
    let validations = successful
        .iter()
        .filter(|v| selection.matches(&v.fecha, &v.tipo_usuario))
        .collect();

    let tickets = tickets
        .iter()
        .filter(|t| t.has_date() && selection.matches(&t.fecha, &t.tipo_usuario))
        .collect();

    FilteredView {
        validations,
        tickets,
    }
}

// ============================================================================
// TESTS
// ============================================================================
