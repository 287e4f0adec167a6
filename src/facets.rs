// 🧭 Facet Extractor - Every selectable filter value ever seen
// Computed before the selection is applied so the controls never shrink

use crate::join::EnrichedValidation;
use crate::normalizer::{year_month, UNKNOWN_ROUTE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// FilterOptions - Sorted, de-duplicated facet lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub user_types: Vec<String>,
    pub routes: Vec<String>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
            && self.months.is_empty()
            && self.user_types.is_empty()
            && self.routes.is_empty()
    }

    pub fn has_route(&self, route: &str) -> bool {
        self.routes.binary_search_by(|r| r.as_str().cmp(route)).is_ok()
    }
}

pub fn extract_facets<'a, I>(validations: I) -> FilterOptions
where
    I: IntoIterator<Item = &'a EnrichedValidation>,
{
    let mut years = BTreeSet::new();
    let mut months = BTreeSet::new();
    let mut user_types = BTreeSet::new();
    let mut routes = BTreeSet::new();

    for validation in validations {
        let (year, month) = year_month(&validation.fecha);
        years.insert(year.to_string());
        months.insert(month.to_string());
        user_types.insert(validation.tipo_usuario.clone());
        if validation.ruta != UNKNOWN_ROUTE {
            routes.insert(validation.ruta.clone());
        }
    }

    FilterOptions {
        years: years.into_iter().collect(),
        months: months.into_iter().collect(),
        user_types: user_types.into_iter().collect(),
        routes: routes.into_iter().collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
