// 📈 Loyalty Aggregator - Daily validations of the top 5 users

use super::top_users::TopUser;
use crate::filters::FilteredView;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LOYALTY_COHORT_SIZE: usize = 5;

/// LoyaltyPoint - One date of the series
///
/// Serializes flat: `{"date": "2024-03-01", "A": 2, "B": 1}`. Users with
/// no validation that day are absent (read as zero). A user literally named
/// `date` is left out of the flat form; `date` always holds the day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoyaltyPoint {
    pub date: String,

    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
}

const DATE_KEY: &str = "date";

impl Serialize for LoyaltyPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let counts = self.counts.iter().filter(|(user, _)| user.as_str() != DATE_KEY);
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(DATE_KEY, &self.date)?;
        for (user, count) in counts {
            map.serialize_entry(user, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyData {
    /// Sorted ascending by date, one entry per date
    pub series: Vec<LoyaltyPoint>,

    /// Tracked users in rank order
    pub user_keys: Vec<String>,
}

pub fn build_loyalty(view: &FilteredView<'_>, top_users: &[TopUser]) -> LoyaltyData {
    let user_keys: Vec<String> = top_users
        .iter()
        .take(LOYALTY_COHORT_SIZE)
        .map(|u| u.usuario.clone())
        .collect();

    let mut by_date: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for validation in &view.validations {
        if !user_keys.contains(&validation.usuario) {
            continue;
        }
        *by_date
            .entry(validation.fecha.clone())
            .or_default()
            .entry(validation.usuario.clone())
            .or_insert(0) += 1;
    }

    let series = by_date
        .into_iter()
        .map(|(date, counts)| LoyaltyPoint { date, counts })
        .collect();

    LoyaltyData { series, user_keys }
}

// ============================================================================
// TESTS
// ============================================================================
