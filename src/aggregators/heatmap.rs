// 🔥 Heatmap Aggregator - Route × day-of-month usage counts

use crate::facets::FilterOptions;
use crate::filters::{FilteredView, ALL};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// route → (day of month → validations)
pub type HeatmapData = BTreeMap<String, BTreeMap<u32, usize>>;

pub const DAYS_IN_GRID: usize = 31;

/// Day of month of a `YYYY-MM-DD` date (read as a calendar date, so no
/// timezone can shift it)
fn day_of_month(fecha: &str) -> Option<u32> {
    NaiveDate::parse_from_str(fecha, "%Y-%m-%d")
        .ok()
        .map(|date| date.day())
}

pub fn build_heatmap(view: &FilteredView<'_>) -> HeatmapData {
    let mut heatmap = HeatmapData::new();
    for validation in &view.validations {
        if !validation.has_route() {
            continue;
        }
        let Some(day) = day_of_month(&validation.fecha) else {
            continue;
        };
        *heatmap
            .entry(validation.ruta.clone())
            .or_default()
            .entry(day)
            .or_insert(0) += 1;
    }
    heatmap
}

// ============================================================================
// HEATMAP VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub route: String,

    /// Index 0 is day 1; days without validations are 0
    pub days: Vec<usize>,
}

/// HeatmapView - The grid for one route selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapView {
    pub selected_route: String,
    pub rows: Vec<HeatmapRow>,

    /// Largest cell in the displayed rows, never below 1
    pub max_count: usize,
}

impl HeatmapView {
    /// A stale route (no longer offered as a facet) falls back to "all"
    pub fn resolve_route(selected: &str, facets: &FilterOptions) -> String {
        if selected == ALL || facets.has_route(selected) {
            selected.to_string()
        } else {
            ALL.to_string()
        }
    }

    pub fn build(heatmap: &HeatmapData, selected_route: &str) -> Self {
        let rows: Vec<HeatmapRow> = heatmap
            .iter()
            .filter(|(route, _)| selected_route == ALL || route.as_str() == selected_route)
            .map(|(route, days)| {
                let mut grid = vec![0; DAYS_IN_GRID];
                for (day, count) in days {
                    if let Some(cell) = (*day as usize).checked_sub(1).and_then(|i| grid.get_mut(i)) {
                        *cell = *count;
                    }
                }
                HeatmapRow {
                    route: route.clone(),
                    days: grid,
                }
            })
            .collect();

        let max_count = rows
            .iter()
            .flat_map(|row| row.days.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1);

        HeatmapView {
            selected_route: selected_route.to_string(),
            rows,
            max_count,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
