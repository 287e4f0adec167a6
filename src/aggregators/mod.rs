// Aggregators - One dashboard artifact each
//
// Every aggregator reads the same FilteredView and never mutates it:
// - kpi: headline counts and rates
// - heatmap: route × day-of-month usage
// - top_users: ranking by tickets + validations
// - loyalty: per-date activity of the top 5

pub mod kpi;
pub mod heatmap;
pub mod top_users;
pub mod loyalty;

pub use kpi::{compute_kpis, FirstValidationIndex, Kpi};
pub use heatmap::{build_heatmap, HeatmapData, HeatmapRow, HeatmapView};
pub use top_users::{rank_top_users, TopUser, TOP_USERS_LIMIT};
pub use loyalty::{build_loyalty, LoyaltyData, LoyaltyPoint, LOYALTY_COHORT_SIZE};
