// 🚦 Insights Pipeline - Raw record sets + selection → dashboard bundle
//
// normalize → resolve user types → join → quality filter → facets
//           → filter selection → aggregators
//
// Pure: the same inputs always give the same bundle; nothing is cached or
// mutated between calls.

use crate::aggregators::{
    build_heatmap, build_loyalty, compute_kpis, rank_top_users, FirstValidationIndex, HeatmapData,
    Kpi, LoyaltyData, TopUser,
};
use crate::config::PipelineConfig;
use crate::data_quality::{QualityFilter, QualitySummary};
use crate::facets::{extract_facets, FilterOptions};
use crate::filters::{apply_filters, FilterSelection};
use crate::join::{join_validations, EnrichedValidation, ServiceIndex};
use crate::normalizer::{normalize_row, NormalizedRow};
use crate::records::{FileData, RawRecord};
use crate::user_types::{resolve_ticket, Ticket, UserTypeMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// OUTPUT BUNDLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedData {
    pub kpis: Vec<Kpi>,
    pub filter_options: FilterOptions,
    pub heatmap_data: HeatmapData,
    pub top_users: Vec<TopUser>,
    pub loyalty_data: LoyaltyData,
}

impl ProcessedData {
    /// True for the bundle returned when input is missing
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
            && self.filter_options.is_empty()
            && self.heatmap_data.is_empty()
            && self.top_users.is_empty()
            && self.loyalty_data.series.is_empty()
            && self.loyalty_data.user_keys.is_empty()
    }
}

// ============================================================================
// PREPARED DATASET (selection-independent view)
// ============================================================================

/// PreparedDataset - Everything that does not depend on the selection
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub tickets: Vec<Ticket>,
    pub successful: Vec<EnrichedValidation>,
    pub facets: FilterOptions,
    pub quality: QualitySummary,
    first_validations: FirstValidationIndex,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct InsightsEngine {
    config: PipelineConfig,
}

impl InsightsEngine {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        InsightsEngine { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn normalize_all(&self, rows: &[RawRecord]) -> Vec<NormalizedRow> {
        rows.iter()
            .map(|row| normalize_row(row, &self.config.column_map))
            .collect()
    }

    /// Run every selection-independent stage
    ///
    /// `None` when any of the three sources is absent or empty.
    pub fn prepare(&self, files: &FileData) -> Option<PreparedDataset> {
        let (raw_tickets, raw_services, raw_validations) =
            match (&files.tickets, &files.servicios, &files.validaciones) {
                (Some(t), Some(s), Some(v)) if !t.is_empty() && !s.is_empty() && !v.is_empty() => {
                    (t, s, v)
                }
                _ => {
                    debug!("Input incomplete, returning empty bundle");
                    return None;
                }
            };

        let validations = self.normalize_all(raw_validations);
        let services = self.normalize_all(raw_services);

        let user_types = UserTypeMap::from_validations(&validations);
        let tickets: Vec<Ticket> = raw_tickets
            .iter()
            .map(|row| resolve_ticket(&normalize_row(row, &self.config.column_map), &user_types))
            .collect();
        debug!(
            tickets = tickets.len(),
            resolved_users = user_types.len(),
            "Tickets normalized"
        );

        let index = ServiceIndex::build(&services);
        let enriched = join_validations(&validations, &index);
        debug!(
            validations = enriched.len(),
            services = index.len(),
            "Validations joined"
        );

        let outcome = QualityFilter::new().apply(enriched);
        debug!("{}", outcome.summary.summary());

        let facets = extract_facets(&outcome.successful);
        let first_validations = FirstValidationIndex::build(&outcome.successful);

        Some(PreparedDataset {
            tickets,
            successful: outcome.successful,
            facets,
            quality: outcome.summary,
            first_validations,
        })
    }

    /// Full pipeline for one selection
    pub fn process(&self, files: &FileData, selection: &FilterSelection) -> ProcessedData {
        match self.prepare(files) {
            Some(prepared) => prepared.analyze(selection, &self.config),
            None => ProcessedData::default(),
        }
    }
}

impl Default for InsightsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PreparedDataset {
    /// Filter and aggregate for one selection
    pub fn analyze(&self, selection: &FilterSelection, config: &PipelineConfig) -> ProcessedData {
        let view = apply_filters(&self.successful, &self.tickets, selection);
        debug!(
            tickets = view.tickets.len(),
            validations = view.validations.len(),
            "Selection applied"
        );

        let kpis = compute_kpis(&view, &self.first_validations, selection, &config.pass_types);
        let heatmap_data = build_heatmap(&view);
        let top_users = rank_top_users(&view);
        let loyalty_data = build_loyalty(&view, &top_users);

        ProcessedData {
            kpis,
            filter_options: self.facets.clone(),
            heatmap_data,
            top_users,
            loyalty_data,
        }
    }
}

/// Convenience wrapper with the built-in configuration
pub fn process_files(files: &FileData, selection: &FilterSelection) -> ProcessedData {
    InsightsEngine::new().process(files, selection)
}

// ============================================================================
// TESTS
// ============================================================================
