// ✅ Quality Filter - Only trustworthy validations reach the aggregators
// Drops rows with no date or no user, then keeps the successful ones

use crate::join::EnrichedValidation;
use serde::{Deserialize, Serialize};

// ============================================================================
// QUALITY SUMMARY
// ============================================================================

/// QualitySummary - What the filter kept and what it dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total: usize,
    pub missing_date: usize,
    pub missing_user: usize,
    pub retained: usize,
    pub successful: usize,
    pub unsuccessful: usize,
}

impl QualitySummary {
    pub fn summary(&self) -> String {
        format!(
            "Validations: {} total, {} retained ({} without date, {} without user), {} successful, {} rejected",
            self.total,
            self.retained,
            self.missing_date,
            self.missing_user,
            self.successful,
            self.unsuccessful
        )
    }

    /// Share of input rows that survived as successful validations (0.0-1.0)
    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }
}

// ============================================================================
// QUALITY FILTER
// ============================================================================

/// QualityOutcome - Both views the rest of the pipeline needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityOutcome {
    /// Rows with a date and a user
    pub retained: Vec<EnrichedValidation>,

    /// Subset of `retained` marked successful (or carrying no flag)
    pub successful: Vec<EnrichedValidation>,

    pub summary: QualitySummary,
}

pub struct QualityFilter;

impl QualityFilter {
    pub fn new() -> Self {
        QualityFilter
    }

    /// Keep rows with both `fecha` and `usuario`, then split out the
    /// successful ones
    pub fn apply(&self, enriched: Vec<EnrichedValidation>) -> QualityOutcome {
        let mut summary = QualitySummary {
            total: enriched.len(),
            ..QualitySummary::default()
        };

        let mut retained = Vec::with_capacity(enriched.len());
        for validation in enriched {
            if validation.fecha.is_empty() {
                summary.missing_date += 1;
                continue;
            }
            if validation.usuario.is_empty() {
                summary.missing_user += 1;
                continue;
            }
            retained.push(validation);
        }

        let successful: Vec<EnrichedValidation> = retained
            .iter()
            .filter(|v| v.is_successful())
            .cloned()
            .collect();

        summary.retained = retained.len();
        summary.successful = successful.len();
        summary.unsuccessful = retained.len() - successful.len();

        QualityOutcome {
            retained,
            successful,
            summary,
        }
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(usuario: &str, fecha: &str, validado: Option<&str>) -> EnrichedValidation {
        EnrichedValidation {
            id_salida: "1".to_string(),
            usuario: usuario.to_string(),
            tipo_usuario: "Estudiante".to_string(),
            fecha: fecha.to_string(),
            ruta: "R1".to_string(),
            tipo_pase: String::new(),
            validado: validado.map(str::to_string),
        }
    }

    #[test]
    fn test_drops_missing_date_and_user() {
        let outcome = QualityFilter::new().apply(vec![
            validation("A", "2024-03-01", None),
            validation("A", "", None),
            validation("", "2024-03-01", None),
            validation("", "", None),
        ]);

        assert_eq!(outcome.retained.len(), 1);
        assert_eq!(outcome.summary.total, 4);
        assert_eq!(outcome.summary.missing_date, 2);
        assert_eq!(outcome.summary.missing_user, 1);
    }

    #[test]
    fn test_successful_subset() {
        let outcome = QualityFilter::new().apply(vec![
            validation("A", "2024-03-01", Some("Si")),
            validation("B", "2024-03-01", Some("No")),
            validation("C", "2024-03-01", None),
            validation("D", "2024-03-01", Some("")),
        ]);

        assert_eq!(outcome.retained.len(), 4);
        let users: Vec<&str> = outcome.successful.iter().map(|v| v.usuario.as_str()).collect();
        assert_eq!(users, vec!["A", "C"]);
        assert_eq!(outcome.summary.unsuccessful, 2);
        assert_eq!(outcome.summary.success_ratio(), 0.5);
    }

    #[test]
    fn test_empty_input() {
        let outcome = QualityFilter::new().apply(vec![]);
        assert!(outcome.successful.is_empty());
        assert_eq!(outcome.summary.success_ratio(), 0.0);
        assert!(outcome.summary.summary().contains("0 total"));
    }
}
