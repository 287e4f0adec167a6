// 📊 KPI Aggregator - Headline numbers for the selected period
// Counts by user category and pass type, usage efficiency, new-user rate

use crate::config::PassType;
use crate::filters::{FilterSelection, FilteredView};
use crate::join::EnrichedValidation;
use crate::normalizer::{COLLABORATOR, STUDENT};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Kpi - One metric card: title, formatted value, description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub title: String,
    pub value: String,
    pub description: String,
}

impl Kpi {
    fn new(title: &str, value: String, description: &str) -> Self {
        Kpi {
            title: title.to_string(),
            value,
            description: description.to_string(),
        }
    }
}

// ============================================================================
// FIRST VALIDATION INDEX
// ============================================================================

/// FirstValidationIndex - user → earliest successful validation date
///
/// Built once over ALL successful validations, independent of any
/// selection. `YYYY-MM-DD` strings compare chronologically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirstValidationIndex {
    first_seen: HashMap<String, String>,
}

impl FirstValidationIndex {
    pub fn build<'a, I>(successful: I) -> Self
    where
        I: IntoIterator<Item = &'a EnrichedValidation>,
    {
        let mut first_seen: HashMap<String, String> = HashMap::new();
        for validation in successful {
            match first_seen.get_mut(&validation.usuario) {
                Some(date) if validation.fecha < *date => *date = validation.fecha.clone(),
                Some(_) => {}
                None => {
                    first_seen.insert(validation.usuario.clone(), validation.fecha.clone());
                }
            }
        }
        FirstValidationIndex { first_seen }
    }

    pub fn first_seen(&self, user: &str) -> Option<&str> {
        self.first_seen.get(user).map(String::as_str)
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// `1234567` → `"1,234,567"`
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `part / whole × 100` with one decimal and a percent sign; 0 when
/// `whole` is zero
pub fn format_rate(part: usize, whole: usize) -> String {
    let rate = if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    };
    // Halves round up (1.25 → "1.3"), not to even
    let tenths = (rate * 10.0).round() / 10.0;
    format!("{:.1}%", tenths)
}

// ============================================================================
// KPI COMPUTATION
// ============================================================================

pub fn compute_kpis(
    view: &FilteredView<'_>,
    first_validations: &FirstValidationIndex,
    selection: &FilterSelection,
    pass_types: &[PassType],
) -> Vec<Kpi> {
    let tickets = &view.tickets;
    let mut kpis = Vec::with_capacity(pass_types.len() + 5);

    kpis.push(Kpi::new(
        "Tickets Totales",
        format_count(tickets.len()),
        "Total de tickets vendidos",
    ));

    let students = tickets.iter().filter(|t| t.tipo_usuario == STUDENT).count();
    kpis.push(Kpi::new(
        "Estudiantes",
        format_count(students),
        "Tickets de estudiantes",
    ));

    let collaborators = tickets
        .iter()
        .filter(|t| t.tipo_usuario == COLLABORATOR)
        .count();
    kpis.push(Kpi::new(
        "Colaboradores",
        format_count(collaborators),
        "Tickets de colaboradores",
    ));

    for pass in pass_types {
        let count = tickets.iter().filter(|t| t.tipo_pase == pass.key).count();
        kpis.push(Kpi {
            title: pass.title.clone(),
            value: format_count(count),
            description: format!("Total de {}", pass.key),
        });
    }

    kpis.push(Kpi::new(
        "Eficiencia de Uso",
        format_rate(view.validations.len(), tickets.len()),
        "Tickets validados vs. vendidos",
    ));

    let users_in_period: HashSet<&str> = view
        .validations
        .iter()
        .map(|v| v.usuario.as_str())
        .collect();
    let new_users = users_in_period
        .iter()
        .filter(|user| {
            first_validations
                .first_seen(user)
                .map_or(false, |first| selection.matches_period(first))
        })
        .count();
    kpis.push(Kpi::new(
        "Nuevos Usuarios",
        format_rate(new_users, users_in_period.len()),
        "Usuarios validando por 1ra vez",
    ));

    kpis
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_pass_types;
    use crate::filters::apply_filters;
    use crate::user_types::Ticket;

    fn ticket(usuario: &str, tipo: &str, fecha: &str, pase: &str) -> Ticket {
        Ticket {
            usuario: usuario.to_string(),
            tipo_usuario: tipo.to_string(),
            fecha: fecha.to_string(),
            tipo_pase: pase.to_string(),
        }
    }

    fn validation(usuario: &str, fecha: &str) -> EnrichedValidation {
        EnrichedValidation {
            id_salida: String::new(),
            usuario: usuario.to_string(),
            tipo_usuario: "Estudiante".to_string(),
            fecha: fecha.to_string(),
            ruta: "R1".to_string(),
            tipo_pase: String::new(),
            validado: None,
        }
    }

    fn value<'a>(kpis: &'a [Kpi], title: &str) -> &'a str {
        kpis.iter()
            .find(|k| k.title == title)
            .map(|k| k.value.as_str())
            .unwrap()
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1, 1), "100.0%");
        assert_eq!(format_rate(1, 3), "33.3%");
        assert_eq!(format_rate(5, 0), "0.0%");
    }

    #[test]
    fn test_format_rate_rounds_halves_up() {
        assert_eq!(format_rate(1, 80), "1.3%");
        assert_eq!(format_rate(1, 400), "0.3%");
        assert_eq!(format_rate(3, 400), "0.8%");
    }

    #[test]
    fn test_kpi_order_and_pass_types() {
        let tickets = vec![
            ticket("A", "Estudiante", "2024-03-01", "Pase semanal"),
            ticket("B", "Colaborador", "2024-03-02", "Pase mensual colaboradores"),
            ticket("C", "Invitado", "2024-03-03", "Pase semanal"),
        ];
        let validations = vec![validation("A", "2024-03-01")];
        let selection = FilterSelection::all();
        let view = apply_filters(&validations, &tickets, &selection);
        let index = FirstValidationIndex::build(&validations);

        let kpis = compute_kpis(&view, &index, &selection, &default_pass_types());
        let titles: Vec<&str> = kpis.iter().map(|k| k.title.as_str()).collect();

        assert_eq!(
            titles,
            vec![
                "Tickets Totales",
                "Estudiantes",
                "Colaboradores",
                "Pases Semestrales",
                "Pases Semanales",
                "Pases Redondos",
                "Pases de Verano",
                "Pases Mensual Colab.",
                "Pases Especiales",
                "Eficiencia de Uso",
                "Nuevos Usuarios",
            ]
        );
        assert_eq!(value(&kpis, "Tickets Totales"), "3");
        assert_eq!(value(&kpis, "Estudiantes"), "1");
        assert_eq!(value(&kpis, "Colaboradores"), "1");
        assert_eq!(value(&kpis, "Pases Semanales"), "2");
        assert_eq!(value(&kpis, "Pases Redondos"), "0");
        assert_eq!(value(&kpis, "Eficiencia de Uso"), "33.3%");
        assert_eq!(kpis[4].description, "Total de Pase semanal");
    }

    #[test]
    fn test_new_user_rate_uses_global_first_date() {
        let tickets = vec![ticket("A", "Estudiante", "2024-03-01", "")];
        let validations = vec![
            validation("A", "2024-02-10"),
            validation("A", "2024-03-01"),
            validation("B", "2024-03-05"),
        ];
        let index = FirstValidationIndex::build(&validations);
        assert_eq!(index.first_seen("A"), Some("2024-02-10"));

        let march = FilterSelection::new("2024", "03", "all");
        let view = apply_filters(&validations, &tickets, &march);
        let kpis = compute_kpis(&view, &index, &march, &default_pass_types());

        // A first validated in February, B in March
        assert_eq!(value(&kpis, "Nuevos Usuarios"), "50.0%");
        assert_eq!(value(&kpis, "Eficiencia de Uso"), "200.0%");
    }

    #[test]
    fn test_kpis_with_no_data_are_zero() {
        let view = FilteredView::default();
        let kpis = compute_kpis(
            &view,
            &FirstValidationIndex::default(),
            &FilterSelection::all(),
            &default_pass_types(),
        );

        assert_eq!(kpis.len(), 11);
        assert_eq!(value(&kpis, "Tickets Totales"), "0");
        assert_eq!(value(&kpis, "Eficiencia de Uso"), "0.0%");
        assert_eq!(value(&kpis, "Nuevos Usuarios"), "0.0%");
    }
}
