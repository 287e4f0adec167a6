// 🏆 Top-Users Aggregator - Who buys and rides the most

use crate::filters::FilteredView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TOP_USERS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUser {
    pub usuario: String,
    pub tickets: usize,
    pub validaciones: usize,
}

impl TopUser {
    pub fn total(&self) -> usize {
        self.tickets + self.validaciones
    }
}

/// Tally slot for a user, created on first sight; `None` for blank users
fn tally<'u>(
    users: &'u mut Vec<TopUser>,
    positions: &mut HashMap<String, usize>,
    user: &str,
) -> Option<&'u mut TopUser> {
    let user = user.trim();
    if user.is_empty() {
        return None;
    }
    let index = *positions.entry(user.to_string()).or_insert_with(|| {
        users.push(TopUser {
            usuario: user.to_string(),
            tickets: 0,
            validaciones: 0,
        });
        users.len() - 1
    });
    users.get_mut(index)
}

/// Rank users by tickets + validations, descending
///
/// Ties keep first-encountered order (tickets are scanned before
/// validations); `sort_by` is stable. Blank users are never counted.
pub fn rank_top_users(view: &FilteredView<'_>) -> Vec<TopUser> {
    let mut users: Vec<TopUser> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for ticket in &view.tickets {
        if let Some(entry) = tally(&mut users, &mut positions, &ticket.usuario) {
            entry.tickets += 1;
        }
    }
    for validation in &view.validations {
        if let Some(entry) = tally(&mut users, &mut positions, &validation.usuario) {
            entry.validaciones += 1;
        }
    }

    users.sort_by(|a, b| b.total().cmp(&a.total()));
    users.truncate(TOP_USERS_LIMIT);
    users
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::EnrichedValidation;
    use crate::user_types::Ticket;

    fn ticket(usuario: &str) -> Ticket {
        Ticket {
            usuario: usuario.to_string(),
            tipo_usuario: "Estudiante".to_string(),
            fecha: "2024-03-01".to_string(),
            tipo_pase: String::new(),
        }
    }

    fn validation(usuario: &str) -> EnrichedValidation {
        EnrichedValidation {
            id_salida: String::new(),
            usuario: usuario.to_string(),
            tipo_usuario: "Estudiante".to_string(),
            fecha: "2024-03-01".to_string(),
            ruta: "R1".to_string(),
            tipo_pase: String::new(),
            validado: None,
        }
    }

    #[test]
    fn test_rank_by_combined_total() {
        let tickets = vec![ticket("A"), ticket("B"), ticket("B"), ticket("")];
        let validations = vec![validation("A"), validation("A"), validation("C")];
        let view = FilteredView {
            validations: validations.iter().collect(),
            tickets: tickets.iter().collect(),
        };

        let ranked = rank_top_users(&view);

        assert_eq!(
            ranked,
            vec![
                TopUser { usuario: "A".to_string(), tickets: 1, validaciones: 2 },
                TopUser { usuario: "B".to_string(), tickets: 2, validaciones: 0 },
                TopUser { usuario: "C".to_string(), tickets: 0, validaciones: 1 },
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let tickets = vec![ticket("Z"), ticket("Y")];
        let validations = vec![validation("X")];
        let view = FilteredView {
            validations: validations.iter().collect(),
            tickets: tickets.iter().collect(),
        };

        let users: Vec<String> = rank_top_users(&view).into_iter().map(|u| u.usuario).collect();
        assert_eq!(users, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn test_limit_ten() {
        let tickets: Vec<Ticket> = (0..25).map(|i| ticket(&format!("U{i:02}"))).collect();
        let view = FilteredView {
            validations: vec![],
            tickets: tickets.iter().collect(),
        };

        let ranked = rank_top_users(&view);
        assert_eq!(ranked.len(), TOP_USERS_LIMIT);
        assert!(ranked.windows(2).all(|w| w[0].total() >= w[1].total()));
    }
}
