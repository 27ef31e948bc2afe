use super::scorer::Scoring;
use crate::domain::decision::DecisionMethod;
use crate::domain::network::NetworkId;

/// What happened when (or whether) the AI advisor was asked.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome {
    NotConsulted,
    Unavailable(String),
    Recommended(NetworkId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub selected: NetworkId,
    pub method: DecisionMethod,
    pub ai_recommendation: Option<NetworkId>,
    pub ai_note: Option<String>,
}

/// Merges the heuristic ranking with the advisor's answer.
///
/// Any answer makes the decision `Hybrid`. The advisor's pick replaces the
/// heuristic pick only when it is itself a ranked survivor of the hard filters;
/// otherwise it is only noted. A degraded scoring has no survivors, so the
/// fallback network always stands.
pub fn combine(scoring: &Scoring, outcome: AiOutcome) -> Combined {
    match outcome {
        AiOutcome::NotConsulted => Combined {
            selected: scoring.selected,
            method: DecisionMethod::Heuristic,
            ai_recommendation: None,
            ai_note: None,
        },
        AiOutcome::Unavailable(reason) => Combined {
            selected: scoring.selected,
            method: DecisionMethod::Heuristic,
            ai_recommendation: None,
            ai_note: Some(format!("AI advisor unavailable: {}", reason)),
        },
        AiOutcome::Recommended(pick) => {
            let viable = scoring.ranking.contains(&pick);
            let (selected, note) = if pick == scoring.selected {
                (
                    scoring.selected,
                    format!("AI advisor agreed with heuristic pick {}", pick),
                )
            } else if viable {
                (
                    pick,
                    format!("AI advisor overrode heuristic pick {} with {}", scoring.selected, pick),
                )
            } else {
                (
                    scoring.selected,
                    format!(
                        "AI advisor suggested {} which is not a viable candidate; kept {}",
                        pick, scoring.selected
                    ),
                )
            };
            Combined {
                selected,
                method: DecisionMethod::Hybrid,
                ai_recommendation: Some(pick),
                ai_note: Some(note),
            }
        }
    }
}
