use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::catalog::{Card, Catalog, reward_keys};
use crate::parse::{parse_credit_score, parse_income};
use crate::question::question_keys;
use crate::storage::Answers;

/// Upper bound on the number of cards returned.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Ranking family selected by the user's stated reward preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Cashback,
    Miles,
    Lounges,
    /// Anything else. Only reachable when validation is bypassed; ranks by annual fee.
    Other,
}

impl Preference {
    pub fn from_answer(answer: &str) -> Self {
        let pref = answer.trim().to_lowercase();
        match pref.as_str() {
            "cashback" => Preference::Cashback,
            "miles" => Preference::Miles,
            _ if pref.contains("lounge") => Preference::Lounges,
            _ => Preference::Other,
        }
    }

    fn compare(&self, a: &Card, b: &Card) -> Ordering {
        match self {
            Preference::Cashback => b
                .reward_rate(reward_keys::CASHBACK)
                .total_cmp(&a.reward_rate(reward_keys::CASHBACK)),
            Preference::Miles => b
                .reward_rate(reward_keys::TRAVEL_MILES)
                .total_cmp(&a.reward_rate(reward_keys::TRAVEL_MILES)),
            Preference::Lounges => b.lounge_perk_count().cmp(&a.lounge_perk_count()),
            Preference::Other => a.annual_fee.cmp(&b.annual_fee),
        }
    }
}

/// Filter the catalog by income and credit score, rank by preference and keep the top
/// [`MAX_RECOMMENDATIONS`]. Unparseable income or score yields an empty list.
pub fn recommend(answers: &Answers, catalog: &Catalog) -> Vec<Card> {
    let income = match parse_income(answers.get(question_keys::INCOME).unwrap_or_default()) {
        Ok(income) => income,
        Err(e) => {
            warn!(error = %e, "Could not parse income, no recommendation");
            return Vec::new();
        }
    };
    let score =
        match parse_credit_score(answers.get(question_keys::CREDIT_SCORE).unwrap_or_default()) {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Could not parse credit score, no recommendation");
                return Vec::new();
            }
        };

    let mut eligible: Vec<&Card> = catalog
        .cards()
        .iter()
        .filter(|card| card.is_eligible(income, score))
        .collect();

    let preference =
        Preference::from_answer(answers.get(question_keys::PREFERENCE).unwrap_or_default());
    // sort_by is stable: equal-ranked cards keep catalog order
    eligible.sort_by(|a, b| preference.compare(a, b));

    debug!(
        income,
        score = ?score,
        preference = ?preference,
        eligible = eligible.len(),
        "Ranked eligible cards"
    );

    eligible
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .cloned()
        .collect()
}
