use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{FlowError, Result};

/// Reward category keys the ranking looks at.
pub mod reward_keys {
    pub const CASHBACK: &str = "all_spends_cashback_pct";
    pub const TRAVEL_MILES: &str = "travel_miles_pct";
}

/// A credit-card offer as supplied by the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub issuer: String,
    pub annual_fee: i64,
    pub eligibility_min_income: i64,
    pub eligibility_min_score: i64,
    #[serde(default)]
    pub rewards: BTreeMap<String, f64>,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Card {
    /// Reward rate for a category, 0 when the card does not list it.
    pub fn reward_rate(&self, category: &str) -> f64 {
        self.rewards.get(category).copied().unwrap_or(0.0)
    }

    /// Number of perks mentioning airport lounges.
    pub fn lounge_perk_count(&self) -> usize {
        self.perks
            .iter()
            .filter(|perk| perk.to_lowercase().contains("lounge"))
            .count()
    }

    /// Income and score thresholds. An unknown score never disqualifies a card.
    pub fn is_eligible(&self, income: i64, score: Option<i64>) -> bool {
        income >= self.eligibility_min_income
            && score.is_none_or(|s| s >= self.eligibility_min_score)
    }
}

/// The read-only card table shared by every session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Arc<[Card]>,
}

impl Catalog {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    /// Build a catalog from a JSON array of card records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cards: Vec<Card> = serde_json::from_str(json)
            .map_err(|e| FlowError::CatalogError(format!("invalid card data: {e}")))?;
        Ok(Self::new(cards))
    }

    /// Load the catalog file once at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FlowError::CatalogError(format!("failed to read {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), cards = catalog.len(), "Card catalog loaded");
        Ok(catalog)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
