use crate::domain::evaluation::{
    EvaluationDetails, ScoreSet, SecurityType, StockEvaluation, StockSuggestion,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exact shape the evaluation prompt asks the model for. Market data is never
/// accepted from the model, so those keys are rejected like any other extra key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmStockEvaluation {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub security_type: SecurityType,
    pub overall_score: i32,
    pub scores: ScoreSet,
    pub details: EvaluationDetails,
}

impl LlmStockEvaluation {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn into_evaluation(self) -> StockEvaluation {
        StockEvaluation {
            symbol: self.symbol,
            name: self.name,
            security_type: self.security_type,
            overall_score: self.overall_score,
            scores: self.scores,
            details: self.details,
            market_data: None,
            market_data_error: None,
        }
    }
}

/// Basket entries are read leniently: only a usable `name` is needed to drive a
/// full evaluation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmStockSuggestion {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl LlmStockSuggestion {
    pub fn into_suggestion(self) -> Option<StockSuggestion> {
        let name = self
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;

        Some(StockSuggestion {
            symbol: self.symbol.unwrap_or_default().trim().to_string(),
            name,
            reasoning: self.reasoning.unwrap_or_default(),
        })
    }
}

/// Pulls the list of suggestion entries out of a basket payload.
///
/// Accepts a bare array, an object wrapping one array (`{"stocks": [...]}`), or a
/// single suggestion object. Anything else yields no entries.
pub fn suggestion_entries(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => {
            if map.contains_key("name") {
                return vec![Value::Object(map)];
            }
            map.into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

pub fn parse_suggestions(payload: Value) -> Vec<StockSuggestion> {
    suggestion_entries(payload)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            match serde_json::from_value::<LlmStockSuggestion>(entry) {
                Ok(raw) => {
                    let suggestion = raw.into_suggestion();
                    if suggestion.is_none() {
                        tracing::warn!(idx, "basket suggestion has no company name; skipping");
                    }
                    suggestion
                }
                Err(err) => {
                    tracing::warn!(idx, error = %err, "malformed basket suggestion; skipping");
                    None
                }
            }
        })
        .collect()
}
