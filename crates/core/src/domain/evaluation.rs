use serde::{Deserialize, Serialize};

/// One axis of the ethical evaluation. The score is whatever the model returned;
/// it is not clamped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreItem {
    pub score: i32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreSet {
    pub military: ScoreItem,
    pub israel: ScoreItem,
    pub environment: ScoreItem,
    pub social: ScoreItem,
    pub governance: ScoreItem,
    pub sharia_compliance: ScoreItem,
    pub ethical_business: ScoreItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationDetails {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub halal_status: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    Company,
    Stock,
    #[serde(rename = "ETF")]
    Etf,
}

/// Live quote snapshot. Fields the provider did not supply stay `None` and are
/// left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEvaluation {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub security_type: SecurityType,
    pub overall_score: i32,
    pub scores: ScoreSet,
    pub details: EvaluationDetails,
    pub market_data: Option<MarketData>,
    pub market_data_error: Option<String>,
}

impl StockEvaluation {
    /// Ticker to look up market data for, if the model returned one.
    pub fn lookup_symbol(&self) -> Option<&str> {
        let symbol = self.symbol.trim();
        (!symbol.is_empty()).then_some(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSuggestion {
    pub symbol: String,
    pub name: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRequest {
    pub risk_tolerance: String,
    pub investment_horizon: String,
    pub ethical_priorities: Vec<String>,
    pub number_of_stocks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::LlmStockEvaluation;
    use serde_json::json;

    #[test]
    fn market_data_omits_absent_fields() {
        let data = MarketData {
            current_price: Some(412.5),
            volume: Some(1_200_000),
            ..Default::default()
        };
        let v = serde_json::to_value(&data).unwrap();
        assert_eq!(v, json!({"current_price": 412.5, "volume": 1_200_000}));
    }

    #[test]
    fn security_type_uses_display_names() {
        assert_eq!(serde_json::to_value(SecurityType::Etf).unwrap(), json!("ETF"));
        assert_eq!(
            serde_json::from_value::<SecurityType>(json!("Stock")).unwrap(),
            SecurityType::Stock
        );
        assert!(serde_json::from_value::<SecurityType>(json!("Bond")).is_err());
    }

    #[test]
    fn score_item_rejects_unexpected_keys() {
        let res = serde_json::from_value::<ScoreItem>(json!({
            "score": 50,
            "notes": [],
            "weight": 2,
        }));
        assert!(res.is_err());
    }

    #[test]
    fn blank_symbol_has_no_lookup() {
        let raw = crate::domain::contract::tests::sample_evaluation_json("  ");
        let eval = LlmStockEvaluation::from_value(raw).unwrap().into_evaluation();
        assert_eq!(eval.lookup_symbol(), None);
    }
}
