pub mod yahoo;

use crate::domain::evaluation::MarketData;
use serde::Deserialize;
use thiserror::Error;

/// Advisory failure attached to an evaluation; never fails the evaluation itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketDataError {
    #[error("No valid equity data found for symbol '{symbol}'. It may be delisted or an incorrect ticker.")]
    NotFound { symbol: String },

    #[error("An unexpected error occurred while fetching market data for {symbol}: {detail}")]
    Unexpected { symbol: String, detail: String },
}

/// Quote fields as the provider names them. Both the v7 quote names and the
/// shorter `info` names are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInfo {
    pub symbol: Option<String>,
    pub quote_type: Option<String>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    #[serde(alias = "dayHigh")]
    pub regular_market_day_high: Option<f64>,
    #[serde(alias = "dayLow")]
    pub regular_market_day_low: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(alias = "volume")]
    pub regular_market_volume: Option<f64>,
    #[serde(alias = "previousClose")]
    pub regular_market_previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

impl QuoteInfo {
    /// Quotes without a type (the v7 quote through `yfinance-rs`) count as equity.
    fn is_equity(&self) -> bool {
        self.quote_type
            .as_deref()
            .is_none_or(|t| t.eq_ignore_ascii_case("EQUITY"))
    }

    /// Maps an equity quote with a current price into `MarketData`.
    pub fn into_market_data(self) -> Option<MarketData> {
        if !self.is_equity() {
            return None;
        }
        let current_price = self.current_price.or(self.regular_market_price)?;

        Some(MarketData {
            current_price: Some(current_price),
            day_high: self.regular_market_day_high,
            day_low: self.regular_market_day_low,
            market_cap: self.market_cap.and_then(whole_number),
            volume: self.regular_market_volume.and_then(whole_number),
            previous_close: self.regular_market_previous_close,
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
        })
    }
}

fn whole_number(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0).then(|| v.round() as u64)
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Raw quote lookup. `Ok(None)` means the provider knows nothing about `symbol`.
    async fn quote(&self, symbol: &str) -> anyhow::Result<Option<QuoteInfo>>;

    async fn market_data(&self, symbol: &str) -> Result<MarketData, MarketDataError> {
        let info = self.quote(symbol).await.map_err(|err| MarketDataError::Unexpected {
            symbol: symbol.to_string(),
            detail: format!("{err:#}"),
        })?;

        info.and_then(QuoteInfo::into_market_data)
            .ok_or_else(|| MarketDataError::NotFound {
                symbol: symbol.to_string(),
            })
    }
}
