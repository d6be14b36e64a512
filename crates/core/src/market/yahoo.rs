use crate::config::Settings;
use crate::market::{MarketDataProvider, QuoteInfo};
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;
use yfinance_rs::core::conversions::money_to_f64;
use yfinance_rs::{Ticker, YfClient, YfError};

const QUOTE_PATH: &str = "v7/finance/quote";

/// Yahoo Finance v7 quotes through `yfinance-rs`, which retries with a
/// cookie+crumb pair when the endpoint answers 401/403.
pub struct YahooQuoteProvider {
    client: YfClient,
}

impl YahooQuoteProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = YfClient::builder();
        if let Some(base) = settings.market_data_base_url.as_deref() {
            builder = builder.base_quote_v7(quote_url(base)?);
        }

        // No timeout unless one is asked for explicitly.
        if let Some(timeout) = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
        {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .context("failed to build Yahoo Finance client")?;
        Ok(Self::new(client))
    }

    pub fn new(client: YfClient) -> Self {
        Self { client }
    }
}

/// `https://host[/prefix]` -> `https://host[/prefix]/v7/finance/quote`
fn quote_url(base: &str) -> Result<Url> {
    let raw = format!("{}/{QUOTE_PATH}", base.trim_end_matches('/'));
    Url::parse(&raw).with_context(|| format!("MARKET_DATA_BASE_URL is not a valid url: {base}"))
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooQuoteProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_v7_quote"
    }

    async fn quote(&self, symbol: &str) -> Result<Option<QuoteInfo>> {
        match Ticker::new(&self.client, symbol).quote().await {
            // The v7 quote carries no security type; only the price fields survive.
            Ok(quote) => Ok(Some(QuoteInfo {
                symbol: Some(symbol.to_string()),
                regular_market_price: quote.price.as_ref().map(money_to_f64),
                regular_market_previous_close: quote.previous_close.as_ref().map(money_to_f64),
                ..QuoteInfo::default()
            })),
            Err(YfError::MissingData(_) | YfError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err).context("Yahoo Finance quote request failed"),
        }
    }
}
