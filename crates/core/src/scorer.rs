use crate::config::Settings;
use crate::domain::contract::{self, LlmStockEvaluation};
use crate::domain::evaluation::{StockEvaluation, StockSuggestion, SurveyRequest};
use crate::llm::json::is_empty_payload;
use crate::llm::openrouter::OpenRouterClient;
use crate::llm::{LlmClient, LlmError};
use crate::market::yahoo::YahooQuoteProvider;
use crate::market::MarketDataProvider;
use crate::prompt;
use futures::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_BASKET_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Failed to get a valid response from the AI model.")]
    EmptyResponse,

    #[error("AI response does not match the evaluation schema: {0}")]
    Schema(#[source] serde_json::Error),
}

#[derive(Clone)]
pub struct StockScorer {
    llm: Arc<dyn LlmClient>,
    market: Arc<dyn MarketDataProvider>,
    basket_concurrency: usize,
}

impl StockScorer {
    pub fn new(llm: Arc<dyn LlmClient>, market: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            llm,
            market,
            basket_concurrency: DEFAULT_BASKET_CONCURRENCY,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let llm = OpenRouterClient::from_settings(settings)?;
        let market = YahooQuoteProvider::from_settings(settings)?;

        let basket_concurrency = std::env::var("BASKET_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_BASKET_CONCURRENCY);

        Ok(Self::new(Arc::new(llm), Arc::new(market)).with_basket_concurrency(basket_concurrency))
    }

    /// Caps how many suggestions are evaluated at once. Zero is treated as one.
    pub fn with_basket_concurrency(mut self, limit: usize) -> Self {
        self.basket_concurrency = limit.max(1);
        self
    }

    pub async fn evaluate_stock(&self, company_name: &str) -> Result<StockEvaluation, ScorerError> {
        let payload = self
            .llm
            .complete_json(&prompt::evaluation_prompt(company_name))
            .await?;
        if is_empty_payload(&payload) {
            return Err(ScorerError::EmptyResponse);
        }

        let mut evaluation = LlmStockEvaluation::from_value(payload)
            .map_err(ScorerError::Schema)?
            .into_evaluation();

        if let Some(symbol) = evaluation.lookup_symbol().map(str::to_string) {
            match self.market.market_data(&symbol).await {
                Ok(data) => evaluation.market_data = Some(data),
                Err(err) => {
                    tracing::warn!(
                        %symbol,
                        provider = self.market.provider_name(),
                        error = %err,
                        "market data unavailable"
                    );
                    evaluation.market_data_error = Some(err.to_string());
                }
            }
        }

        tracing::info!(
            company_name,
            provider = ?self.llm.provider(),
            symbol = %evaluation.symbol,
            overall_score = evaluation.overall_score,
            "stock evaluated"
        );
        Ok(evaluation)
    }

    /// Evaluates the model's suggestions for `survey`, in suggestion order, skipping any
    /// that fail. Never errors; returns at most `number_of_stocks` evaluations.
    pub async fn suggest_basket(&self, survey: &SurveyRequest) -> Vec<StockEvaluation> {
        let limit = survey.number_of_stocks;
        if limit == 0 {
            return Vec::new();
        }

        let suggestions = match self.llm.complete_json(&prompt::basket_prompt(survey)).await {
            Ok(payload) if !is_empty_payload(&payload) => contract::parse_suggestions(payload),
            Ok(_) => {
                tracing::warn!("basket completion was empty; returning no suggestions");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(error = %err, "basket completion failed; returning no suggestions");
                return Vec::new();
            }
        };
        let suggested = suggestions.len();
        tracing::info!(suggested, requested = limit, "evaluating basket suggestions");

        let this = self;
        let mut evaluations = pin!(futures::stream::iter(suggestions)
            .map(move |suggestion| async move {
                let result = this.evaluate_stock(&suggestion.name).await;
                (suggestion, result)
            })
            .buffered(self.basket_concurrency));

        // `limit` comes straight from the request and may be arbitrarily large.
        let mut out = Vec::with_capacity(limit.min(suggested));
        while let Some((suggestion, result)) = evaluations.next().await {
            match result {
                Ok(evaluation) => {
                    out.push(evaluation);
                    if out.len() >= limit {
                        break;
                    }
                }
                Err(err) => log_skipped(&suggestion, &err),
            }
        }
        out
    }
}

fn log_skipped(suggestion: &StockSuggestion, err: &ScorerError) {
    tracing::warn!(
        name = %suggestion.name,
        symbol = %suggestion.symbol,
        error = %err,
        "could not evaluate basket suggestion; skipping"
    );
}
