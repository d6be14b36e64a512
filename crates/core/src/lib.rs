pub mod domain;
pub mod llm;
pub mod market;
pub mod prompt;
pub mod scorer;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub openrouter_api_key: Option<String>,
        pub openrouter_base_url: Option<String>,
        pub market_data_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                openrouter_api_key: non_blank_env("OPENROUTER_API_KEY"),
                openrouter_base_url: non_blank_env("OPENROUTER_BASE_URL"),
                market_data_base_url: non_blank_env("MARKET_DATA_BASE_URL"),
                sentry_dsn: non_blank_env("SENTRY_DSN"),
            })
        }

        pub fn require_openrouter_api_key(&self) -> anyhow::Result<&str> {
            self.openrouter_api_key
                .as_deref()
                .context("OPENROUTER_API_KEY is required")
        }
    }

    fn non_blank_env(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

}
