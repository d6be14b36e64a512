use anyhow::Context;
use clap::{Parser, Subcommand};
use scorer_core::domain::evaluation::SurveyRequest;
use scorer_core::scorer::StockScorer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "scorer_cli", about = "Ethical stock evaluations from the command line")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a single company by name.
    Evaluate {
        company_name: String,
    },

    /// Suggest and evaluate a basket of stocks for a survey.
    Basket {
        #[arg(long, default_value = "medium")]
        risk_tolerance: String,

        /// Horizon in years, e.g. "5-10".
        #[arg(long, default_value = "5-10")]
        investment_horizon: String,

        /// Repeat for several priorities.
        #[arg(long = "priority")]
        ethical_priorities: Vec<String>,

        #[arg(long, default_value_t = 4)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = scorer_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let scorer = StockScorer::from_settings(&settings)?;

    let output = match args.command {
        Command::Evaluate { company_name } => {
            let evaluation = scorer
                .evaluate_stock(&company_name)
                .await
                .map_err(anyhow::Error::new)
                .inspect_err(|err| {
                    sentry_anyhow::capture_anyhow(err);
                })
                .with_context(|| format!("evaluation of {company_name} failed"))?;
            serde_json::to_string_pretty(&evaluation)?
        }
        Command::Basket {
            risk_tolerance,
            investment_horizon,
            ethical_priorities,
            count,
        } => {
            let survey = SurveyRequest {
                risk_tolerance,
                investment_horizon,
                ethical_priorities,
                number_of_stocks: count,
            };
            let basket = scorer.suggest_basket(&survey).await;
            tracing::info!(requested = count, returned = basket.len(), "basket ready");
            serde_json::to_string_pretty(&basket)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_sentry(settings: &scorer_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
