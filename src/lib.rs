pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::convert::ConvertArgs;
use crate::core::{ConversionController, RateSource};
use crate::core::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert(ConvertArgs),
    Currencies { base: Option<String> },
    Last,
    Session,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
    pub config_path: Option<&'a str>,
    /// Keep the last result in memory only.
    pub ephemeral: bool,
}

fn build_controller(
    config: &AppConfig,
    rate_source: Arc<dyn RateSource>,
    ephemeral: bool,
) -> Result<ConversionController> {
    let store = store::open_store(config, ephemeral)?;
    Ok(
        ConversionController::new(rate_source, store, &config.default_currency)
            .with_timeout(config.request_timeout()),
    )
}

pub async fn run_command(command: AppCommand, options: RunOptions<'_>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match options.config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let rate_source: Arc<dyn RateSource> = Arc::new(providers::ExchangeRateApiProvider::new(
        &config.providers.exchange_rate_api.base_url,
    ));

    match command {
        AppCommand::Currencies { base } => {
            let base = base.as_deref().unwrap_or(&config.default_currency);
            println!("{}", cli::currencies::run(rate_source.as_ref(), base).await?);
        }
        AppCommand::Convert(args) => {
            let controller = build_controller(&config, rate_source, options.ephemeral)?;
            println!("{}", cli::convert::run(&controller, &args).await?);
        }
        AppCommand::Last => {
            let controller = build_controller(&config, rate_source, options.ephemeral)?;
            println!("{}", cli::last::run(&controller).await);
        }
        AppCommand::Session => {
            let controller = build_controller(&config, rate_source, options.ephemeral)?;
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = std::io::stdout();
            cli::session::run(&controller, input, &mut output).await?;
        }
    }

    Ok(())
}
