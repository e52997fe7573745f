use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::cli::convert::ConvertArgs;
use fxconv::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Do not persist the last result to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        amount: String,
        /// Source currency, defaults to the configured base currency
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency, defaults to the first other loaded currency
        #[arg(short, long)]
        to: Option<String>,
        /// Swap source and target before converting
        #[arg(short, long)]
        swap: bool,
    },
    /// List the available currencies and their rates
    Currencies {
        /// Base currency for the rates
        #[arg(short, long)]
        base: Option<String>,
    },
    /// Show the last conversion result
    Last,
    /// Start an interactive conversion session
    Session,
}

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                swap,
            } => fxconv::AppCommand::Convert(ConvertArgs {
                amount,
                from,
                to,
                swap,
            }),
            Commands::Currencies { base } => fxconv::AppCommand::Currencies { base },
            Commands::Last => fxconv::AppCommand::Last,
            Commands::Session => fxconv::AppCommand::Session,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = fxconv::RunOptions {
        config_path: cli.config_path.as_deref(),
        ephemeral: cli.ephemeral,
    };
    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(cmd) => fxconv::run_command(cmd.into(), options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
