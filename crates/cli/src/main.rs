// Parley CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Every command drives the same SyncController the UI would use,
// so resume, failover, and stop behave identically from the terminal.
// Design Decision: Logs go to stderr so stdout stays parseable in json/yaml mode.

mod client;
mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "parley_cli=info,parley_core=info,parley_client=info";

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley CLI - Drive and follow agentic runs for conversations")]
#[command(version)]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "PARLEY_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, env = "PARLEY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory for resumable run pointers
    #[arg(long, env = "PARLEY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message and follow the run until it finishes
    Chat {
        /// Message text to send
        message: String,

        /// Project ID
        #[arg(long, short)]
        project: String,

        /// Conversation ID (a new one is generated if omitted)
        #[arg(long, short)]
        conversation: Option<String>,

        /// Max wait time in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Submit and exit without following the run
        #[arg(long)]
        no_wait: bool,
    },

    /// Resume the stored run of a conversation and follow it
    Resume {
        /// Project ID
        #[arg(long, short)]
        project: String,

        /// Conversation ID
        #[arg(long, short)]
        conversation: String,

        /// Max wait time in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Stop the active run of a conversation
    Stop {
        /// Project ID
        #[arg(long, short)]
        project: String,

        /// Conversation ID
        #[arg(long, short)]
        conversation: String,
    },

    /// Print the current timeline of a conversation
    Timeline {
        /// Project ID
        #[arg(long, short)]
        project: String,

        /// Conversation ID
        #[arg(long, short)]
        conversation: String,
    },

    /// Remove the stored run pointer of a conversation
    Forget {
        /// Conversation ID
        #[arg(long, short)]
        conversation: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = client::Client::new(
        cli.api_url.as_deref(),
        cli.api_key.as_deref(),
        cli.data_dir.as_deref(),
    )?;
    let output_format = output::OutputFormat::from_str(&cli.output);

    match cli.command {
        Commands::Chat {
            message,
            project,
            conversation,
            timeout,
            no_wait,
        } => {
            commands::chat::run(
                &client,
                output_format,
                cli.quiet,
                message,
                project,
                conversation,
                timeout,
                no_wait,
            )
            .await
        }
        Commands::Resume {
            project,
            conversation,
            timeout,
        } => {
            commands::resume::run(
                &client,
                output_format,
                cli.quiet,
                project,
                conversation,
                timeout,
            )
            .await
        }
        Commands::Stop {
            project,
            conversation,
        } => commands::stop::run(&client, output_format, project, conversation).await,
        Commands::Timeline {
            project,
            conversation,
        } => commands::timeline::run(&client, output_format, project, conversation).await,
        Commands::Forget { conversation } => {
            commands::forget::run(&client, output_format, cli.quiet, conversation).await
        }
    }
}
