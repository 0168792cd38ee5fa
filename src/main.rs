use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use agentdeck::cli::handlers;
use agentdeck::cli::{Cli, Commands};
use agentdeck::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays the transcript
    let default_directive: Directive = "agentdeck=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(url) = &cli.url {
        config.backend.url = url.clone();
    }

    match cli.command {
        Commands::State => handlers::show_state(config).await,
        Commands::Init { session } => handlers::init_session(config, session).await,
        Commands::Send { message } => handlers::send_message(config, message.join(" ")).await,
        Commands::Upload { paths } => handlers::upload_files(config, paths).await,
        Commands::Chat { session } => handlers::run_chat(config, session).await,
        Commands::Config { write } => handlers::show_config(config, write).await,
    }
}
