// Viva interview engine
// Main entry point for the viva binary

use clap::Parser;
use viva_engine::cli::{Cli, Command};
use viva_engine::config::Config;
use sdk::types::GenerateTextRequest;
use viva_engine::handlers::{
    handle_generate, handle_interview, handle_languages, handle_prompt, handle_serve,
    handle_status, OutputFormat,
};
use viva_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };
    config.apply_env_overrides()?;

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!(
        "Viva v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Serve { bind } => handle_serve(&config, bind).await,
        Command::Status => handle_status(&config, format),
        Command::Languages => handle_languages(&config, format),
        Command::Interview { setup } => handle_interview(&config, setup, format).await,
        Command::Generate {
            prompt,
            provider,
            model,
            temperature,
            max_tokens,
        } => {
            let request = GenerateTextRequest {
                prompt,
                provider,
                model,
                temperature,
                max_tokens,
            };
            handle_generate(&config, request, format).await
        }
        Command::Prompt {
            setup,
            number,
            previous,
            answer,
        } => handle_prompt(&config, setup, number, previous, answer, format),
    }
}
