//! CLI interface for Viva
//!
//! Command-line interface built with clap's derive API. Global flags apply to
//! every subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Viva interview engine
///
/// Runs multi-turn technical interviews in eleven languages on top of
/// OpenAI, Gemini or Anthropic, with key rotation and provider fallback.
#[derive(Parser, Debug)]
#[command(name = "viva")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides config and VIVA_BIND_ADDR)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Show provider key counts and configuration
    Status,

    /// List supported interview languages
    Languages,

    /// Run an interview in the terminal
    Interview {
        #[command(flatten)]
        setup: InterviewArgs,
    },

    /// Send one free-form prompt to a provider
    Generate {
        /// Prompt text
        prompt: String,

        /// openai, gemini or anthropic (default: `ai.default_provider`)
        #[arg(long)]
        provider: Option<String>,

        /// Model override for the chosen provider
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature, 0.0 to 2.0
        #[arg(long)]
        temperature: Option<f32>,

        /// Completion length limit
        #[arg(long, value_name = "N")]
        max_tokens: Option<u32>,
    },

    /// Print the prompts a turn would send, without calling a provider
    Prompt {
        #[command(flatten)]
        setup: InterviewArgs,

        /// Question number the turn is on
        #[arg(long, default_value = "1")]
        number: u32,

        /// Question being answered
        #[arg(long, default_value = "")]
        previous: String,

        /// Candidate answer to evaluate
        #[arg(long, default_value = "")]
        answer: String,
    },
}

/// Who is interviewed, and how
#[derive(clap::Args, Debug, Clone)]
pub struct InterviewArgs {
    /// Job role, e.g. "Rust Developer"
    #[arg(long)]
    pub role: String,

    /// junior, mid or senior
    #[arg(long, default_value = "mid")]
    pub level: String,

    /// Interview language, e.g. english or hindi
    #[arg(long, default_value = "english")]
    pub language: String,

    /// Number of questions (default: `interview.default_max_questions`)
    #[arg(long)]
    pub questions: Option<u32>,
}
