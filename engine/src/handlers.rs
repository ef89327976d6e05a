//! Command handlers
//!
//! One function per CLI subcommand. These sit at the binary edge and use
//! `anyhow` for error context.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tracing::warn;

use sdk::errors::{ErrorClass, VivaErrorExt};
use sdk::types::{
    Evaluation, GenerateTextRequest, InterviewStatus, PromptPreviewRequest, StartInterviewRequest,
    SubmitAnswerRequest,
};

use crate::api;
use crate::cli::InterviewArgs;
use crate::config::Config;
use crate::interview::InterviewService;
use crate::maintenance::Maintenance;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the HTTP API with background maintenance until Ctrl-C
pub async fn handle_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let service = Arc::new(InterviewService::from_config(config));
    let maintenance = Maintenance::for_service(&service, config).spawn();

    let addr = bind.unwrap_or_else(|| config.core.bind_addr.clone());
    let result = api::serve(service, &addr, &config.core.cors_origins)
        .await
        .with_context(|| format!("API server on {} failed", addr));

    maintenance.abort();
    result
}

/// Show provider status and the effective configuration
pub fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let service = InterviewService::from_config(config);
    let health = service.health();

    match format {
        OutputFormat::Json => print_json(&health),
        OutputFormat::Text => {
            println!("Viva v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Default provider: {}", health.default_provider);
            println!(
                "Fallback order:   {}",
                config
                    .ai
                    .priority
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(" → ")
            );
            println!("Bind address:     {}", config.core.bind_addr);
            println!();
            if health.providers.is_empty() {
                println!("✗ No API keys configured");
                println!("  Set OPENAI_API_KEYS, GEMINI_API_KEYS or ANTHROPIC_API_KEYS");
            }
            for provider in &health.providers {
                println!(
                    "✓ {:<10} {} key(s), {} available  [{}]",
                    provider.provider,
                    provider.keys,
                    provider.available_keys,
                    provider.model.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

/// List supported languages
pub fn handle_languages(config: &Config, format: OutputFormat) -> Result<()> {
    let service = InterviewService::from_config(config);
    let languages = service.languages();

    match format {
        OutputFormat::Json => print_json(&languages),
        OutputFormat::Text => {
            for language in languages {
                println!("{:<10} {:<10} {}", language.code, language.name, language.native_name);
            }
            Ok(())
        }
    }
}

/// Send one free-form prompt through the gateway
pub async fn handle_generate(
    config: &Config,
    request: GenerateTextRequest,
    format: OutputFormat,
) -> Result<()> {
    let service = InterviewService::from_config(config);
    let response = service
        .generate_text(request)
        .await
        .context("Generation failed")?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Text => {
            println!("{}", response.text);
            println!();
            println!("[{} / {}]", response.provider, response.model);
            Ok(())
        }
    }
}

/// Print the prompts for one turn
pub fn handle_prompt(
    config: &Config,
    setup: InterviewArgs,
    number: u32,
    previous: String,
    answer: String,
    format: OutputFormat,
) -> Result<()> {
    let service = InterviewService::from_config(config);
    let preview = service.prompt_preview(&PromptPreviewRequest {
        role: setup.role,
        experience_level: setup.level,
        language: setup.language,
        max_questions: setup.questions,
        question_number: number,
        previous_question: previous,
        candidate_answer: answer,
    })?;

    match format {
        OutputFormat::Json => print_json(&preview),
        OutputFormat::Text => {
            println!("--- system ---");
            println!("{}", preview.system_prompt);
            println!();
            println!("--- user ---");
            println!("{}", preview.user_prompt);
            Ok(())
        }
    }
}

/// Interview in the terminal.
///
/// Each line read from stdin is one answer. An empty line asks for a
/// different question; `/quit` ends the interview early.
pub async fn handle_interview(
    config: &Config,
    setup: InterviewArgs,
    format: OutputFormat,
) -> Result<()> {
    let service = InterviewService::from_config(config);
    let started = service
        .start(StartInterviewRequest {
            role: setup.role,
            experience_level: setup.level,
            language: setup.language,
            max_questions: setup.questions,
            user_id: None,
        })
        .await
        .context("Failed to start interview")?;

    let session_id = started.session_id.clone();
    if format == OutputFormat::Json {
        print_json(&started)?;
    } else {
        println!("Interview {} ({} questions)", session_id, started.total_questions);
        println!("Type your answer and press Enter. Empty line: new question. /quit: finish.");
    }
    print_question(started.question_number, started.total_questions, &started.question, format);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    run_turns(&service, &session_id, &mut lines, format).await?;

    let summary = service.complete(&session_id).await?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            println!();
            println!("✓ Interview complete");
            println!("  Answers:  {}/{}", summary.total_answers, summary.total_questions);
            println!("  Duration: {:.0}s", summary.total_duration);
            Ok(())
        }
    }
}

/// Feed answers from `lines` into the session until it completes, input
/// ends or `/quit` is read. Returns the number of accepted answers.
///
/// A recoverable turn failure (a provider hiccup, an unreadable reply) is
/// reported and the same question is asked again; anything else ends the
/// interview with the error.
async fn run_turns<R>(
    service: &InterviewService,
    session_id: &str,
    lines: &mut Lines<R>,
    format: OutputFormat,
) -> Result<u32>
where
    R: AsyncBufRead + Unpin,
{
    let mut answered = 0;
    let mut asked_at = Instant::now();

    loop {
        prompt_marker(format).await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        let is_answer = !line.trim().is_empty();

        let result = service
            .submit_answer(
                session_id,
                SubmitAnswerRequest {
                    candidate_answer: line,
                    duration: asked_at.elapsed().as_secs_f64(),
                    confidence: 1.0,
                    ..Default::default()
                },
            )
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_recoverable() && e.class() != ErrorClass::NotFound => {
                warn!("Turn for session {} failed: {}", session_id, e);
                eprintln!("✗ {}", e);
                eprintln!("  {}", e.user_hint());
                continue;
            }
            Err(e) => return Err(e).context("Turn failed"),
        };
        if is_answer {
            answered += 1;
        }

        if format == OutputFormat::Json {
            print_json(&response)?;
        } else if let Some(evaluation) = &response.evaluation {
            print_evaluation(evaluation);
        }

        if response.interview_status == InterviewStatus::Completed {
            break;
        }
        if let Some(question) = &response.next_question {
            print_question(response.question_number, response.total_questions, question, format);
        }
        asked_at = Instant::now();
    }

    Ok(answered)
}

fn print_question(number: u32, total: u32, question: &str, format: OutputFormat) {
    if format == OutputFormat::Text {
        println!();
        println!("Q{}/{}: {}", number, total, question);
    }
}

fn print_evaluation(evaluation: &Evaluation) {
    println!();
    println!("Score: {:.1}/10", evaluation.score);
    if !evaluation.strengths.is_empty() {
        println!("Strengths:    {}", evaluation.strengths);
    }
    if !evaluation.improvements.is_empty() {
        println!("Improvements: {}", evaluation.improvements);
    }
    if !evaluation.corrected_answer.is_empty() {
        println!("Model answer: {}", evaluation.corrected_answer);
    }
}

async fn prompt_marker(format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Text {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
