use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings,
    presenter::{LoadingSkeleton, View},
    render, QueryController, QueryTransport, SessionError, SubmitOutcome,
};
use shared::domain::{Phase, QueryMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "finquery", about = "Ask finance questions against the query service")]
struct Args {
    /// `quick` for a short answer, `deep` for a researched report.
    #[arg(long, default_value = "quick")]
    mode: QueryMode,
    /// Overrides FINQUERY_API_URL / finquery.toml.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    request_timeout_secs: Option<u64>,
    /// Runs a single query and exits. Starts an interactive prompt when omitted.
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(secs) = args.request_timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }

    let controller = QueryController::from_settings(&settings)
        .context("failed to configure query service client")?;
    controller
        .set_mode(args.mode)
        .await
        .context("failed to select mode")?;
    tracing::info!(base_url = controller.transport().base_url(), "query client ready");

    if !args.query.is_empty() {
        let phase = ask(&controller, &args.query.join(" ")).await;
        return Ok(if phase == Some(Phase::Error) {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    interactive(&controller).await?;
    Ok(ExitCode::SUCCESS)
}

async fn interactive<T: QueryTransport>(controller: &QueryController<T>) -> Result<()> {
    println!("Financial AI Agent. Type a question, `:mode quick|deep` to switch, `:quit` to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line == ":quit" || line == ":q" {
            break;
        }
        if let Some(mode) = line.strip_prefix(":mode") {
            match mode.trim().parse::<QueryMode>() {
                Ok(mode) => match controller.set_mode(mode).await {
                    Ok(()) => println!("mode: {mode}"),
                    Err(err) => eprintln!("{err}"),
                },
                Err(err) => eprintln!("{err}"),
            }
            continue;
        }
        ask(controller, line).await;
    }

    Ok(())
}

/// Submits `query` and prints the resulting view. `None` when the submission was blocked.
async fn ask<T: QueryTransport>(controller: &QueryController<T>, query: &str) -> Option<Phase> {
    controller.set_query_text(query).await;
    let snapshot = controller.snapshot().await;
    if !snapshot.can_submit() {
        return None;
    }
    print_loading(&LoadingSkeleton::for_mode(snapshot.mode()));

    match controller.submit().await {
        SubmitOutcome::Settled(phase) => {
            print_view(&render(&controller.snapshot().await));
            Some(phase)
        }
        SubmitOutcome::Blocked(SessionError::EmptyQuery) => None,
        SubmitOutcome::Blocked(err) => {
            eprintln!("{err}");
            None
        }
        SubmitOutcome::Discarded => None,
    }
}

fn print_loading(skeleton: &LoadingSkeleton) {
    println!("Processing...");
    if let Some(hint) = skeleton.hint {
        println!("{hint}");
    }
}

fn print_view(view: &View) {
    match view {
        View::Idle | View::Loading(_) => {}
        View::Answer(answer) => {
            if let Some(badge) = &answer.confidence {
                println!("Confidence: {}", badge.label());
            }
            println!("{}", answer.body);
            if !answer.sources.is_empty() {
                println!("Sources:");
                for (index, source) in answer.sources.iter().enumerate() {
                    println!(
                        "  {}. {} ({}) {}",
                        index + 1,
                        source.label,
                        source.score_label(),
                        source.href.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        View::Failed { banner } => eprintln!("Error: {banner}"),
    }
}
