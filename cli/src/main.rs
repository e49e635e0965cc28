//! CLI entrypoint for parley
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use parley_application::{
    ConversationLogger, ModelInvoker, NoConversationLogger, NoProgress, ProgressNotifier,
    QueryDispatcher, ReasoningEngine, UnavailableReasoning,
};
use parley_domain::Query;
use parley_infrastructure::{ConfigLoader, FileConfig, JsonlConversationLogger, LlmReasoningEngine};
use parley_presentation::{Cli, ConsoleFormatter, OutputSettings, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Invalid configuration")?
    };

    let _log_guard = init_logging(cli.verbose, &config);

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        println!();
        print!("{}", ConfigLoader::render(&config)?);
        return Ok(());
    }

    let Some(question) = cli.question.clone() else {
        bail!("A question is required. See --help for usage.");
    };

    let settings = OutputSettings::from_file(
        config.output.format,
        config.output.color,
        config.output.progress,
    )
    .with_flags(cli.output, cli.no_color, cli.quiet);
    settings.apply_color();

    let catalog = config.to_catalog();
    if catalog.usable_count() == 0 {
        bail!(
            "No enabled models configured. Add [[models]] entries to ./parley.toml or {}",
            ConfigLoader::global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the global config".to_string())
        );
    }

    let query = Query::parse(question, cli.mode)?
        .with_params(cli.query_params().map_err(anyhow::Error::msg)?);

    info!(
        "Starting parley ({} mode, {} usable models)",
        query.mode(),
        catalog.usable_count()
    );

    // === Dependency Injection ===
    let invoker = build_invoker(&config)?;

    let reasoning: Arc<dyn ReasoningEngine> = match config.moderator_model() {
        Some(model) => Arc::new(
            LlmReasoningEngine::new(Arc::clone(&invoker), model)
                .with_max_tokens(config.moderator.max_tokens)
                .with_temperature(config.moderator.temperature),
        ),
        None => Arc::new(UnavailableReasoning),
    };

    let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
        Some(path) => match JsonlConversationLogger::open(path) {
            Ok(logger) => {
                info!("Conversation log: {}", logger.path().display());
                Arc::new(logger)
            }
            Err(e) => {
                warn!("Could not open conversation log {}: {}", path.display(), e);
                Arc::new(NoConversationLogger)
            }
        },
        None => Arc::new(NoConversationLogger),
    };

    let dispatcher = QueryDispatcher::new(invoker)
        .with_reasoning(reasoning)
        .with_conversation_logger(logger)
        .with_params(config.to_params());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling query");
            ctrl_c.cancel();
        }
    });

    let progress: Box<dyn ProgressNotifier> = if !settings.progress {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let envelope = dispatcher
        .dispatch_with_progress(&query, &catalog, progress.as_ref(), &cancel)
        .await?;

    println!("{}", ConsoleFormatter::render(&envelope, settings.format));

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    let log_file = config.logging.file.as_ref().and_then(|path| {
        let file_name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        Some((dir, file_name))
    });

    match log_file {
        Some((dir, file_name)) => {
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            None
        }
    }
}

#[cfg(feature = "http")]
fn build_invoker(config: &FileConfig) -> Result<Arc<dyn ModelInvoker>> {
    use parley_infrastructure::HttpModelInvoker;

    let endpoints = config.to_endpoints();
    if endpoints.is_empty() {
        warn!("No model has an endpoint configured; every invocation will fail");
    }
    let invoker = HttpModelInvoker::new(endpoints, config.backend.timeout())?;
    Ok(Arc::new(invoker))
}

#[cfg(not(feature = "http"))]
fn build_invoker(_config: &FileConfig) -> Result<Arc<dyn ModelInvoker>> {
    bail!("parley was built without the `http` feature; no model backend is available")
}
