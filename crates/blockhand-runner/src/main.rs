//! Agent runtime entry point for Blockhand.
//!
//! The runner gives an agent a body in the sandbox world, listens to chat
//! and observer commands, turns them into decisions through rules and an
//! optional LLM, and dispatches those decisions as tasks. Telemetry flows
//! out to the observer server.
//!
//! # Architecture
//!
//! ```text
//! chat / observer --> Rules --> Prompt Engine --> LLM Backend --> Parser --> Agent
//!                                                                              |
//! observer <------------------------- telemetry <------------------------------+
//! ```
//!
//! Every command gets an answer. If the LLM fails or times out, the agent
//! apologises instead of staying silent.

mod config;
mod error;
mod llm;
mod oracle;
mod parse;
mod prompt;
mod rules;
mod sandbox;
mod session;
mod tools;

use std::sync::Arc;

use anyhow::Context;
use blockhand_agent::{Agent, BehaviorConfig};
use blockhand_observer::{AppState, ServerConfig, start_server};
use blockhand_world::SimWorld;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::llm::create_backend;
use crate::oracle::DecisionOracle;
use crate::prompt::PromptEngine;
use crate::sandbox::{SandboxConfig, spawn_sandbox};
use crate::session::Session;

/// Queue depth for observer commands awaiting a decision.
const COMMAND_QUEUE: usize = 32;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// builds the sandbox world, the decision oracle, and the observer, then
/// runs until interrupted.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("blockhand-runner starting");

    // Load configuration from environment
    let config = RunnerConfig::from_env().context("loading runner configuration")?;
    info!(
        username = config.username,
        decision_timeout_ms = config.decision_timeout.as_millis(),
        routine_command_bypass = config.routine_command_bypass,
        stats_interval_ms = config.stats_interval.as_millis(),
        "configuration loaded"
    );

    let behavior = match &config.behavior_config {
        Some(path) => BehaviorConfig::from_file(path)
            .with_context(|| format!("loading behaviour config {}", path.display()))?,
        None => BehaviorConfig::default(),
    };

    // Load prompt templates
    let prompts = match &config.templates_dir {
        Some(dir) => PromptEngine::from_dir(dir)?,
        None => PromptEngine::builtin()?,
    };

    // Create the LLM backend, if any
    let specs = tools::catalogue();
    let backend = config.backend.as_ref().map(|cfg| {
        let backend = create_backend(cfg, &specs);
        info!(backend = backend.name(), model = cfg.model, "LLM backend configured");
        backend
    });
    let oracle = Arc::new(DecisionOracle::new(
        backend,
        prompts,
        &specs,
        &config.username,
        config.decision_timeout,
        config.routine_command_bypass,
    ));
    if !oracle.is_online() {
        info!("no LLM backend configured, answering routine commands only");
    }

    // Sandbox world and agent
    let seed = config.sandbox_seed.unwrap_or_else(rand::random);
    info!(seed, "building sandbox world");
    let world = Arc::new(SimWorld::demo(&config.username, seed));
    let agent = Agent::new(Arc::clone(&world), behavior);

    // Observer
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let observer = Arc::new(AppState::with_commands(command_tx));
    let server_config = ServerConfig {
        host: config.observer_host.clone(),
        port: config.observer_port,
    };
    let server_state = Arc::clone(&observer);
    let server = tokio::spawn(async move { start_server(&server_config, server_state).await });

    // Session, then the world starts moving
    let shutdown = CancellationToken::new();
    let session = Session::new(agent, oracle, observer, config.stats_interval)
        .start(command_rx, shutdown.clone());
    let sandbox = spawn_sandbox(world, SandboxConfig::default(), shutdown.clone());

    info!("agent runner initialized");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for ctrl-c")?;
            info!("interrupt received, shutting down");
        }
        served = server => {
            match served {
                Ok(Ok(())) => info!("observer server exited"),
                Ok(Err(e)) => error!(error = %e, "observer server failed"),
                Err(e) => error!(error = %e, "observer server task failed"),
            }
        }
    }

    shutdown.cancel();
    session.await.context("joining session")?;
    sandbox.await.context("joining sandbox")?;
    info!("blockhand-runner shutdown complete");
    Ok(())
}
