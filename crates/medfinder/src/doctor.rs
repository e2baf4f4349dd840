// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `medfinder doctor` command implementation.
//!
//! Runs `health_check` against storage and every configured external
//! service, and reports gaps in the provider credentials.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medfinder_config::MedfinderConfig;
use medfinder_core::{HealthStatus, MedfinderError, PluginAdapter};
use medfinder_geo::DistanceRanker;
use medfinder_media::ModalityExtractor;
use medfinder_storage::SqliteStorage;
use medfinder_whatsapp::{channel_for, webhook_for};

use crate::serve::http_client;

/// Per-check bound so one hung service does not stall the report.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

pub async fn run_doctor(config: &MedfinderConfig, plain: bool) -> Result<(), MedfinderError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let client = http_client(config)?;
    let mut results = vec![CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        "valid",
        Instant::now(),
    )];

    let storage = Arc::new(SqliteStorage::new(config.storage.clone(), &config.worker));
    let start = Instant::now();
    match storage.initialize().await {
        Ok(()) => results.push(check_adapter("Catalog", storage.as_ref()).await),
        Err(e) => results.push(CheckResult::new(
            "Catalog",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        )),
    }

    let start = Instant::now();
    results.push(match webhook_for(config) {
        Ok(webhook) => CheckResult::new(
            "Webhook signing",
            CheckStatus::Pass,
            format!("{} signatures verified", webhook.provider()),
            start,
        ),
        Err(e) => CheckResult::new("Webhook signing", CheckStatus::Fail, e.to_string(), start),
    });

    let start = Instant::now();
    match channel_for(config, client.clone()) {
        Ok(channel) => {
            results.push(check_adapter("Channel", channel.as_ref()).await);

            let extractor = ModalityExtractor::from_config(config, client.clone(), channel);
            if extractor.ocr_engines().is_empty() {
                results.push(missing("OCR", "no engine configured"));
            }
            if extractor.speech_engines().is_empty() {
                results.push(missing("Speech", "no engine configured"));
            }
            for engine in extractor.engines() {
                results.push(check_adapter(engine.name(), engine.as_ref()).await);
            }
        }
        Err(e) => results.push(CheckResult::new(
            "Channel",
            CheckStatus::Fail,
            e.to_string(),
            start,
        )),
    }

    let ranker = DistanceRanker::from_config(config, client);
    match ranker.matrix() {
        Some(matrix) => results.push(check_adapter("Distance matrix", matrix.as_ref()).await),
        None => results.push(missing("Distance matrix", "no maps key, straight-line distances only")),
    }

    print_report(&results, use_color);
    Ok(())
}

fn missing(name: &str, message: &str) -> CheckResult {
    CheckResult::new(name, CheckStatus::Warn, message, Instant::now())
}

async fn check_adapter<A: PluginAdapter + ?Sized>(name: &str, adapter: &A) -> CheckResult {
    let start = Instant::now();
    match tokio::time::timeout(CHECK_TIMEOUT, adapter.health_check()).await {
        Ok(Ok(status)) => from_health(name, status, start),
        Ok(Err(e)) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("timeout ({}s)", CHECK_TIMEOUT.as_secs()),
            start,
        ),
    }
}

fn from_health(name: &str, status: HealthStatus, start: Instant) -> CheckResult {
    match status {
        HealthStatus::Healthy => CheckResult::new(name, CheckStatus::Pass, "healthy", start),
        HealthStatus::Degraded(reason) => CheckResult::new(name, CheckStatus::Warn, reason, start),
        HealthStatus::Unhealthy(reason) => CheckResult::new(name, CheckStatus::Fail, reason, start),
    }
}

fn print_report(results: &[CheckResult], use_color: bool) {
    println!();
    println!("  medfinder doctor");
    println!("  {}", "-".repeat(50));

    for result in results {
        println!("{}", format_line(result, use_color));
    }

    println!();
    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    }
    println!();
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (symbol, message) = if use_color {
        match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.clone()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        }
    } else {
        let marker = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        (marker.to_string(), result.message.clone())
    };
    format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
}
