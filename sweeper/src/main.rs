//! Reentrancy Allocation Sweep
//!
//! Runs the allocation optimizer across a grid of victim counts, balance
//! shapes, gas and risk parameters, and records the best allocation of each
//! run together with the environment a replay harness needs.

mod config;
mod leaderboard;
mod stats;
mod sweep;
mod validation;

use anyhow::{Context, Result};
use config::{SweepConfig, DEFAULT_CONFIG_PATH};
use leaderboard::{Entry, Leaderboard};
use stats::{format_eta, RunCounters};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use sweep::{RunRecord, RunStatus};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting reentrancy allocation sweep");

    // Load configuration
    let config = SweepConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using default grid", e);
        if !std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
            if let Err(e) = SweepConfig::write_default(DEFAULT_CONFIG_PATH) {
                log::warn!("Could not write default config: {:#}", e);
            }
        }
        SweepConfig::default_grid()
    });
    config.validate()?;

    let search = config.search_config();
    for report in validation::run_theoretical_validation(&search) {
        log::info!(
            "{}: profit={:.2e} amounts={:?} calls={:?} gas utilization={:.1}% risk utilization={:.1}%",
            report.scenario,
            report.profit as f64,
            report.amounts,
            report.calls,
            report.gas_utilization * 100.0,
            report.risk_utilization * 100.0
        );
    }
    let underperforming = validation::validate_against_baselines(&search)
        .iter()
        .filter(|c| !c.holds())
        .count();
    if underperforming > 0 {
        log::warn!("{} baseline cases beat the optimizer, check constraints", underperforming);
    }

    let specs = sweep::expand_grid(&config);
    let total = specs.len();
    log::info!("Generated {} sweep configurations", total);

    let output_path = shellexpand::tilde(&config.output_path).into_owned();
    let file = File::create(&output_path)
        .context(format!("Failed to create output file {}", output_path))?;
    let mut writer = BufWriter::new(file);

    let counters = Arc::new(RunCounters::new(total));
    let mut board = Leaderboard::new(config.leaderboard_size);

    sweep::run_sweep(
        specs,
        &config.run_settings(),
        &counters,
        config.max_in_flight,
        |record| {
            log_record(&record, &counters);
            if let Some(entry) = Entry::from_record(&record) {
                board.push(entry);
            }
            serde_json::to_writer(&mut writer, &record).context("Failed to encode run record")?;
            writer.write_all(b"\n").context("Failed to write run record")?;
            Ok(())
        },
    )
    .await?;

    writer.flush().context("Failed to flush output")?;

    let tally = counters.snapshot();
    log::info!(
        "Sweep completed in {:.1}s: {} successful, {} failed, {} skipped",
        counters.elapsed().as_secs_f64(),
        tally.completed,
        tally.failed,
        tally.skipped
    );
    log_leaderboard(&board);
    log::info!("Results written to {}", output_path);

    Ok(())
}

fn log_record(record: &RunRecord, counters: &RunCounters) {
    let spec = &record.spec;
    let tally = counters.snapshot();
    let eta = counters
        .eta()
        .map(|eta| format!(" [est. {} left]", format_eta(eta)))
        .unwrap_or_default();

    match &record.status {
        RunStatus::Completed { result, stats } => {
            log::info!(
                "[RESULT] ({}/{}){} run={} victims={} dist={} profit={:.2e} risk={:.3} utility={:.2e}",
                tally.finished(),
                tally.total,
                eta,
                spec.short_id(),
                spec.victim_count,
                spec.distribution,
                result.profit as f64,
                result.detection_risk,
                result.utility
            );
            if stats.truncated {
                log::debug!(
                    "run={} stopped after {} of {} candidates",
                    spec.short_id(),
                    stats.candidates_evaluated,
                    stats.grid_size
                );
            }
            log::debug!("run={} harness env: {:?}", spec.short_id(), record.env);
        }
        RunStatus::Skipped { .. } => {
            log::info!(
                "[SKIPPED] ({}/{}){} No feasible allocation for run={} balances={:?} gas={} alpha={} delta={} lambda={:e}",
                tally.finished(),
                tally.total,
                eta,
                spec.short_id(),
                record.balances,
                spec.gas_budget,
                spec.per_call_risk,
                spec.max_detection_risk,
                spec.risk_weight
            );
        }
        RunStatus::Failed { error } => {
            log::warn!(
                "[FAILED] ({}/{}){} run={}: {}",
                tally.finished(),
                tally.total,
                eta,
                spec.short_id(),
                error
            );
        }
    }
}

fn log_leaderboard(board: &Leaderboard) {
    if board.is_empty() {
        log::info!("No feasible runs");
        return;
    }

    log::info!("Top {} runs by profit:", board.len());
    for (rank, entry) in board.ranked().iter().enumerate() {
        log::info!(
            "  #{} run={} victims={} dist={} profit={:.3} ETH utility={:.2e} risk={:.3} calls={}",
            rank + 1,
            entry.run_id,
            entry.victim_count,
            entry.distribution,
            entry.profit as f64 / 1e18,
            entry.utility,
            entry.detection_risk,
            entry.total_calls
        );
    }
    if let Some(floor) = board.floor() {
        log::debug!("Leaderboard cutoff: {:.3} ETH", floor.profit as f64 / 1e18);
    }
}
