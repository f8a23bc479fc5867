use std::fs;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use mimalloc::MiMalloc;

use crate::errors::D2dError;
use crate::pareto::isclose;

mod cli;
mod clusterize;
mod config;
mod driver;
mod errors;
mod kernels;
mod logger;
mod moves;
mod neighborhoods;
mod pareto;
mod solutions;
mod tabu;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn evaluate(solution_path: String) -> errors::Result<()> {
    let data = fs::read_to_string(&solution_path)
        .map_err(|e| D2dError::ProblemImport { path: solution_path.clone(), reason: e.to_string() })?;

    let raw: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| D2dError::ProblemImport { path: solution_path.clone(), reason: e.to_string() })?;
    let stored = [
        raw["cost"][0].as_f64().unwrap_or(f64::NAN),
        raw["cost"][1].as_f64().unwrap_or(f64::NAN),
    ];

    let dumped = serde_json::from_value::<solutions::Solution>(raw)
        .map_err(|e| D2dError::ProblemImport { path: solution_path, reason: e.to_string() })?;
    let recomputed = solutions::Solution::new(dumped.drone_paths, dumped.tech_paths);

    if !recomputed.feasible() {
        return Err(D2dError::InfeasibleSolution { reason: "dumped solution violates a capacity/energy/endurance constraint".into() });
    }

    if !isclose(stored[0], recomputed.cost[0]) || !isclose(stored[1], recomputed.cost[1]) {
        return Err(D2dError::Integrity { stored, recomputed: recomputed.cost });
    }

    eprintln!("{}", format!("cost = {:?}", recomputed.cost).green());
    Ok(())
}

fn run() -> errors::Result<()> {
    let mut logger = logger::Logger::new().map_err(|e| D2dError::ProblemImport {
        path: config::CONFIG.outputs.clone(),
        reason: e.to_string(),
    })?;

    if config::CONFIG.dry_run {
        eprintln!("{}", "dry run: config generated, skipping search".yellow());
        return Ok(());
    }

    let front = driver::tabu_search(&mut logger);
    eprintln!(
        "{}",
        format!("Pareto front size = {} (no member dominates another: {})", front.len(), front.no_member_dominates_another())
            .green()
    );

    logger
        .finalize(&front)
        .map_err(|e| D2dError::ProblemImport { path: config::CONFIG.outputs.clone(), reason: e.to_string() })?;

    for solution in front.iter() {
        if !solution.feasible() {
            return Err(D2dError::InfeasibleSolution { reason: format!("{:?}", solution.cost) });
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let outcome = match cli::Arguments::parse().command {
        cli::Commands::Evaluate { solution, .. } => evaluate(solution),
        cli::Commands::Run { .. } => run(),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e}").red());
            ExitCode::FAILURE
        }
    }
}
