use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;

use stickyledger::config::Config;
use stickyledger::error::AppError;
use stickyledger::gateway::reconcile_call;
use stickyledger::pricing::PricingCatalog;
use stickyledger::routing::{
    Deployment, Selection, candidates, configured_shares, deployments_from_registry, select_index,
};
use stickyledger::usage::UsageEngine;

use crate::cli::{Cli, Commands};
use crate::output::{
    ReconcileRow, ReconcileSummary, RouteOutcome, RouteRow, ShareRow, output_distribution_json,
    output_reconcile_json, output_route_json, print_distribution_table, print_reconcile_table,
    print_route_table,
};

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
}

pub(crate) fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let ctx = CommandContext { cli, config };
    match &cli.command {
        Commands::Route {
            deployments,
            model,
            sessions,
        } => handle_route(&ctx, deployments, model, sessions),
        Commands::Distribution {
            deployments,
            model,
            samples,
        } => handle_distribution(&ctx, deployments, model, *samples),
        Commands::Reconcile { inputs, pricing } => {
            handle_reconcile(&ctx, inputs, pricing.as_deref())
        }
    }
}

/// Read a roster file: a JSON array of flat or gateway-native deployment maps.
pub(crate) fn load_roster(path: &Path, default_weight: u64) -> Result<Vec<Deployment>, AppError> {
    let content = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_json::from_str(&content).map_err(|source| AppError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(entries) = data else {
        return Err(AppError::NotADeploymentList {
            path: path.to_path_buf(),
        });
    };

    let deployments = deployments_from_registry(&entries, default_weight);
    tracing::debug!(
        path = %path.display(),
        entries = entries.len(),
        deployments = deployments.len(),
        "loaded deployment roster"
    );
    Ok(deployments)
}

fn handle_route(
    ctx: &CommandContext<'_>,
    roster: &Path,
    model: &str,
    sessions: &[String],
) -> Result<(), AppError> {
    let deployments = load_roster(roster, ctx.config.default_weight)?;
    let candidate_count = candidates(model, &deployments).len();

    let rows: Vec<RouteRow> = sessions
        .iter()
        .map(|session| {
            let (outcome, chosen) = match select_index(Some(session), model, &deployments) {
                Selection::Selected(i) => (RouteOutcome::Selected, Some(&deployments[i])),
                Selection::Passthrough => (RouteOutcome::Passthrough, None),
                Selection::NoMatch => (RouteOutcome::NoMatch, None),
            };
            RouteRow {
                session_id: session.clone(),
                outcome,
                deployment_id: chosen.map(|d| d.deployment_id.clone()),
                weight: chosen.map(|d| d.weight),
            }
        })
        .collect();

    if ctx.cli.json {
        println!("{}", output_route_json(model, candidate_count, &rows));
    } else {
        print_route_table(model, candidate_count, &rows, ctx.cli.use_color());
    }
    Ok(())
}

/// Route `samples` synthetic sessions and count where each one lands.
pub(crate) fn simulate_distribution(
    deployments: &[Deployment],
    model: &str,
    samples: usize,
) -> Vec<ShareRow> {
    let counts = (0..samples)
        .into_par_iter()
        .fold(
            || vec![0usize; deployments.len()],
            |mut acc, i| {
                let session = format!("session-{i}");
                if let Selection::Selected(index) = select_index(Some(&session), model, deployments) {
                    acc[index] += 1;
                }
                acc
            },
        )
        .reduce(
            || vec![0usize; deployments.len()],
            |mut acc, partial| {
                for (total, n) in acc.iter_mut().zip(partial) {
                    *total += n;
                }
                acc
            },
        );

    configured_shares(model, deployments)
        .into_iter()
        .map(|(index, configured_share)| {
            let d = &deployments[index];
            let sessions = counts[index];
            ShareRow {
                deployment_id: d.deployment_id.clone(),
                weight: d.weight,
                configured_share,
                sessions,
                observed_share: if samples == 0 {
                    0.0
                } else {
                    sessions as f64 / samples as f64
                },
            }
        })
        .collect()
}

fn handle_distribution(
    ctx: &CommandContext<'_>,
    roster: &Path,
    model: &str,
    samples: usize,
) -> Result<(), AppError> {
    let deployments = load_roster(roster, ctx.config.default_weight)?;
    let rows = simulate_distribution(&deployments, model, samples);
    if rows.is_empty() {
        println!("No healthy deployment serves {model}.");
        return Ok(());
    }

    if ctx.cli.json {
        println!("{}", output_distribution_json(model, samples, &rows));
    } else {
        print_distribution_table(model, samples, &rows, ctx.cli.use_color());
    }
    Ok(())
}

/// Expand file arguments: existing paths are taken as-is, anything else as a glob.
pub(crate) fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let entries = glob::glob(input).map_err(|e| AppError::Pattern {
            pattern: input.clone(),
            message: e.to_string(),
        })?;
        let before = files.len();
        files.extend(entries.flatten().filter(|p| p.is_file()));
        if files.len() == before {
            tracing::warn!(pattern = %input, "no files matched");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[derive(Default)]
struct FileOutcome {
    rows: Vec<ReconcileRow>,
    summary: ReconcileSummary,
}

fn reconcile_file(
    path: &Path,
    engine: &UsageEngine,
    catalog: &PricingCatalog,
) -> Result<FileOutcome, AppError> {
    let file = File::open(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source_label = path.display().to_string();
    let mut outcome = FileOutcome::default();
    outcome.summary.files = 1;

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((mut call, response)) = parse_record(trimmed) else {
            tracing::debug!(file = %source_label, line = index + 1, "skipping malformed call record");
            outcome.summary.skipped += 1;
            continue;
        };

        match reconcile_call(engine, catalog, &mut call, &response) {
            Some(reconciliation) => {
                outcome.summary.record(&reconciliation);
                outcome.rows.push(ReconcileRow {
                    source: source_label.clone(),
                    line: index + 1,
                    reconciliation,
                });
            }
            None => outcome.summary.untouched += 1,
        }
    }
    Ok(outcome)
}

/// Split a `{"call": {..}, "response": ..}` line into its parts.
fn parse_record(line: &str) -> Option<(Value, Value)> {
    let Value::Object(mut record) = serde_json::from_str::<Value>(line).ok()? else {
        return None;
    };
    let call = record.remove("call").filter(Value::is_object)?;
    let response = record.remove("response")?;
    Some((call, response))
}

fn merge_outcomes(mut acc: FileOutcome, other: FileOutcome) -> FileOutcome {
    acc.rows.extend(other.rows);
    let s = &mut acc.summary;
    s.files += other.summary.files;
    s.reconciled += other.summary.reconciled;
    s.untouched += other.summary.untouched;
    s.skipped += other.summary.skipped;
    s.priced += other.summary.priced;
    s.prior_total += other.summary.prior_total;
    s.final_total += other.summary.final_total;
    acc
}

fn handle_reconcile(
    ctx: &CommandContext<'_>,
    inputs: &[String],
    pricing: Option<&Path>,
) -> Result<(), AppError> {
    let files = expand_inputs(inputs)?;
    if files.is_empty() {
        println!("No call records found.");
        return Ok(());
    }

    let catalog = match pricing {
        Some(path) => PricingCatalog::load(path)?,
        None => PricingCatalog::default(),
    };
    let engine = ctx.config.usage_engine();

    let outcomes = files
        .par_iter()
        .map(|path| reconcile_file(path, &engine, &catalog))
        .collect::<Result<Vec<_>, _>>()?;
    let FileOutcome { mut rows, summary } = outcomes
        .into_iter()
        .fold(FileOutcome::default(), merge_outcomes);
    rows.sort_by(|a, b| a.source.cmp(&b.source).then(a.line.cmp(&b.line)));

    if ctx.cli.json {
        println!("{}", output_reconcile_json(&rows, &summary));
    } else if rows.is_empty() {
        println!(
            "No reconcilable call records ({} untouched, {} skipped lines).",
            summary.untouched, summary.skipped
        );
    } else {
        print_reconcile_table(&rows, &summary, ctx.cli.use_color());
    }
    Ok(())
}
