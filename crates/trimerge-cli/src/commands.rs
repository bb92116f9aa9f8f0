use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use tracing::info;
use trimerge_diff::{diff_documents, diff_sides, DocumentChange, DocumentDiff};
use trimerge_merge::{MergeConfig, MergeOutcome, Merger};
use trimerge_types::Side;

use crate::cli::*;

/// Rules used when `merge` is run without `--config`.
const MANUAL_MERGE_PROFILE: &str = include_str!("../../../configs/manual-merge.toml");

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Merge(args) => {
            let passed = cmd_merge(&args, &cli.format)?;
            Ok(if passed { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
        Command::Diff(args) => cmd_diff(&args, &cli.format).map(|()| ExitCode::SUCCESS),
        Command::CheckConfig(args) => cmd_check_config(&args, &cli.format).map(|()| ExitCode::SUCCESS),
    }
}

/// Returns `false` when `--fail-on-conflict` is set and conflicts remain.
fn cmd_merge(args: &MergeArgs, format: &OutputFormat) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => MergeConfig::load(path)?,
        None => MergeConfig::from_toml_str(MANUAL_MERGE_PROFILE)?,
    };
    let merger = Merger::new(config)?;

    let ancestor = read_json(&args.ancestor)?;
    let local = read_json(&args.local)?;
    let incoming = read_json(&args.incoming)?;

    let changes = diff_sides(&ancestor, &local, &incoming);
    let outcome = merger.merge(&ancestor, &local, &incoming)?;
    info!(
        local_changes = changes.local.len(),
        incoming_changes = changes.incoming.len(),
        conflicts = outcome.conflicts.len(),
        "merged documents"
    );

    if let Some(path) = &args.output {
        write_json(path, &outcome.merged)?;
    }

    match format {
        OutputFormat::Json => {
            let report = if args.output.is_some() {
                json!({
                    "conflicts": outcome.conflicts,
                    "suppressed": outcome.suppressed,
                })
            } else {
                serde_json::to_value(&outcome)?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print_merge_summary(&outcome, [
                (Side::Local, &changes.local),
                (Side::Incoming, &changes.incoming),
            ]);
            if args.output.is_none() {
                println!("{}", serde_json::to_string_pretty(&outcome.merged)?);
            }
        }
    }

    Ok(!(args.fail_on_conflict && outcome.has_conflicts()))
}

fn print_merge_summary(outcome: &MergeOutcome, sides: [(Side, &DocumentDiff); 2]) {
    for (side, diff) in sides {
        eprintln!(
            "  {:<9} {} added, {} removed, {} modified",
            format!("{side}:"),
            diff.additions(),
            diff.removals(),
            diff.modifications()
        );
    }
    if outcome.has_conflicts() {
        eprintln!(
            "{} Merged with {} conflict(s) ({} suppressed)",
            "!".yellow().bold(),
            outcome.conflicts.len(),
            outcome.suppressed
        );
        for conflict in &outcome.conflicts {
            eprintln!(
                "  {} at {} (kept {})",
                conflict.kind.to_string().red(),
                conflict.path.to_string().bold(),
                conflict.kept.to_string().cyan()
            );
        }
    } else {
        eprintln!(
            "{} Merged cleanly ({} suppressed)",
            "✓".green().bold(),
            outcome.suppressed
        );
    }
}

fn cmd_diff(args: &DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let old = read_json(&args.old)?;
    let new = read_json(&args.new)?;
    let diff = diff_documents(&old, &new);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => {
            if diff.is_empty() {
                println!("No changes.");
            }
            for change in &diff.changes {
                match change {
                    DocumentChange::Added { path, value } => {
                        println!("{} {}: {}", "+".green(), path.to_string().bold(), value)
                    }
                    DocumentChange::Removed { path, value } => {
                        println!("{} {}: {}", "-".red(), path.to_string().bold(), value)
                    }
                    DocumentChange::Modified { path, old, new } => {
                        println!("{} {}: {} -> {}", "~".yellow(), path.to_string().bold(), old, new)
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_check_config(args: &CheckConfigArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = MergeConfig::load(&args.file)?;
    let comparator_paths: Vec<String> = config.comparators.paths().map(ToString::to_string).collect();
    let suppressed: Vec<String> = config.conflict_filters.iter().map(ToString::to_string).collect();

    match format {
        OutputFormat::Json => {
            let report = json!({
                "valid": true,
                "default_field_op": config.operations.default_field_op(),
                "default_list_op": config.operations.default_list_op(),
                "operations": config.operations.len(),
                "comparators": comparator_paths,
                "conflict_filters": suppressed,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{} {} is valid", "✓".green().bold(), args.file.display().to_string().bold());
            if let Some(op) = config.operations.default_field_op() {
                println!("  Default field op: {}", op.to_string().cyan());
            }
            if let Some(op) = config.operations.default_list_op() {
                println!("  Default list op: {}", op.to_string().cyan());
            }
            println!("  Path operations: {}", config.operations.len());
            println!("  Comparators: {}", comparator_paths.join(", "));
            println!("  Suppressed: {}", suppressed.join(", "));
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text + "\n").with_context(|| format!("failed to write {}", path.display()))
}
