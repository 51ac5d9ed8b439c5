use super::config::CourseConfig;
use super::roster::{load_roster, RosterEntry};
use super::script::{locate_script, run_script, ScriptRewriter};
use crate::cli::CourseArgs;
use crate::error::Result;
use crate::git::GitRepo;
use crate::model::AnalysisOptions;
use crate::summary::{analyze, render_text};
use anyhow::Context;
use console::style;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// One row of the timing table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRow {
    #[serde(rename = "ID")]
    pub student_id: String,
    pub time: f64,
    pub outcome: String,
}

/// Partition lists and timings produced by a course run.
#[derive(Debug, Default)]
pub struct CourseOutcome {
    pub inaccessible: Vec<RosterEntry>,
    pub unrunnable: Vec<RosterEntry>,
    pub invalid: Vec<RosterEntry>,
    pub timings: Vec<TimingRow>,
    pub reports_written: usize,
}

pub fn exec(args: CourseArgs) -> anyhow::Result<()> {
    let mut config = CourseConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(roster) = args.roster {
        config.roster = roster;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if args.recalc {
        config.recalc_summaries = true;
    }
    if args.run_all {
        config.run_new_only = false;
    }
    if let Some(timeout) = args.timeout {
        config.script_timeout = timeout;
        config.timeout().context("Invalid --timeout")?;
    }

    let entries = load_roster(&config.roster, &config.student_column, &config.repo_column)
        .context("Failed to read roster")?;
    let outcome = run_course(&config, &entries)?;

    print_partitions(&outcome, &config.script_name);
    write_timings(&config.timings_path(), &outcome.timings)
        .context("Failed to write timing table")?;
    println!(
        "\n{} timings written to {}",
        style(outcome.timings.len()).cyan(),
        config.timings_path().display()
    );
    Ok(())
}

/// Process every roster entry in order.
///
/// A failure for one student lands in a partition list and never stops the rest.
pub fn run_course(config: &CourseConfig, entries: &[RosterEntry]) -> Result<CourseOutcome> {
    let options = config.analysis_options()?;
    let timeout = config.timeout()?;
    let rewriter = ScriptRewriter::new()?;
    std::fs::create_dir_all(&config.output_dir)?;

    let mut outcome = CourseOutcome::default();
    let total = entries.len();

    for (n, entry) in entries.iter().enumerate() {
        println!(
            "processing {} ({}/{})",
            style(&entry.student_id).bold(),
            n + 1,
            total
        );

        if config.is_invalid_reference(&entry.repo_ref) {
            info!("{} submitted an invalid repository", entry.student_id);
            outcome.invalid.push(entry.clone());
            continue;
        }

        let student_dir = config.output_dir.join(&entry.student_id);
        let report_path = student_dir.join(&config.report_file);

        if !report_path.exists() || config.recalc_summaries {
            if let Err(e) = write_report(entry, &student_dir, &report_path, &options) {
                warn!("Could not summarise {}: {}", entry.student_id, e);
                eprintln!(
                    "{} could not fetch {} ({}): {}",
                    style("ERROR").red(),
                    entry.repo_ref,
                    entry.student_id,
                    e
                );
                outcome.inaccessible.push(entry.clone());
                continue;
            }
            outcome.reports_written += 1;
        }

        let Some(script) = locate_script(&student_dir, &config.script_name) else {
            outcome.unrunnable.push(entry.clone());
            continue;
        };

        let output_path = student_dir.join(&config.output_file);
        if config.run_new_only && output_path.exists() {
            println!("Skipping...");
            continue;
        }

        let run = rewriter
            .rewrite_file(&script)
            .and_then(|_| run_script(&config.interpreter, &script, &output_path, timeout));
        let run = match run {
            Ok(run) => run,
            Err(e) => {
                warn!("Could not run {}: {}", script.display(), e);
                outcome.unrunnable.push(entry.clone());
                continue;
            }
        };
        info!(
            "{} finished with {} in {:.2}s",
            entry.student_id,
            run.outcome.as_str(),
            run.elapsed.as_secs_f64()
        );
        outcome.timings.push(TimingRow {
            student_id: entry.student_id.clone(),
            time: run.elapsed.as_secs_f64(),
            outcome: run.outcome.as_str().to_string(),
        });
    }

    Ok(outcome)
}

fn write_report(
    entry: &RosterEntry,
    student_dir: &Path,
    report_path: &Path,
    options: &AnalysisOptions,
) -> Result<()> {
    std::fs::create_dir_all(student_dir)?;
    let repo = GitRepo::open_or_clone(&entry.repo_ref, Some(student_dir))?;
    let report = analyze(&repo, options, false)?;
    std::fs::write(report_path, render_text(&report, options.detail))?;
    Ok(())
}

pub fn write_timings(path: &Path, timings: &[TimingRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in timings {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_partitions(outcome: &CourseOutcome, script_name: &str) {
    let sections = [
        ("Could not access the following repos:".to_string(), &outcome.inaccessible),
        (
            format!("Could not run {script_name} in the following repos:"),
            &outcome.unrunnable,
        ),
        (
            "The following students submitted invalid repos:".to_string(),
            &outcome.invalid,
        ),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        println!("\n{}", style(title).bold());
        for entry in entries {
            println!("- {} ({})", entry.student_id, entry.repo_ref);
        }
    }
}
