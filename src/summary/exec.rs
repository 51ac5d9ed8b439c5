use super::aggregate::{compute_pace, summarize};
use super::output::{render_json, render_text};
use crate::cli::ReportArgs;
use crate::error::Result;
use crate::git::{CommitDiffer, GitRepo};
use crate::model::{
    AnalysisOptions, CensusOutcome, CommitRecord, DiffTally, Report, TimelineEntry,
    TimelineLine, SCHEMA_VERSION,
};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

pub fn exec(args: ReportArgs) -> anyhow::Result<()> {
    let options = args.analysis_options()?;
    let repo = GitRepo::open_or_clone(&args.source, args.output_dir.as_deref())
        .with_context(|| format!("Could not fetch {}", args.source))?;

    let report = analyze(&repo, &options, true).context("Failed to analyse repository")?;

    let rendered = if args.json {
        render_json(&report)?
    } else {
        render_text(&report, options.detail)
    };

    match &args.out {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Walk, diff and summarise one repository.
pub fn analyze(repo: &GitRepo, options: &AnalysisOptions, progress: bool) -> Result<Report> {
    let commits = repo.walk_from_head()?;
    let timeline = collect_timeline(repo, &commits, options, progress);

    let (census, total_files) = match commits.last() {
        Some(head) => (
            repo.count_tracked_lines(head.tree, options.extensions.as_deref())?,
            repo.count_files(head.tree)?,
        ),
        None => (CensusOutcome::default(), 0),
    };
    if census.excluded() > 0 {
        warn!(
            "{} binary or unreadable files left out of the HEAD line count",
            census.excluded()
        );
    }

    let summary = summarize(&timeline, &census, total_files, options.velocity_ceiling);

    Ok(Report {
        version: SCHEMA_VERSION,
        source: repo.source().to_string(),
        timeline: attach_pace(timeline, options),
        summary,
    })
}

/// Diff every commit in order; a commit whose diff fails becomes a `Skipped` entry.
pub fn collect_timeline<D: CommitDiffer>(
    differ: &D,
    commits: &[CommitRecord],
    options: &AnalysisOptions,
    progress: bool,
) -> Vec<TimelineEntry> {
    let pb = if progress {
        ProgressBar::new(commits.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Analysing commits...");

    let mut timeline = Vec::with_capacity(commits.len());
    for commit in commits {
        match differ.diff_commit(commit, options.extensions.as_deref()) {
            Ok(diff) => timeline.push(TimelineEntry::Commit(DiffTally::from_commit(commit, diff))),
            Err(e) => {
                warn!("Skipping commit {}: {}", commit.short_id(), e);
                timeline.push(TimelineEntry::Skipped {
                    short_id: commit.short_id(),
                    timestamp: commit.timestamp,
                    reason: e.to_string(),
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    timeline
}

fn attach_pace(timeline: Vec<TimelineEntry>, options: &AnalysisOptions) -> Vec<TimelineLine> {
    let paces = compute_pace(&timeline, options.velocity_ceiling);
    timeline
        .into_iter()
        .zip(paces)
        .map(|(entry, pace)| TimelineLine { entry, pace })
        .collect()
}
