use crate::model::{CommitPace, Report, RunSummary, TimelineEntry, TimelineLine};
use anyhow::Result;
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the plain-text report.
///
/// The timeline block is only included when `detail` is set; skip warnings
/// are always present, inline on the timeline or in their own block.
pub fn render_text(report: &Report, detail: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", report.source);

    if report.timeline.is_empty() {
        out.push_str("\nNo commits found.\n");
        return out;
    }

    if detail {
        out.push_str("\nTimeline:\n");
        for line in &report.timeline {
            let _ = writeln!(out, " {}", timeline_line(line));
        }
    } else {
        let warnings: Vec<_> = report
            .timeline
            .iter()
            .filter(|line| matches!(line.entry, TimelineEntry::Skipped { .. }))
            .collect();
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for line in warnings {
                let _ = writeln!(out, " {}", timeline_line(line));
            }
        }
    }

    match &report.summary {
        Some(summary) => out.push_str(&summary_block(summary)),
        None => out.push_str("\nNo commits could be analysed.\n"),
    }
    out
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn timeline_line(line: &TimelineLine) -> String {
    match &line.entry {
        TimelineEntry::Commit(tally) => {
            let mut text = format!(
                "{} {}",
                tally.timestamp.format(TIMESTAMP_FORMAT),
                tally.short_id
            );
            if let Some(pace) = &line.pace {
                text.push_str(&pace_fields(pace));
            }
            let _ = write!(
                text,
                " +{:<4} -{:<4} ({:+}) [{}] {}",
                tally.added,
                tally.deleted,
                tally.net(),
                files_label(tally.files_changed),
                tally.message
            );
            text
        }
        TimelineEntry::Skipped {
            short_id, reason, ..
        } => format!("WARNING: skipped commit {short_id}: {reason}"),
    }
}

fn files_label(files: u32) -> String {
    match files {
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    }
}

fn pace_fields(pace: &CommitPace) -> String {
    let mut text = String::new();
    if pace.velocity > 0.0 {
        let _ = write!(text, " {:.1} l/min", pace.velocity);
    }
    if let Some(flag) = pace.gap_flag {
        let _ = write!(text, " {}", flag.marker());
    }
    text
}

/// The fixed-label summary block; identical for identical repository state.
pub fn summary_block(summary: &RunSummary) -> String {
    let mut out = String::from("\nSummary:\n");
    let mut field = |label: &str, value: String| {
        let _ = writeln!(out, " {:<34} {}", label, value);
    };

    field("Total commits:", summary.total_commits.to_string());
    if summary.skipped_commits > 0 {
        field("Skipped commits:", summary.skipped_commits.to_string());
    }
    field(
        "Timespan (days):",
        format!("{} ({} active)", summary.timespan_days, summary.active_days),
    );
    field("Total lines in HEAD:", summary.total_lines.to_string());
    field("Total files in HEAD:", summary.total_files.to_string());
    if summary.excluded_blobs > 0 {
        field(
            "Files excluded from line count:",
            summary.excluded_blobs.to_string(),
        );
    }
    field(
        "Estimated never-edited lines:",
        format!("{} (rough estimate)", summary.unedited_lines_estimate),
    );
    field(
        "Mean lines per minute:",
        format!(
            "{:.2} (std: {:.2})",
            summary.mean_velocity, summary.stddev_velocity
        ),
    );
    field("Max lines per minute:", format!("{:.2}", summary.max_velocity));
    field(
        "Mean insertions per commit:",
        format!(
            "{:.2} (std: {:.2})",
            summary.mean_insertions, summary.stddev_insertions
        ),
    );
    if let Some(largest) = &summary.largest_commit {
        field(
            "Commit with most net insertions:",
            format!(
                "{} {} +{} (-{})",
                largest.timestamp.format(TIMESTAMP_FORMAT),
                largest.short_id,
                largest.added,
                largest.deleted
            ),
        );
    }
    out
}
