use crate::model::{
    CensusOutcome, CommitPace, DiffTally, GapFlag, LargestCommit, RunSummary, TimelineEntry,
};
use std::collections::HashSet;
use std::time::Duration;

/// Velocity and gap flag of each analysed commit relative to the commit
/// immediately before it, whether or not that one could be diffed.
///
/// Velocity is insertions per minute, and only when the gap is strictly
/// positive and below `ceiling`; the first commit has no predecessor.
/// Skipped entries get no pace.
pub fn compute_pace(timeline: &[TimelineEntry], ceiling: Duration) -> Vec<Option<CommitPace>> {
    let ceiling_minutes = ceiling.as_secs_f64() / 60.0;
    let mut paces = Vec::with_capacity(timeline.len());

    for (i, entry) in timeline.iter().enumerate() {
        let Some(tally) = entry.tally() else {
            paces.push(None);
            continue;
        };
        let Some(previous) = i.checked_sub(1).map(|p| &timeline[p]) else {
            paces.push(Some(CommitPace::default()));
            continue;
        };

        let gap_minutes =
            (tally.timestamp - previous.timestamp()).num_seconds() as f64 / 60.0;
        let velocity = if gap_minutes > 0.0 && gap_minutes < ceiling_minutes {
            tally.added as f64 / gap_minutes
        } else {
            0.0
        };

        paces.push(Some(CommitPace {
            velocity,
            gap_minutes: Some(gap_minutes),
            gap_flag: GapFlag::from_minutes(gap_minutes),
        }));
    }
    paces
}

/// Fold the timeline and the HEAD census into summary statistics.
///
/// Timespan and active days cover every walked commit, skipped ones included;
/// the line statistics cover analysed commits only. Returns `None` when no
/// commit could be analysed.
pub fn summarize(
    timeline: &[TimelineEntry],
    census: &CensusOutcome,
    total_files: u64,
    ceiling: Duration,
) -> Option<RunSummary> {
    let tallies: Vec<&DiffTally> = timeline.iter().filter_map(TimelineEntry::tally).collect();
    if tallies.is_empty() {
        return None;
    }
    let first = timeline.first()?.timestamp();
    let last = timeline.last()?.timestamp();

    let timespan_days = (last - first).num_days().max(0);
    let active_days = timeline
        .iter()
        .map(|entry| entry.timestamp().date_naive())
        .collect::<HashSet<_>>()
        .len();

    let insertions: Vec<f64> = tallies.iter().map(|t| t.added as f64).collect();

    let ceiling_minutes = ceiling.as_secs_f64() / 60.0;
    let velocities: Vec<f64> = compute_pace(timeline, ceiling)
        .into_iter()
        .flatten()
        .filter(|p| {
            p.gap_minutes
                .is_some_and(|gap| gap > 0.0 && gap < ceiling_minutes)
        })
        .map(|p| p.velocity)
        .collect();
    let max_velocity = velocities.iter().copied().fold(0.0, f64::max);

    let net_total: i64 = tallies.iter().map(|t| t.net()).sum();
    let unedited_lines_estimate = (census.lines as i64 - net_total).max(0) as u64;

    Some(RunSummary {
        total_commits: tallies.len(),
        skipped_commits: timeline.len() - tallies.len(),
        timespan_days,
        active_days,
        total_lines: census.lines,
        total_files,
        excluded_blobs: census.excluded(),
        unedited_lines_estimate,
        mean_velocity: mean(&velocities),
        stddev_velocity: sample_stddev(&velocities),
        max_velocity,
        mean_insertions: mean(&insertions),
        stddev_insertions: sample_stddev(&insertions),
        largest_commit: largest_net_insertion(tallies.into_iter()),
    })
}

/// The tally with the greatest net insertion; the earliest wins ties.
pub fn largest_net_insertion<'a>(
    tallies: impl IntoIterator<Item = &'a DiffTally>,
) -> Option<LargestCommit> {
    let mut best: Option<&DiffTally> = None;
    for tally in tallies {
        if best.map_or(true, |b| tally.net() > b.net()) {
            best = Some(tally);
        }
    }
    best.map(|t| LargestCommit {
        short_id: t.short_id.clone(),
        timestamp: t.timestamp,
        added: t.added,
        deleted: t.deleted,
    })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; zero for fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    fn tally(id: &str, timestamp: DateTime<FixedOffset>, added: u64, deleted: u64) -> TimelineEntry {
        TimelineEntry::Commit(DiffTally {
            commit_id: id.repeat(5),
            short_id: id.to_string(),
            timestamp,
            message: format!("commit {id}"),
            added,
            deleted,
            files_changed: 1,
        })
    }

    fn skipped(id: &str, timestamp: DateTime<FixedOffset>) -> TimelineEntry {
        TimelineEntry::Skipped {
            short_id: id.to_string(),
            timestamp,
            reason: "tree not found".into(),
        }
    }

    fn paces(timeline: &[TimelineEntry]) -> Vec<CommitPace> {
        compute_pace(timeline, HOUR).into_iter().flatten().collect()
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn single_commit_has_zero_spread_and_span() {
        let timeline = vec![tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 12, 0)];
        let summary = summarize(&timeline, &CensusOutcome::default(), 1, HOUR).unwrap();
        assert_eq!(summary.total_commits, 1);
        assert_eq!(summary.timespan_days, 0);
        assert_eq!(summary.active_days, 1);
        assert_eq!(summary.stddev_insertions, 0.0);
        assert_eq!(summary.mean_insertions, 12.0);
        assert_eq!(summary.mean_velocity, 0.0);
        assert_eq!(summary.max_velocity, 0.0);
    }

    #[test]
    fn timespan_truncates_and_active_days_counts_dates() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 23, 0), 1, 0),
            tally("bbbbbbbb", at(2025, 1, 3, 0, 0), 1, 0),
        ];
        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.timespan_days, 1);
        assert_eq!(summary.active_days, 2);

        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 10, 0), 1, 0),
            tally("bbbbbbbb", at(2025, 1, 1, 12, 0), 1, 0),
            tally("cccccccc", at(2025, 1, 1, 14, 0), 1, 0),
        ];
        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.timespan_days, 0);
        assert_eq!(summary.active_days, 1);
    }

    #[test]
    fn velocity_only_inside_the_ceiling() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 10, 0),
            tally("bbbbbbbb", at(2025, 1, 1, 10, 30), 90, 0),
            tally("cccccccc", at(2025, 1, 1, 10, 50), 40, 0),
        ];
        let paces = paces(&timeline);
        assert_eq!(paces[0].velocity, 0.0);
        assert_eq!(paces[0].gap_minutes, None);
        assert_eq!(paces[1].velocity, 0.0);
        assert_eq!(paces[1].gap_minutes, Some(90.0));
        assert_eq!(paces[2].velocity, 2.0);

        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.mean_velocity, 2.0);
        assert_eq!(summary.max_velocity, 2.0);
        assert_eq!(summary.stddev_velocity, 0.0);
    }

    #[test]
    fn zero_and_negative_gaps_have_no_velocity() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 10, 0),
            tally("bbbbbbbb", at(2025, 1, 1, 9, 0), 10, 0),
            tally("cccccccc", at(2025, 1, 1, 8, 0), 10, 0),
        ];
        let paces = paces(&timeline);
        assert_eq!(paces[1].velocity, 0.0);
        assert_eq!(paces[1].gap_flag, Some(GapFlag::Under2Minutes));
        assert_eq!(paces[2].velocity, 0.0);
        assert_eq!(paces[2].gap_flag, None);

        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.timespan_days, 0);
    }

    #[test]
    fn gap_flags_escalate() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 1, 0),
            tally("bbbbbbbb", at(2025, 1, 1, 9, 8), 1, 0),
            tally("cccccccc", at(2025, 1, 1, 9, 12), 1, 0),
            tally("dddddddd", at(2025, 1, 1, 9, 13), 1, 0),
            tally("eeeeeeee", at(2025, 1, 1, 9, 40), 1, 0),
        ];
        let flags: Vec<_> = paces(&timeline).into_iter().map(|p| p.gap_flag).collect();
        assert_eq!(
            flags,
            vec![
                None,
                Some(GapFlag::Under10Minutes),
                Some(GapFlag::Under5Minutes),
                Some(GapFlag::Under2Minutes),
                None,
            ]
        );
    }

    #[test]
    fn gap_is_measured_from_a_skipped_predecessor() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 5, 0),
            skipped("bbbbbbbb", at(2025, 1, 1, 9, 40)),
            tally("cccccccc", at(2025, 1, 1, 10, 20), 10, 0),
        ];
        let paces = compute_pace(&timeline, HOUR);
        assert_eq!(paces[1], None);
        let last = paces[2].unwrap();
        assert_eq!(last.gap_minutes, Some(40.0));
        assert_eq!(last.velocity, 0.25);

        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.total_commits, 2);
        assert_eq!(summary.skipped_commits, 1);
        assert_eq!(summary.max_velocity, 0.25);
    }

    #[test]
    fn skipped_commits_still_count_towards_the_timespan() {
        let timeline = vec![
            skipped("aaaaaaaa", at(2025, 1, 1, 9, 0)),
            tally("bbbbbbbb", at(2025, 1, 2, 9, 0), 3, 0),
            skipped("cccccccc", at(2025, 1, 4, 9, 0)),
        ];
        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.timespan_days, 3);
        assert_eq!(summary.active_days, 3);
        assert_eq!(summary.skipped_commits, 2);
    }

    #[test]
    fn insertion_stddev_is_sample_stddev() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 2, 0),
            tally("bbbbbbbb", at(2025, 1, 2, 9, 0), 4, 0),
            tally("cccccccc", at(2025, 1, 3, 9, 0), 6, 0),
        ];
        let summary = summarize(&timeline, &CensusOutcome::default(), 0, HOUR).unwrap();
        assert_eq!(summary.mean_insertions, 4.0);
        assert!((summary.stddev_insertions - 2.0).abs() < 1e-9);
    }

    #[test]
    fn largest_net_prefers_first_on_ties() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 10, 5),
            tally("bbbbbbbb", at(2025, 1, 2, 9, 0), 7, 0),
            tally("cccccccc", at(2025, 1, 3, 9, 0), 20, 13),
            tally("dddddddd", at(2025, 1, 4, 9, 0), 0, 40),
        ];
        let largest =
            largest_net_insertion(timeline.iter().filter_map(TimelineEntry::tally)).unwrap();
        assert_eq!(largest.short_id, "bbbbbbbb");
        assert_eq!(largest.added, 7);
    }

    #[test]
    fn unedited_estimate_clamps_at_zero() {
        let timeline = vec![
            tally("aaaaaaaa", at(2025, 1, 1, 9, 0), 50, 0),
            tally("bbbbbbbb", at(2025, 1, 2, 9, 0), 10, 20),
            skipped("cccccccc", at(2025, 1, 2, 10, 0)),
        ];
        let census = CensusOutcome {
            lines: 100,
            counted: 3,
            binary: 1,
            unreadable: 0,
        };
        let summary = summarize(&timeline, &census, 4, HOUR).unwrap();
        assert_eq!(summary.unedited_lines_estimate, 60);
        assert_eq!(summary.excluded_blobs, 1);
        assert_eq!(summary.skipped_commits, 1);

        let census = CensusOutcome {
            lines: 10,
            ..CensusOutcome::default()
        };
        let summary = summarize(&timeline, &census, 4, HOUR).unwrap();
        assert_eq!(summary.unedited_lines_estimate, 0);
    }

    #[test]
    fn nothing_to_summarise() {
        assert!(summarize(&[], &CensusOutcome::default(), 0, HOUR).is_none());
        let all_skipped = vec![skipped("aaaaaaaa", at(2025, 1, 1, 9, 0))];
        assert!(summarize(&all_skipped, &CensusOutcome::default(), 0, HOUR).is_none());
    }
}
