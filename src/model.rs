use chrono::{DateTime, FixedOffset};
use gix::ObjectId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SCHEMA_VERSION: u32 = 1;

/// Length of the abbreviated commit id shown in reports.
pub const SHORT_ID_LEN: usize = 8;

/// Velocities are only computed for gaps below this.
pub const DEFAULT_VELOCITY_CEILING: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: ObjectId,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub parent: Option<ObjectId>,
    pub tree: ObjectId,
}

impl CommitRecord {
    pub fn short_id(&self) -> String {
        crate::util::short_id(&self.id.to_string())
    }
}

/// One changed path between a parent tree and a commit tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub old_blob: Option<ObjectId>,
    pub new_blob: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Addition,
    Deletion,
    Modification,
}

impl ChangeRecord {
    pub fn kind(&self) -> ChangeKind {
        match (&self.old_path, &self.new_path) {
            (Some(_), Some(_)) => ChangeKind::Modification,
            (None, Some(_)) => ChangeKind::Addition,
            _ => ChangeKind::Deletion,
        }
    }

    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub added: u64,
    pub deleted: u64,
}

impl LineCounts {
    pub fn new(added: u64, deleted: u64) -> Self {
        Self { added, deleted }
    }

    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

impl std::ops::AddAssign for LineCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.deleted += rhs.deleted;
    }
}

/// Line counts for a whole commit, plus how many paths contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitDiff {
    pub counts: LineCounts,
    pub files_changed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffTally {
    pub commit_id: String,
    pub short_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub added: u64,
    pub deleted: u64,
    pub files_changed: u32,
}

impl DiffTally {
    pub fn from_commit(commit: &CommitRecord, diff: CommitDiff) -> Self {
        Self {
            commit_id: commit.id.to_string(),
            short_id: commit.short_id(),
            timestamp: commit.timestamp,
            message: crate::util::first_line(&commit.message).to_string(),
            added: diff.counts.added,
            deleted: diff.counts.deleted,
            files_changed: diff.files_changed,
        }
    }

    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Commit(DiffTally),
    Skipped {
        short_id: String,
        timestamp: DateTime<FixedOffset>,
        reason: String,
    },
}

impl TimelineEntry {
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        match self {
            TimelineEntry::Commit(tally) => tally.timestamp,
            TimelineEntry::Skipped { timestamp, .. } => *timestamp,
        }
    }

    pub fn tally(&self) -> Option<&DiffTally> {
        match self {
            TimelineEntry::Commit(tally) => Some(tally),
            TimelineEntry::Skipped { .. } => None,
        }
    }
}

/// Per-blob outcome of a line census.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobLines {
    Counted(u64),
    Binary,
    Unreadable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusOutcome {
    pub lines: u64,
    pub counted: u64,
    pub binary: u64,
    pub unreadable: u64,
}

impl CensusOutcome {
    pub fn record(&mut self, outcome: BlobLines) {
        match outcome {
            BlobLines::Counted(n) => {
                self.lines += n;
                self.counted += 1;
            }
            BlobLines::Binary => self.binary += 1,
            BlobLines::Unreadable => self.unreadable += 1,
        }
    }

    pub fn excluded(&self) -> u64 {
        self.binary + self.unreadable
    }
}

/// Derived per-commit figures used on the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitPace {
    /// Lines per minute; zero when the gap was out of range.
    pub velocity: f64,
    pub gap_minutes: Option<f64>,
    pub gap_flag: Option<GapFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFlag {
    Under10Minutes,
    Under5Minutes,
    Under2Minutes,
}

impl GapFlag {
    pub fn from_minutes(minutes: f64) -> Option<Self> {
        if minutes < 0.0 {
            None
        } else if minutes < 2.0 {
            Some(GapFlag::Under2Minutes)
        } else if minutes < 5.0 {
            Some(GapFlag::Under5Minutes)
        } else if minutes < 10.0 {
            Some(GapFlag::Under10Minutes)
        } else {
            None
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            GapFlag::Under10Minutes => "!",
            GapFlag::Under5Minutes => "!!",
            GapFlag::Under2Minutes => "!!!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargestCommit {
    pub short_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub added: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_commits: usize,
    pub skipped_commits: usize,
    pub timespan_days: i64,
    pub active_days: usize,
    pub total_lines: u64,
    pub total_files: u64,
    pub excluded_blobs: u64,
    pub unedited_lines_estimate: u64,
    pub mean_velocity: f64,
    pub stddev_velocity: f64,
    pub max_velocity: f64,
    pub mean_insertions: f64,
    pub stddev_insertions: f64,
    pub largest_commit: Option<LargestCommit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLine {
    pub entry: TimelineEntry,
    pub pace: Option<CommitPace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub source: String,
    pub timeline: Vec<TimelineLine>,
    pub summary: Option<RunSummary>,
}

/// Knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub extensions: Option<Vec<String>>,
    pub velocity_ceiling: Duration,
    pub detail: bool,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self {
            extensions: None,
            velocity_ceiling: DEFAULT_VELOCITY_CEILING,
            detail: true,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = if extensions.is_empty() {
            None
        } else {
            Some(extensions)
        };
        self
    }

    pub fn with_velocity_ceiling(mut self, ceiling: Duration) -> Self {
        self.velocity_ceiling = ceiling;
        self
    }

    pub fn with_detail(mut self, detail: bool) -> Self {
        self.detail = detail;
        self
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}
