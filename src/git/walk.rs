use super::GitRepo;
use crate::error::{GitsumError, Result};
use crate::model::CommitRecord;
use chrono::{DateTime, FixedOffset};
use gix::ObjectId;
use std::collections::HashSet;
use tracing::debug;

impl GitRepo {
    /// Commits on the first-parent chain from HEAD, oldest first.
    ///
    /// An unborn HEAD yields an empty history; a HEAD that cannot be read is `NoHead`.
    pub fn walk_from_head(&self) -> Result<Vec<CommitRecord>> {
        let Some(head_id) = self.head_id()? else {
            return Ok(Vec::new());
        };

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut next = Some(head_id);

        while let Some(commit_id) = next {
            if !seen.insert(commit_id) {
                break;
            }
            let record = self.read_commit(commit_id)?;
            debug!("Walked {} ({})", record.short_id(), record.timestamp);
            next = record.parent;
            commits.push(record);
        }

        commits.reverse();
        Ok(commits)
    }

    fn head_id(&self) -> Result<Option<ObjectId>> {
        let mut head = self
            .inner()
            .head()
            .map_err(|e| GitsumError::NoHead(e.to_string()))?;
        if head.is_unborn() {
            return Ok(None);
        }
        let commit = head
            .peel_to_commit_in_place()
            .map_err(|e| GitsumError::NoHead(e.to_string()))?;
        Ok(Some(commit.id))
    }

    pub fn read_commit(&self, commit_id: ObjectId) -> Result<CommitRecord> {
        let commit = self.inner().find_commit(commit_id)?;
        let time = commit.time()?;
        let timestamp = to_datetime(time.seconds, time.offset)?;
        let message = commit.message()?.title.to_string();
        let parent = commit.parent_ids().next().map(|id| id.detach());
        let tree = commit.tree_id()?.detach();

        Ok(CommitRecord {
            id: commit_id,
            timestamp,
            message,
            parent,
            tree,
        })
    }
}

fn to_datetime(seconds: i64, offset: i32) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset)
        .ok_or_else(|| GitsumError::InvalidDate(format!("Invalid offset: {offset}")))?;
    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| GitsumError::InvalidDate(format!("Invalid timestamp: {seconds}")))
}
