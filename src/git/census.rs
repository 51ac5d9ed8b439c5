use super::GitRepo;
use crate::error::Result;
use crate::model::{BlobLines, CensusOutcome};
use crate::util::{is_binary, matches_extension};
use gix::objs::tree::EntryKind;
use gix::ObjectId;
use tracing::warn;

const MODE_TYPE_MASK: u32 = 0o170000;
const MODE_REGULAR_FILE: u32 = 0o100000;

/// A file entry found while traversing a tree.
struct TreeEntry {
    path: String,
    kind: EntryKind,
    oid: ObjectId,
}

impl GitRepo {
    /// Lines in every regular file reachable from `tree_id`.
    ///
    /// Blobs that are binary or cannot be read are left out of the line total
    /// and only counted as exclusions.
    pub fn count_tracked_lines(
        &self,
        tree_id: ObjectId,
        extensions: Option<&[String]>,
    ) -> Result<CensusOutcome> {
        let mut census = CensusOutcome::default();
        for entry in self.tree_entries(tree_id)? {
            if !matches!(entry.kind, EntryKind::Blob | EntryKind::BlobExecutable) {
                continue;
            }
            if !matches_extension(&entry.path, extensions) {
                continue;
            }
            let outcome = self.blob_lines(entry.oid);
            if outcome == BlobLines::Unreadable {
                warn!("Skipping unreadable blob at {}", entry.path);
            }
            census.record(outcome);
        }
        Ok(census)
    }

    /// Regular files (not symlinks, submodules or directories) reachable from `tree_id`.
    pub fn count_files(&self, tree_id: ObjectId) -> Result<u64> {
        let count = self
            .tree_entries(tree_id)?
            .iter()
            .filter(|entry| is_regular_file(mode_bits(entry.kind)))
            .count();
        Ok(count as u64)
    }

    fn blob_lines(&self, oid: ObjectId) -> BlobLines {
        let Ok(object) = self.inner().find_object(oid) else {
            return BlobLines::Unreadable;
        };
        let data = object.data.as_slice();
        if is_binary(data) {
            return BlobLines::Binary;
        }
        BlobLines::Counted(String::from_utf8_lossy(data).lines().count() as u64)
    }

    fn tree_entries(&self, tree_id: ObjectId) -> Result<Vec<TreeEntry>> {
        let tree = self.inner().find_tree(tree_id)?;
        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse().breadthfirst(&mut recorder)?;

        Ok(recorder
            .records
            .into_iter()
            .map(|entry| TreeEntry {
                path: entry.filepath.to_string(),
                kind: entry.mode.kind(),
                oid: entry.oid,
            })
            .collect())
    }
}

fn mode_bits(kind: EntryKind) -> u32 {
    kind as u32
}

fn is_regular_file(mode: u32) -> bool {
    mode & MODE_TYPE_MASK == MODE_REGULAR_FILE
}
