use super::GitRepo;
use crate::error::{GitsumError, Result};
use crate::model::{ChangeKind, ChangeRecord, CommitDiff, CommitRecord, LineCounts};
use crate::util::{count_newlines, is_binary, matches_extension};
use gix::object::tree::diff::ChangeDetached;
use gix::ObjectId;
use similar::TextDiff;

/// Produces the line tally of one commit against its first parent.
pub trait CommitDiffer {
    fn diff_commit(&self, commit: &CommitRecord, extensions: Option<&[String]>) -> Result<CommitDiff>;
}

impl CommitDiffer for GitRepo {
    fn diff_commit(&self, commit: &CommitRecord, extensions: Option<&[String]>) -> Result<CommitDiff> {
        let parent_tree = match commit.parent {
            Some(parent_id) => Some(
                self.read_commit(parent_id)
                    .map_err(|e| GitsumError::diff(commit.short_id(), e))?
                    .tree,
            ),
            None => None,
        };
        self.diff_trees(parent_tree, commit.tree, extensions)
            .map_err(|e| match e {
                GitsumError::Diff { .. } => e,
                other => GitsumError::diff(commit.short_id(), other),
            })
    }
}

impl GitRepo {
    /// Insertions and deletions going from `parent_tree` (empty when `None`) to `tree`.
    pub fn diff_trees(
        &self,
        parent_tree: Option<ObjectId>,
        tree: ObjectId,
        extensions: Option<&[String]>,
    ) -> Result<CommitDiff> {
        let mut diff = CommitDiff::default();
        for change in self.changes_between(parent_tree, tree)? {
            if !matches_extension(change.path(), extensions) {
                continue;
            }
            diff.counts += self.change_counts(&change);
            diff.files_changed += 1;
        }
        Ok(diff)
    }

    pub fn changes_between(
        &self,
        parent_tree: Option<ObjectId>,
        tree: ObjectId,
    ) -> Result<Vec<ChangeRecord>> {
        let repo = self.inner();
        let commit_tree = repo.find_tree(tree)?;
        let parent_tree = parent_tree.map(|id| repo.find_tree(id)).transpose()?;

        let changes: Vec<ChangeDetached> =
            repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)?;

        Ok(changes.into_iter().filter_map(to_change_record).collect())
    }

    fn change_counts(&self, change: &ChangeRecord) -> LineCounts {
        match change.kind() {
            ChangeKind::Addition => LineCounts::new(self.blob_newlines(change.new_blob), 0),
            ChangeKind::Deletion => LineCounts::new(0, self.blob_newlines(change.old_blob)),
            ChangeKind::Modification => {
                let (Some(old), Some(new)) = (
                    self.blob_data(change.old_blob),
                    self.blob_data(change.new_blob),
                ) else {
                    return LineCounts::default();
                };
                if is_binary(&old) || is_binary(&new) {
                    return LineCounts::default();
                }
                let patch = unified_diff(
                    &String::from_utf8_lossy(&old),
                    &String::from_utf8_lossy(&new),
                    change.old_path.as_deref().unwrap_or_default(),
                    change.new_path.as_deref().unwrap_or_default(),
                );
                count_patch_lines(&patch)
            }
        }
    }

    fn blob_newlines(&self, id: Option<ObjectId>) -> u64 {
        self.blob_data(id).map_or(0, |data| count_newlines(&data))
    }

    fn blob_data(&self, id: Option<ObjectId>) -> Option<Vec<u8>> {
        let object = self.inner().find_object(id?).ok()?;
        Some(object.detach().data)
    }
}

fn to_change_record(change: ChangeDetached) -> Option<ChangeRecord> {
    match change {
        ChangeDetached::Addition {
            location,
            entry_mode,
            id,
            ..
        } => entry_mode.is_blob().then(|| ChangeRecord {
            old_path: None,
            new_path: Some(location.to_string()),
            old_blob: None,
            new_blob: Some(id),
        }),
        ChangeDetached::Deletion {
            location,
            entry_mode,
            id,
            ..
        } => entry_mode.is_blob().then(|| ChangeRecord {
            old_path: Some(location.to_string()),
            new_path: None,
            old_blob: Some(id),
            new_blob: None,
        }),
        ChangeDetached::Modification {
            location,
            previous_entry_mode,
            previous_id,
            entry_mode,
            id,
            ..
        } => match (previous_entry_mode.is_blob(), entry_mode.is_blob()) {
            (true, true) => Some(ChangeRecord {
                old_path: Some(location.to_string()),
                new_path: Some(location.to_string()),
                old_blob: Some(previous_id),
                new_blob: Some(id),
            }),
            // A path that turned into or out of a regular file counts as one side only.
            (false, true) => Some(ChangeRecord {
                old_path: None,
                new_path: Some(location.to_string()),
                old_blob: None,
                new_blob: Some(id),
            }),
            (true, false) => Some(ChangeRecord {
                old_path: Some(location.to_string()),
                new_path: None,
                old_blob: Some(previous_id),
                new_blob: None,
            }),
            (false, false) => None,
        },
        ChangeDetached::Rewrite {
            source_location,
            source_id,
            location,
            entry_mode,
            id,
            copy,
            ..
        } => entry_mode.is_blob().then(|| {
            if copy {
                ChangeRecord {
                    old_path: None,
                    new_path: Some(location.to_string()),
                    old_blob: None,
                    new_blob: Some(id),
                }
            } else {
                ChangeRecord {
                    old_path: Some(source_location.to_string()),
                    new_path: Some(location.to_string()),
                    old_blob: Some(source_id),
                    new_blob: Some(id),
                }
            }
        }),
    }
}

/// Render a unified diff between two versions of a file.
pub fn unified_diff(old: &str, new: &str, old_path: &str, new_path: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{old_path}"), &format!("b/{new_path}"))
        .to_string()
}

/// Count insertion and deletion lines of a single-file unified diff.
///
/// The `---`/`+++` file header precedes the first `@@` hunk header and is not
/// counted, so content lines that themselves start with `--` or `++` are.
pub fn count_patch_lines(patch: &str) -> LineCounts {
    let mut counts = LineCounts::default();
    let mut in_hunks = false;

    for line in patch.lines() {
        if !in_hunks {
            in_hunks = line.starts_with("@@");
            continue;
        }
        match line.as_bytes().first() {
            Some(b'+') => counts.added += 1,
            Some(b'-') => counts.deleted += 1,
            _ => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fixtures;

    #[test]
    fn counts_marked_lines_after_headers() {
        let patch = "\
--- a/main.py
+++ b/main.py
@@ -1,3 +1,4 @@
 import os
-print('hi')
+print('hello')
+print('world')
 done
";
        assert_eq!(count_patch_lines(patch), LineCounts::new(2, 1));
    }

    #[test]
    fn content_lines_resembling_headers_are_counted() {
        let old = "a\n-- sql comment\n";
        let new = "a\n++ counter\n";
        let patch = unified_diff(old, new, "q.sql", "q.sql");
        assert_eq!(count_patch_lines(&patch), LineCounts::new(1, 1));
    }

    #[test]
    fn rendered_diff_has_expected_headers() {
        let patch = unified_diff("x\n", "y\n", "old.txt", "new.txt");
        let mut lines = patch.lines();
        assert_eq!(lines.next(), Some("--- a/old.txt"));
        assert_eq!(lines.next(), Some("+++ b/new.txt"));
    }

    #[test]
    fn identical_content_counts_nothing() {
        let patch = unified_diff("same\n", "same\n", "f", "f");
        assert_eq!(count_patch_lines(&patch), LineCounts::default());
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let patch = unified_diff("a\nb", "a\nc", "f", "f");
        assert_eq!(count_patch_lines(&patch), LineCounts::new(1, 1));
    }

    #[test]
    fn multi_hunk_diff() {
        let old: String = (0..40).map(|i| format!("line {i}\n")).collect();
        let new = old
            .replace("line 2\n", "line two\n")
            .replace("line 35\n", "");
        let patch = unified_diff(&old, &new, "f", "f");
        assert_eq!(patch.lines().filter(|l| l.starts_with("@@")).count(), 2);
        assert_eq!(count_patch_lines(&patch), LineCounts::new(1, 2));
    }

    #[test]
    fn binary_addition_counts_newlines_and_modification_counts_nothing() {
        let (_dir, repo) = fixtures::scratch_repo();
        let v1 = fixtures::blob(&repo, b"\0\x01\n\x02\n");
        let v2 = fixtures::blob(&repo, b"\0\x01\n\x02\n\x03\n");
        let added = fixtures::tree(&repo, &[("data.bin", v1)]);
        let modified = fixtures::tree(&repo, &[("data.bin", v2)]);

        let diff = repo.diff_trees(None, added, None).unwrap();
        assert_eq!(diff.counts, LineCounts::new(2, 0));
        assert_eq!(diff.files_changed, 1);

        let diff = repo.diff_trees(Some(added), modified, None).unwrap();
        assert_eq!(diff.counts, LineCounts::default());
        assert_eq!(diff.files_changed, 1);
    }

    #[test]
    fn unreadable_blob_contributes_nothing() {
        let (_dir, repo) = fixtures::scratch_repo();
        let old = fixtures::blob(&repo, b"one\ntwo\n");
        let extra = fixtures::blob(&repo, b"x\ny\n");
        let before = fixtures::tree(&repo, &[("a.txt", old)]);
        let after = fixtures::tree(
            &repo,
            &[("a.txt", fixtures::missing_blob()), ("b.txt", extra)],
        );

        let diff = repo.diff_trees(Some(before), after, None).unwrap();
        assert_eq!(diff.counts, LineCounts::new(2, 0));
        assert_eq!(diff.files_changed, 2);
    }

    #[test]
    fn deletion_counts_old_newlines_and_filters_on_old_path() {
        let (_dir, repo) = fixtures::scratch_repo();
        let py = fixtures::blob(&repo, b"a\nb\nc\n");
        let before = fixtures::tree(&repo, &[("gone.py", py)]);
        let after = fixtures::tree(&repo, &[]);

        let diff = repo.diff_trees(Some(before), after, None).unwrap();
        assert_eq!(diff.counts, LineCounts::new(0, 3));

        let exts = vec!["rs".to_string()];
        let diff = repo.diff_trees(Some(before), after, Some(&exts)).unwrap();
        assert_eq!(diff, CommitDiff::default());
    }
}
