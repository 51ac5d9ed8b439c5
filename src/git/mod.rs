pub mod census;
pub mod diff;
pub mod repo;
pub mod walk;

pub use diff::{count_patch_lines, unified_diff, CommitDiffer};
pub use repo::{repo_name_from_url, GitRepo, RepoSource};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::GitRepo;
    use gix::objs::tree::{Entry, EntryKind};
    use gix::ObjectId;
    use tempfile::TempDir;

    /// A fresh repository to write objects into directly.
    pub fn scratch_repo() -> (TempDir, GitRepo) {
        let dir = tempfile::tempdir().unwrap();
        gix::init(dir.path()).unwrap();
        let repo = GitRepo::open(dir.path(), "scratch").unwrap();
        (dir, repo)
    }

    pub fn blob(repo: &GitRepo, data: &[u8]) -> ObjectId {
        repo.inner().write_blob(data).unwrap().detach()
    }

    /// An id that no object in the repository has.
    pub fn missing_blob() -> ObjectId {
        ObjectId::from_bytes_or_panic(&[7; 20])
    }

    /// A flat tree of regular files.
    pub fn tree(repo: &GitRepo, files: &[(&str, ObjectId)]) -> ObjectId {
        let mut entries: Vec<Entry> = files
            .iter()
            .map(|(name, oid)| Entry {
                mode: EntryKind::Blob.into(),
                filename: (*name).into(),
                oid: *oid,
            })
            .collect();
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        let tree = gix::objs::Tree { entries };
        repo.inner().write_object(&tree).unwrap().detach()
    }
}
