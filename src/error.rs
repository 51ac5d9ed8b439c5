use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitsumError>;

#[derive(Error, Debug)]
pub enum GitsumError {
    #[error("Could not access repository '{source_ref}': {reason}")]
    Access { source_ref: String, reason: String },
    #[error("No HEAD found in repository: {0}")]
    NoHead(String),
    #[error("Diff failed for commit {commit}: {reason}")]
    Diff { commit: String, reason: String },
    #[error("Invalid timestamp: {0}")]
    InvalidDate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Roster error: {0}")]
    Roster(String),
    #[error("Script error: {0}")]
    Script(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Tree traversal error: {0}")]
    TreeTraverse(#[from] Box<gix::traverse::tree::breadthfirst::Error>),
}

impl GitsumError {
    pub fn access(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        GitsumError::Access {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    pub fn diff(commit: impl Into<String>, reason: impl ToString) -> Self {
        GitsumError::Diff {
            commit: commit.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error stops analysis of the whole repository.
    pub fn is_fatal_for_repo(&self) -> bool {
        matches!(self, GitsumError::Access { .. } | GitsumError::NoHead(_))
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for GitsumError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        GitsumError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for GitsumError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        GitsumError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for GitsumError {
    fn from(err: gix::object::commit::Error) -> Self {
        GitsumError::Commit(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for GitsumError {
    fn from(err: gix::objs::decode::Error) -> Self {
        GitsumError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for GitsumError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        GitsumError::RefFind(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for GitsumError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        GitsumError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::traverse::tree::breadthfirst::Error> for GitsumError {
    fn from(err: gix::traverse::tree::breadthfirst::Error) -> Self {
        GitsumError::TreeTraverse(Box::new(err))
    }
}
