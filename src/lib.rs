pub mod cli;
pub mod course;
pub mod error;
pub mod git;
pub mod model;
pub mod summary;
pub mod util;
