pub mod config;
pub mod exec;
pub mod rerun;
pub mod roster;
pub mod script;

pub use config::CourseConfig;
pub use exec::{exec, run_course, write_timings, CourseOutcome, TimingRow};
pub use roster::{load_roster, read_roster, RosterEntry};
pub use script::{locate_script, run_script, ScriptOutcome, ScriptRewriter, ScriptRun};
