pub mod aggregate;
pub mod exec;
pub mod output;

pub use aggregate::{compute_pace, summarize};
pub use exec::{analyze, collect_timeline, exec};
pub use output::{render_json, render_text, summary_block};
