use crate::cli::RerunArgs;
use crate::error::Result;
use crate::git::GitRepo;
use crate::model::AnalysisOptions;
use crate::summary::{analyze, render_text};
use crate::util::sorted_subdirs;
use anyhow::Context;
use console::style;
use std::path::Path;
use tracing::warn;

pub fn exec(args: RerunArgs) -> anyhow::Result<()> {
    let options = args.analysis.analysis_options()?;
    let written = rerun_course(&args.course_dir, &args.report_file, &options)
        .with_context(|| format!("Failed to rerun {}", args.course_dir.display()))?;
    println!("\n{} reports regenerated", style(written).cyan());
    Ok(())
}

/// Regenerate the report of every `<student>/<repository>` clone under `course_dir`.
///
/// Each student directory gets the report of its last (sorted) repository.
/// Repositories that fail to open or analyse are logged and skipped.
pub fn rerun_course(course_dir: &Path, report_file: &str, options: &AnalysisOptions) -> Result<usize> {
    let mut written = 0;
    for student_dir in sorted_subdirs(course_dir)? {
        for repo_dir in sorted_subdirs(&student_dir)? {
            println!("processing {}...", repo_dir.display());
            let source = repo_dir.to_string_lossy().to_string();
            let report = GitRepo::open(&repo_dir, &source)
                .and_then(|repo| analyze(&repo, options, false));
            match report {
                Ok(report) => {
                    std::fs::write(
                        student_dir.join(report_file),
                        render_text(&report, options.detail),
                    )?;
                    written += 1;
                }
                Err(e) => warn!("Skipping {}: {}", repo_dir.display(), e),
            }
        }
    }
    Ok(written)
}
