use crate::model::AnalysisOptions;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gitsum")]
#[command(about = "Summarise the commit history of git repositories, one or a whole course at a time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct AnalysisArgs {
    #[arg(long = "ext", help = "Only count files with this extension (repeatable)")]
    pub extensions: Vec<String>,

    #[arg(
        long,
        help = "Gaps at or above this carry no editing velocity (e.g. 60m, 2h)",
        default_value = "60m"
    )]
    pub velocity_ceiling: String,

    #[arg(long, help = "Only print the summary block")]
    pub summary_only: bool,
}

impl AnalysisArgs {
    pub fn analysis_options(&self) -> Result<AnalysisOptions> {
        let ceiling = humantime::parse_duration(&self.velocity_ceiling)
            .with_context(|| format!("Invalid velocity ceiling '{}'", self.velocity_ceiling))?;
        Ok(AnalysisOptions::new()
            .with_extensions(self.extensions.clone())
            .with_velocity_ceiling(ceiling)
            .with_detail(!self.summary_only))
    }
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    #[arg(help = "Local path or remote URL (https://, git://, ssh:// or user@host:path)")]
    pub source: String,

    #[arg(long, help = "Keep the clone of a remote repository in this directory")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Write the report to a file instead of stdout")]
    pub out: Option<PathBuf>,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[clap(flatten)]
    pub analysis: AnalysisArgs,
}

impl ReportArgs {
    pub fn analysis_options(&self) -> Result<AnalysisOptions> {
        self.analysis.analysis_options()
    }
}

#[derive(Args, Clone)]
pub struct CourseArgs {
    #[arg(long, help = "Course configuration file (TOML)")]
    pub config: PathBuf,

    #[arg(long, help = "Roster CSV, overriding the configuration")]
    pub roster: Option<PathBuf>,

    #[arg(long, help = "Course output directory, overriding the configuration")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Regenerate summaries that already exist")]
    pub recalc: bool,

    #[arg(long, help = "Run scripts even where an output file already exists")]
    pub run_all: bool,

    #[arg(long, help = "Script deadline, overriding the configuration (e.g. 5m)")]
    pub timeout: Option<String>,
}

#[derive(Args, Clone)]
pub struct RerunArgs {
    #[arg(help = "Course directory laid out as <student>/<repository>")]
    pub course_dir: PathBuf,

    #[arg(long, default_value = "git.txt", help = "Report file written in each student directory")]
    pub report_file: String,

    #[clap(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report on a single repository
    Report(ReportArgs),
    /// Clone, summarise and run the script of every repository on a course roster
    Course(CourseArgs),
    /// Regenerate reports for clones already present in a course directory
    Rerun(RerunArgs),
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Report(args) => crate::summary::exec(args),
            Commands::Course(args) => crate::course::exec(args),
            Commands::Rerun(args) => crate::course::rerun::exec(args),
        }
    }
}
