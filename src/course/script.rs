use crate::error::{GitsumError, Result};
use crate::util::sorted_subdirs;
use regex::bytes::Regex;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Rewrites that let submitted scripts run unattended from their clone root.
///
/// Works on raw bytes so scripts saved in a legacy encoding are rewritten too.
pub struct ScriptRewriter {
    data_path: Regex,
    show_call: Regex,
}

impl ScriptRewriter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            data_path: Regex::new(r"\.\./(?:\.\./)?data")?,
            // Statement-level show() calls only; `pass` keeps emptied blocks valid.
            show_call: Regex::new(r"(?m)^([ \t]*)((?:[A-Za-z_][A-Za-z0-9_]*\.)?show\(\))")?,
        })
    }

    /// Point `../data` and `../../data` at `data`, and disable blocking `show()` calls.
    pub fn rewrite(&self, text: &[u8]) -> Vec<u8> {
        let text = self.data_path.replace_all(text, &b"data"[..]);
        self.show_call
            .replace_all(&text, &b"${1}pass  # ${2}"[..])
            .into_owned()
    }

    pub fn rewrite_file(&self, path: &Path) -> Result<bool> {
        let original = std::fs::read(path)?;
        let rewritten = self.rewrite(&original);
        if rewritten == original {
            return Ok(false);
        }
        std::fs::write(path, rewritten)?;
        Ok(true)
    }
}

/// The script inside the first (sorted) non-hidden subdirectory of `student_dir`.
pub fn locate_script(student_dir: &Path, script_name: &str) -> Option<PathBuf> {
    let dirs = sorted_subdirs(student_dir).ok()?;
    let script = dirs.first()?.join(script_name);
    script.is_file().then_some(script)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOutcome {
    Success,
    Failed,
    TimedOut,
    SpawnFailed,
}

impl ScriptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptOutcome::Success => "success",
            ScriptOutcome::Failed => "failed",
            ScriptOutcome::TimedOut => "timeout",
            ScriptOutcome::SpawnFailed => "spawn_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRun {
    pub elapsed: Duration,
    pub outcome: ScriptOutcome,
    pub exit_code: Option<i32>,
}

/// Run `<interpreter> <script>` in the script's directory with stdout and
/// stderr captured into `output_path`, killing it once `timeout` elapses.
pub fn run_script(
    interpreter: &str,
    script: &Path,
    output_path: &Path,
    timeout: Duration,
) -> Result<ScriptRun> {
    let (Some(dir), Some(name)) = (script.parent(), script.file_name()) else {
        return Err(GitsumError::Script(format!(
            "Not a script path: {}",
            script.display()
        )));
    };

    let output = File::create(output_path)?;
    let stderr = output.try_clone()?;

    let start = Instant::now();
    let mut child = match Command::new(interpreter)
        .arg(name)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(output)
        .stderr(stderr)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Could not start {interpreter} for {}: {e}", script.display());
            return Ok(ScriptRun {
                elapsed: start.elapsed(),
                outcome: ScriptOutcome::SpawnFailed,
                exit_code: None,
            });
        }
    };

    loop {
        if let Some(status) = child.try_wait()? {
            let elapsed = start.elapsed();
            debug!("{} exited with {status} after {elapsed:?}", script.display());
            return Ok(ScriptRun {
                elapsed,
                outcome: if status.success() {
                    ScriptOutcome::Success
                } else {
                    ScriptOutcome::Failed
                },
                exit_code: status.code(),
            });
        }
        if start.elapsed() >= timeout {
            warn!("{} exceeded {:?}, killing it", script.display(), timeout);
            // The child may exit between the poll and the kill.
            let _ = child.kill();
            child.wait()?;
            return Ok(ScriptRun {
                elapsed: start.elapsed(),
                outcome: ScriptOutcome::TimedOut,
                exit_code: None,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
