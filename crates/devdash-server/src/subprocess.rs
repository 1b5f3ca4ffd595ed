use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use devdash_core::config::BuildConfig;
use devdash_core::types::BuildReport;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no command configured")]
    Empty,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
}

/// Captured output of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run `argv` in `cwd` to completion and capture both streams. The child is
/// killed if `timeout` expires first.
pub async fn run_captured(
    argv: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput, RunError> {
    let (program, args) = argv.split_first().ok_or(RunError::Empty)?;

    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| RunError::TimedOut(timeout))?
        .map_err(RunError::Wait)?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run the configured build in `root`. Anything written to stderr counts as
/// a failure, whatever the exit status.
pub async fn verify_build(build: &BuildConfig, root: &Path) -> BuildReport {
    tracing::info!(command = %build.command.join(" "), "running build");

    let out = match run_captured(&build.command, root, build.timeout()).await {
        Ok(out) => out,
        Err(e) => {
            tracing::error!(error = %e, "build could not run");
            return BuildReport {
                success: false,
                message: format!("Failed to run build process: {e}"),
                ..Default::default()
            };
        }
    };

    let message = if !out.stderr.is_empty() {
        "Build failed with errors".to_string()
    } else if out.exit_code != Some(0) {
        match out.exit_code {
            Some(code) => format!("Build exited with status {code}"),
            None => "Build was terminated by a signal".to_string(),
        }
    } else {
        tracing::info!("build succeeded");
        return BuildReport {
            success: true,
            message: "Build completed successfully".into(),
            stdout: out.stdout,
            stderr: out.stderr,
        };
    };

    tracing::warn!(exit_code = ?out.exit_code, "{message}");
    BuildReport {
        success: false,
        message,
        stdout: out.stdout,
        stderr: out.stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> BuildConfig {
        BuildConfig {
            command: vec!["sh".into(), "-c".into(), script.into()],
            timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = run_captured(
            &["echo".into(), "hello".into()],
            Path::new("/tmp"),
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.stderr.is_empty());
    }

    #[tokio::test]
    async fn empty_argv_is_rejected() {
        let err = run_captured(&[], Path::new("/tmp"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Empty));
    }

    #[tokio::test]
    async fn clean_build_succeeds() {
        let report = verify_build(&sh("echo built"), Path::new("/tmp")).await;
        assert!(report.success);
        assert_eq!(report.stdout.trim(), "built");
    }

    #[tokio::test]
    async fn stderr_fails_even_with_zero_exit() {
        let report = verify_build(&sh("echo warning >&2; exit 0"), Path::new("/tmp")).await;
        assert!(!report.success);
        assert_eq!(report.message, "Build failed with errors");
        assert_eq!(report.stderr.trim(), "warning");
    }

    #[tokio::test]
    async fn nonzero_exit_fails() {
        let report = verify_build(&sh("exit 3"), Path::new("/tmp")).await;
        assert!(!report.success);
        assert_eq!(report.message, "Build exited with status 3");
    }

    #[tokio::test]
    async fn missing_program_fails_with_cause() {
        let build = BuildConfig {
            command: vec!["devdash-no-such-program".into()],
            timeout_secs: 10,
        };
        let report = verify_build(&build, Path::new("/tmp")).await;
        assert!(!report.success);
        assert!(report.message.starts_with("Failed to run build process"));
        assert!(report.message.contains("devdash-no-such-program"));
    }

    #[tokio::test]
    async fn slow_build_times_out() {
        let build = BuildConfig {
            command: vec!["sleep".into(), "5".into()],
            timeout_secs: 1,
        };
        let report = verify_build(&build, Path::new("/tmp")).await;
        assert!(!report.success);
        assert!(report.message.contains("timed out after 1s"));
    }
}
