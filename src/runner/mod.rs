//! Terraform command runner
//!
//! Every `terraform` invocation of an export goes through [`TerraformRunner`],
//! one at a time, from the workspace directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{MigrationError, MigrationResult};
use crate::traits::{CommandExecutor, Output};

const ERROR_PREFIX: &str = "Error: ";

pub struct TerraformRunner {
    command: Arc<dyn CommandExecutor>,
    output: Arc<dyn Output>,
    binary: String,
    working_dir: PathBuf,
    env: Vec<(String, String)>,
}

impl TerraformRunner {
    pub fn new(
        command: Arc<dyn CommandExecutor>,
        output: Arc<dyn Output>,
        binary: &str,
        working_dir: &Path,
    ) -> Self {
        Self {
            command,
            output,
            binary: binary.to_string(),
            working_dir: working_dir.to_path_buf(),
            env: Vec::new(),
        }
    }

    /// Pass the AWS profile and region to every terraform process
    pub fn with_aws(mut self, profile: Option<&str>, region: Option<&str>) -> Self {
        if let Some(profile) = profile {
            self.env.push(("AWS_PROFILE".to_string(), profile.to_string()));
        }
        if let Some(region) = region {
            self.env.push(("AWS_REGION".to_string(), region.to_string()));
        }
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Fail unless `terraform version` runs
    pub fn check_installed(&self) -> MigrationResult<()> {
        match self
            .command
            .execute(&self.binary, &["version"], &self.working_dir, &self.env)
        {
            Ok(output) if output.status.success() => Ok(()),
            _ => Err(MigrationError::TerraformNotFound(self.binary.clone())),
        }
    }

    /// Run `terraform <command> <args...>`
    ///
    /// Every stdout and stderr line goes to `sink`, and to the terminal too
    /// when `echo` is set. Returns whether the command succeeded; with
    /// `throw_on_error` a failure is an error instead.
    pub fn run(
        &self,
        command: &str,
        throw_on_error: bool,
        echo: bool,
        sink: &mut dyn FnMut(&str),
        args: &[&str],
    ) -> MigrationResult<bool> {
        let arguments: Vec<&str> = std::iter::once(command).chain(args.iter().copied()).collect();

        let result = self
            .command
            .execute(&self.binary, &arguments, &self.working_dir, &self.env)
            .map_err(|e| MigrationError::TerraformFailed {
                command: command.to_string(),
                message: e.to_string(),
                exit_code: None,
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);
        let mut errors = Vec::new();

        for line in stdout.lines().chain(stderr.lines()) {
            if echo {
                self.output.dimmed(line);
            }
            if let Some(message) = line.trim_start().strip_prefix(ERROR_PREFIX) {
                errors.push(message.to_string());
            }
            sink(line);
        }

        if result.status.success() {
            return Ok(true);
        }

        if throw_on_error {
            let exit_code = result.status.code();
            return Err(MigrationError::TerraformFailed {
                command: command.to_string(),
                message: errors.into_iter().next().unwrap_or_else(|| {
                    format!(
                        "terraform exited with code {}",
                        exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
                    )
                }),
                exit_code,
            });
        }

        Ok(false)
    }
}

/// Messages of the `Error: ` lines in captured output
pub fn error_messages(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.trim_start().strip_prefix(ERROR_PREFIX))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::command::{MockCommandExecutor, MockCommandResult};
    use crate::traits::output::{MockOutput, OutputMessage};

    fn runner(executor: Arc<MockCommandExecutor>, output: Arc<MockOutput>) -> TerraformRunner {
        TerraformRunner::new(executor, output, "terraform", Path::new("/work"))
            .with_aws(Some("prod"), Some("eu-west-1"))
    }

    #[test]
    fn test_run_captures_lines_and_env() {
        let executor = Arc::new(MockCommandExecutor::with_outputs(vec![MockCommandResult::success(
            "terraform init",
            "Initializing...\nTerraform has been successfully initialized!",
        )]));
        let output = Arc::new(MockOutput::new());
        let mut lines = Vec::new();

        let ok = runner(executor.clone(), output.clone())
            .run("init", true, true, &mut |l: &str| lines.push(l.to_string()), &["-no-color"])
            .unwrap();

        assert!(ok);
        assert_eq!(lines.len(), 2);
        assert_eq!(executor.calls(), vec!["terraform init -no-color"]);
        assert_eq!(
            executor.environments()[0],
            vec![
                ("AWS_PROFILE".to_string(), "prod".to_string()),
                ("AWS_REGION".to_string(), "eu-west-1".to_string())
            ]
        );
        assert!(output.contains_message(&OutputMessage::Dimmed("Initializing...".to_string())));
    }

    #[test]
    fn test_failure_without_throw_returns_false() {
        let executor = Arc::new(MockCommandExecutor::with_outputs(vec![MockCommandResult::failure(
            "terraform import",
            1,
            "\nError: Cannot import non-existent remote object\n",
        )]));
        let mut lines = Vec::new();

        let ok = runner(executor, Arc::new(MockOutput::new()))
            .run("import", false, false, &mut |l: &str| lines.push(l.to_string()), &["aws_s3_bucket.B", "b"])
            .unwrap();

        assert!(!ok);
        assert_eq!(error_messages(&lines), vec!["Cannot import non-existent remote object"]);
    }

    #[test]
    fn test_failure_with_throw_reports_exit_code() {
        let executor = Arc::new(MockCommandExecutor::with_outputs(vec![MockCommandResult::failure(
            "terraform plan",
            2,
            "",
        )]));

        let error = runner(executor, Arc::new(MockOutput::new()))
            .run("plan", true, false, &mut |_| {}, &[])
            .unwrap_err();

        assert!(error.to_string().contains("terraform exited with code 2"));
    }

    #[test]
    fn test_check_installed() {
        let missing = Arc::new(MockCommandExecutor::with_outputs(vec![MockCommandResult::failure(
            "terraform version",
            127,
            "",
        )]));

        assert!(matches!(
            runner(missing, Arc::new(MockOutput::new())).check_installed(),
            Err(MigrationError::TerraformNotFound(_))
        ));
        assert!(runner(Arc::new(MockCommandExecutor::new()), Arc::new(MockOutput::new()))
            .check_installed()
            .is_ok());
    }
}
