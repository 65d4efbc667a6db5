use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Trait for running external programs, allowing for mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion with extra environment variables and
    /// capture its output
    fn execute(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<Output>;
}

/// Real command executor using std::process::Command
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<Output> {
        Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .with_context(|| format!("Failed to execute {}", command))
    }
}

/// Mock command executor for testing
///
/// Every call is recorded as `command arg1 arg2 ...`. A configured result is
/// used, once, by the first call whose command line starts with its
/// `command`; other calls succeed with no output.
#[cfg(test)]
pub struct MockCommandExecutor {
    outputs: std::sync::Mutex<Vec<MockCommandResult>>,
    calls: std::sync::Mutex<Vec<String>>,
    environments: std::sync::Mutex<Vec<Vec<(String, String)>>>,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct MockCommandResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
impl MockCommandResult {
    pub fn success(command: &str, stdout: &str) -> Self {
        Self {
            command: command.to_string(),
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failure(command: &str, exit_code: i32, stderr: &str) -> Self {
        Self {
            command: command.to_string(),
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::with_outputs(Vec::new())
    }

    pub fn with_outputs(outputs: Vec<MockCommandResult>) -> Self {
        Self {
            outputs: std::sync::Mutex::new(outputs),
            calls: std::sync::Mutex::new(Vec::new()),
            environments: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn add_output(&self, output: MockCommandResult) {
        self.outputs.lock().unwrap().push(output);
    }

    /// Command lines executed so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Environment passed to each call, in call order
    pub fn environments(&self) -> Vec<Vec<(String, String)>> {
        self.environments.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn execute(
        &self,
        command: &str,
        args: &[&str],
        _working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<Output> {
        let line = std::iter::once(command)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        self.calls.lock().unwrap().push(line.clone());
        self.environments.lock().unwrap().push(env.to_vec());

        let mut outputs = self.outputs.lock().unwrap();

        if let Some(position) = outputs.iter().position(|r| line.starts_with(&r.command)) {
            let result = outputs.remove(position);
            return Ok(Output {
                status: create_exit_status(result.exit_code),
                stdout: result.stdout.into_bytes(),
                stderr: result.stderr.into_bytes(),
            });
        }

        Ok(Output {
            status: create_exit_status(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

#[cfg(test)]
fn create_exit_status(code: i32) -> std::process::ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        // Wait status layout: exit code in the second byte
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code as u32)
    }
}
