//! Plan-driven correction of the generated configuration
//!
//! Some state values cannot be written back as configuration as they are.
//! [`PlanFixer`] runs `terraform plan -json`, corrects the errors it knows
//! how to correct, and plans again until the plan is clean, a pass changes
//! nothing, or the pass limit is reached.

pub mod diagnostic;
pub mod fixer;

use diagnostic::{PlanError, parse_plan_errors};
use fixer::{ConfigLines, fix};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::runner::{TerraformRunner, error_messages};
use crate::traits::{FileSystem, Output};

pub struct PlanFixer<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
    runner: &'a TerraformRunner,
    workspace: &'a Path,
    max_passes: usize,
}

impl<'a> PlanFixer<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        output: &'a dyn Output,
        runner: &'a TerraformRunner,
        workspace: &'a Path,
        max_passes: usize,
    ) -> Self {
        Self {
            fs,
            output,
            runner,
            workspace,
            max_passes: max_passes.max(1),
        }
    }

    /// Plan and correct until done; returns the problems left over
    pub fn run(&self) -> Result<Vec<String>> {
        let mut previous: Option<Vec<String>> = None;
        let mut pass = 0;

        loop {
            pass += 1;
            self.output.dimmed(&format!("  - Pass {}", pass));

            let mut lines = Vec::new();
            let clean = self.runner.run(
                "plan",
                false,
                false,
                &mut |line: &str| lines.push(line.to_string()),
                &["-json", "-no-color", "-input=false"],
            )?;

            if clean {
                if pass > 1 {
                    self.output.success("All configuration issues were corrected");
                }
                return Ok(Vec::new());
            }

            let errors = parse_plan_errors(&lines);
            if errors.is_empty() {
                let messages = error_messages(&lines);
                if messages.is_empty() {
                    return Ok(vec!["terraform plan failed".to_string()]);
                }
                return Ok(messages);
            }

            let remaining: Vec<String> = errors.iter().map(PlanError::describe).collect();
            let fingerprints: Vec<String> = errors.iter().map(PlanError::fingerprint).collect();

            if pass >= self.max_passes || previous.as_ref() == Some(&fingerprints) {
                return Ok(remaining);
            }

            let fixed = self.fix_files(&errors)?;
            self.output
                .dimmed(&format!("  - Errors fixed: {}/{}", fixed, errors.len()));

            if fixed == 0 {
                return Ok(remaining);
            }
            previous = Some(fingerprints);
        }
    }

    /// Apply every fix, file by file; returns the number of errors fixed
    fn fix_files(&self, errors: &[PlanError]) -> Result<usize> {
        let mut by_file: BTreeMap<&str, Vec<&PlanError>> = BTreeMap::new();
        for error in errors {
            if let Some(filename) = error.filename() {
                by_file.entry(filename).or_default().push(error);
            }
        }

        let mut fixed = 0;
        for (filename, file_errors) in by_file {
            let path = self.workspace.join(filename);
            if !self.fs.exists(&path) {
                continue;
            }

            let text = self
                .fs
                .read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let mut lines = ConfigLines::parse(&text);

            let count = file_errors
                .into_iter()
                .filter(|error| fix(&mut lines, error))
                .count();

            if count > 0 {
                self.fs
                    .write(&path, &lines.render())
                    .with_context(|| format!("Failed to write {:?}", path))?;
                fixed += count;
            }
        }

        Ok(fixed)
    }
}
