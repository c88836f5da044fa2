//! Facade over the package manager's command surface
//!
//! Each method builds one command line, runs it through the configured
//! [`CommandRunner`] and maps the outcome into this crate's error kinds.
//! Nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use conan_exec::{CommandOutput, CommandRunner, ConanCommand, ExecError};
use regex::Regex;
use serde_json::Value;

use crate::tools::new::Template;
use crate::{Error, Result};

/// Name Conan uses for the profile selected when none is given
pub const DEFAULT_PROFILE: &str = "default";

static PROFILE_NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)profile\s+not\s+found").unwrap());

static FILE_EXISTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)already\s+exists?").unwrap());

static FILE_SAVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*File saved:\s*(.+?)\s*$").unwrap());

/// Options for scaffolding a project from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub template: Template,
    pub name: String,
    pub version: String,
    pub requires: Vec<String>,
    /// Target directory; `None` scaffolds into the working directory
    pub output_dir: Option<PathBuf>,
    pub force: bool,
}

/// Package reference query for `conan list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub reference: String,
    pub remote: Option<String>,
    pub filter_settings: Vec<String>,
    pub filter_options: Vec<String>,
}

/// Inputs for `conan graph info`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphQuery {
    pub path: PathBuf,
    pub remote: Option<String>,
    pub build_profile: Option<String>,
    pub host_profile: Option<String>,
}

/// Client for the installed package manager
pub struct Conan {
    runner: Arc<dyn CommandRunner>,
    work_dir: PathBuf,
    timeout: Option<Duration>,
}

impl Conan {
    pub fn new(runner: Arc<dyn CommandRunner>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            work_dir: work_dir.into(),
            timeout: None,
        }
    }

    /// Limit every invocation to `timeout` (builder pattern).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory every command runs in
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Resolve a caller-supplied path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    fn command<I, S>(&self, args: I) -> ConanCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConanCommand::new(args)
            .current_dir(&self.work_dir)
            .timeout(self.timeout)
    }

    async fn execute(&self, command: ConanCommand) -> std::result::Result<CommandOutput, ExecError> {
        tracing::info!(command = %command, "Running conan");
        self.runner.run(&command).await
    }

    /// Version string reported by `conan --version`.
    pub async fn version(&self) -> Result<String> {
        let output = self.execute(self.command(["--version"])).await?;
        Ok(parse_version(&output.stdout))
    }

    /// Resolved configuration of a profile, as the manager's JSON text.
    ///
    /// `None` selects the default profile.
    pub async fn profile_show(&self, profile: Option<&str>) -> Result<String> {
        let command = self
            .command(["profile", "show", "--format=json"])
            .option_if("--profile", profile);

        match self.execute(command).await {
            Ok(output) => Ok(output.stdout),
            Err(ExecError::CommandFailed { stderr, .. }) if PROFILE_NOT_FOUND.is_match(&stderr) => {
                Err(Error::ProfileNotFound(
                    profile.unwrap_or(DEFAULT_PROFILE).to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Names of the configured profiles in the manager's listing order.
    pub async fn profile_list(&self) -> Result<Vec<String>> {
        let output = self
            .execute(self.command(["profile", "list", "--format=json"]))
            .await?;
        parse_profile_list(&output.stdout)
    }

    /// Scaffold a project and return the files the manager reports as saved.
    pub async fn new_project(&self, project: &NewProject) -> Result<Vec<String>> {
        let command = self
            .command(["new", project.template.as_str()])
            .option("-d", format!("name={}", project.name))
            .option("-d", format!("version={}", project.version))
            .repeated(
                "-d",
                project.requires.iter().map(|r| format!("requires={}", r)),
            )
            .option_if(
                "--output",
                project
                    .output_dir
                    .as_deref()
                    .map(|dir| self.resolve(dir).display().to_string()),
            )
            .flag_if("--force", project.force);

        match self.execute(command).await {
            Ok(output) => Ok(saved_files(&output)),
            Err(ExecError::CommandFailed { stderr, .. }) if FILE_EXISTS.is_match(&stderr) => {
                Err(Error::FileExists(stderr))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `conan list` and return the manager's JSON text.
    pub async fn list(&self, query: &ListQuery) -> Result<String> {
        let command = self
            .command(["list", query.reference.as_str(), "--format=json"])
            .option_if("--remote", query.remote.as_deref())
            .repeated("-fs", query.filter_settings.iter().map(String::as_str))
            .repeated("-fo", query.filter_options.iter().map(String::as_str));

        Ok(self.execute(command).await?.stdout)
    }

    /// Run `conan graph info` and return the parsed JSON graph.
    pub async fn graph_info(&self, query: &GraphQuery) -> Result<Value> {
        let command = self
            .command([
                "graph".to_string(),
                "info".to_string(),
                query.path.display().to_string(),
                "--format=json".to_string(),
            ])
            .option_if("--remote", query.remote.as_deref())
            .option_if("-pr:b", query.build_profile.as_deref())
            .option_if("-pr:h", query.host_profile.as_deref());

        let output = self.execute(command).await?;
        serde_json::from_str(&output.stdout).map_err(|e| {
            Error::UnderlyingToolError(format!("unexpected graph info output: {}", e))
        })
    }
}

/// Parse `conan profile list --format=json`.
///
/// Conan prints a JSON array of names; an object of arrays is flattened in
/// key order.
pub fn parse_profile_list(stdout: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(stdout.trim()).map_err(|e| {
        Error::UnderlyingToolError(format!("unexpected profile list output: {}", e))
    })?;

    let names = match value {
        Value::Array(items) => collect_names(&items),
        Value::Object(groups) => groups
            .values()
            .filter_map(Value::as_array)
            .flat_map(|items| collect_names(items))
            .collect(),
        other => {
            return Err(Error::UnderlyingToolError(format!(
                "unexpected profile list output: {}",
                other
            )));
        }
    };
    Ok(names)
}

fn collect_names(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Files reported by `conan new` as `File saved: <path>` on either stream.
pub fn saved_files(output: &CommandOutput) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| FILE_SAVED.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

fn parse_version(stdout: &str) -> String {
    let line = stdout.lines().next().unwrap_or_default().trim();
    line.strip_prefix("Conan version")
        .map(str::trim)
        .unwrap_or(line)
        .to_string()
}
