//! [`FakeConan`] imitates the parts of the Conan CLI the server drives.
//!
//! Supported commands:
//!
//! - `--version`
//! - `profile list --format=json`
//! - `profile show --format=json [--profile <name>]`
//! - `new <template> -d name=.. -d version=.. [-d requires=..] [--output <dir>] [--force]`
//!
//! Anything else fails with a non-zero exit. Error messages mirror the real
//! CLI closely enough for stderr classification to work.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use conan_exec::{CommandOutput, CommandRunner, ConanCommand, ExecError, Result};
use serde_json::{Value, json};

/// Stateful stand-in for the `conan` executable
pub struct FakeConan {
    profiles: Mutex<Vec<(String, Value)>>,
    calls: Mutex<Vec<ConanCommand>>,
}

impl Default for FakeConan {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeConan {
    /// A fake with only the `default` profile.
    pub fn new() -> Self {
        let fake = Self {
            profiles: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        };
        fake.add_profile("default", linux_settings("Release"));
        fake
    }

    /// Add a profile (builder pattern). Listing order is insertion order.
    pub fn with_profile(self, name: &str, settings: Value) -> Self {
        self.add_profile(name, settings);
        self
    }

    fn add_profile(&self, name: &str, settings: Value) {
        self.profiles
            .lock()
            .unwrap()
            .push((name.to_string(), settings));
    }

    /// Commands received so far, oldest first.
    pub fn calls(&self) -> Vec<ConanCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of commands received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn profile_list(&self) -> Result<CommandOutput> {
        let names: Vec<String> = self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        Ok(CommandOutput {
            stdout: Value::from(names).to_string(),
            stderr: "Profiles found in the cache:\n".to_string(),
        })
    }

    fn profile_show(&self, command: &ConanCommand) -> Result<CommandOutput> {
        let name = command.value_of("--profile").unwrap_or("default");
        let profiles = self.profiles.lock().unwrap();
        let Some((_, settings)) = profiles.iter().find(|(n, _)| n == name) else {
            return Err(failed(format!("ERROR: Profile not found: {name}")));
        };

        let section = json!({
            "settings": settings,
            "package_settings": {},
            "options": {},
            "tool_requires": {},
            "conf": {},
            "build_env": ""
        });
        let document = json!({ "host": section, "build": section });
        Ok(CommandOutput::stdout(document.to_string()))
    }

    fn new_project(&self, command: &ConanCommand) -> Result<CommandOutput> {
        let args = command.get_args();
        let template = args.get(1).map(String::as_str).unwrap_or_default();
        let name = define(command, "name").unwrap_or("mypkg");

        let target: PathBuf = match (command.value_of("--output"), command.get_current_dir()) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(cwd)) => cwd.to_path_buf(),
            (None, None) => return Err(failed("ERROR: no working directory")),
        };

        let files = template_files(template, name);
        if !command.has_arg("--force") {
            if let Some(existing) = files.iter().find(|f| target.join(f).exists()) {
                return Err(failed(format!(
                    "ERROR: File '{existing}' already exists, and --force not defined, aborting"
                )));
            }
        }

        let requires: Vec<&str> = defines(command, "requires").collect();
        let mut stderr = String::new();
        for file in &files {
            let path = target.join(file);
            write_file(&path, &render(file, name, &requires))?;
            stderr.push_str(&format!("File saved: {file}\n"));
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr,
        })
    }
}

#[async_trait]
impl CommandRunner for FakeConan {
    async fn run(&self, command: &ConanCommand) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let args: Vec<&str> = command.get_args().iter().map(String::as_str).collect();
        match args.as_slice() {
            ["--version"] => Ok(CommandOutput::stdout("Conan version 2.9.2\n")),
            ["profile", "list", ..] => self.profile_list(),
            ["profile", "show", ..] => self.profile_show(command),
            ["new", ..] => self.new_project(command),
            _ => Err(failed(format!("ERROR: Unknown command '{command}'"))),
        }
    }
}

/// Settings of a typical Linux x86_64 profile.
pub fn linux_settings(build_type: &str) -> Value {
    json!({
        "arch": "x86_64",
        "build_type": build_type,
        "compiler": "gcc",
        "compiler.cppstd": "gnu17",
        "compiler.libcxx": "libstdc++11",
        "compiler.version": "13",
        "os": "Linux"
    })
}

fn failed(stderr: impl Into<String>) -> ExecError {
    ExecError::CommandFailed {
        code: 1,
        stderr: stderr.into(),
    }
}

/// Values of every `-d key=value` definition for `key`, in order.
fn defines<'a>(command: &'a ConanCommand, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let args = command.get_args();
    args.iter()
        .zip(args.iter().skip(1))
        .filter(|(flag, _)| flag.as_str() == "-d")
        .filter_map(move |(_, value)| {
            value
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

fn define<'a>(command: &'a ConanCommand, key: &'a str) -> Option<&'a str> {
    defines(command, key).next()
}

fn template_files(template: &str, name: &str) -> Vec<String> {
    let mut files = vec!["conanfile.py".to_string()];
    if template.starts_with("cmake") {
        files.push("CMakeLists.txt".to_string());
    }
    if template.ends_with("_lib") {
        files.push(format!("include/{name}.h"));
        files.push(format!("src/{name}.cpp"));
        files.push("test_package/conanfile.py".to_string());
    } else {
        files.push("src/main.cpp".to_string());
    }
    files
}

fn render(file: &str, name: &str, requires: &[&str]) -> String {
    if file.ends_with("conanfile.py") {
        let mut body = format!("class Recipe(ConanFile):\n    name = \"{name}\"\n");
        for require in requires {
            body.push_str(&format!("    # requires {require}\n"));
        }
        body
    } else {
        format!("// {name}\n")
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
