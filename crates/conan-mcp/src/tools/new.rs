//! Project scaffolding tool

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::args::Arguments;
use crate::conan::{Conan, NewProject};
use crate::handler::ToolHandler;
use crate::schema::{ParamType, ParameterSpec, ToolDescriptor};
use crate::{Error, Result};

/// Project templates shipped with Conan 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Basic,
    CmakeLib,
    CmakeExe,
    HeaderLib,
    MesonLib,
    MesonExe,
    MsbuildLib,
    MsbuildExe,
    BazelLib,
    BazelExe,
    AutotoolsLib,
    AutotoolsExe,
    PremakeLib,
    PremakeExe,
    LocalRecipesIndex,
    Workspace,
}

impl Template {
    pub const ALL: [Template; 16] = [
        Template::Basic,
        Template::CmakeLib,
        Template::CmakeExe,
        Template::HeaderLib,
        Template::MesonLib,
        Template::MesonExe,
        Template::MsbuildLib,
        Template::MsbuildExe,
        Template::BazelLib,
        Template::BazelExe,
        Template::AutotoolsLib,
        Template::AutotoolsExe,
        Template::PremakeLib,
        Template::PremakeExe,
        Template::LocalRecipesIndex,
        Template::Workspace,
    ];

    pub const NAMES: [&'static str; 16] = [
        "basic",
        "cmake_lib",
        "cmake_exe",
        "header_lib",
        "meson_lib",
        "meson_exe",
        "msbuild_lib",
        "msbuild_exe",
        "bazel_lib",
        "bazel_exe",
        "autotools_lib",
        "autotools_exe",
        "premake_lib",
        "premake_exe",
        "local_recipes_index",
        "workspace",
    ];

    /// Identifier Conan uses for the template.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .position(|name| *name == s)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| Error::InvalidTemplate(s.to_string()))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version used when the caller does not give one
pub const DEFAULT_VERSION: &str = "1.0";

/// Handle conan_new - Scaffold a project from a template
pub struct ConanNew {
    conan: Arc<Conan>,
}

#[async_trait]
impl ToolHandler for ConanNew {
    async fn call(&self, args: Arguments) -> Result<Value> {
        // Reject unknown templates before anything touches the filesystem
        let template: Template = args.str("template")?.parse()?;

        let project = NewProject {
            template,
            name: args.str("name")?.to_string(),
            version: args.opt_str("version").unwrap_or(DEFAULT_VERSION).to_string(),
            requires: args.string_list("requires"),
            output_dir: args.opt_str("output_dir").map(PathBuf::from),
            force: args.flag("force"),
        };

        let files = self.conan.new_project(&project).await?;

        let output_dir = match &project.output_dir {
            Some(dir) => self.conan.resolve(dir),
            None => self.conan.work_dir().to_path_buf(),
        };

        let mut payload = json!({
            "template": template.as_str(),
            "name": project.name,
            "version": project.version,
            "output_dir": output_dir.display().to_string(),
            "created_files": files,
        });
        if let Some(warning) = unverified_requires_warning(&project.requires) {
            payload["warning"] = Value::String(warning);
        }
        Ok(payload)
    }
}

/// Dependencies are forwarded without checking they exist; tell the caller.
fn unverified_requires_warning(requires: &[String]) -> Option<String> {
    if requires.is_empty() {
        return None;
    }
    Some(format!(
        "WARNING: dependencies were added without checking that they exist: {}. \
         Use list_conan_packages to verify the versions are available.",
        requires.join(", ")
    ))
}

pub fn descriptor(conan: Arc<Conan>) -> ToolDescriptor {
    ToolDescriptor::new(
        "conan_new",
        "Create a new Conan project from a template (CMake, Meson, MSBuild, Bazel, \
         Autotools or Premake library/executable, header-only library, ...). \
         Returns the files that were created.",
        Arc::new(ConanNew { conan }),
    )
    .param(
        ParameterSpec::required("template", ParamType::String, "Project template")
            .with_choices(Template::NAMES),
    )
    .param(ParameterSpec::required(
        "name",
        ParamType::String,
        "Name of the project or package",
    ))
    .param(
        ParameterSpec::optional("version", ParamType::String, "Project version")
            .with_default(DEFAULT_VERSION),
    )
    .param(ParameterSpec::optional(
        "requires",
        ParamType::StringList,
        "Dependencies as name/version references, e.g. [\"fmt/12.0.0\", \"openssl/3.6.0\"]",
    ))
    .param(ParameterSpec::optional(
        "output_dir",
        ParamType::String,
        "Directory to create the project in. Defaults to the working directory.",
    ))
    .param(
        ParameterSpec::optional(
            "force",
            ParamType::Boolean,
            "Overwrite files that already exist",
        )
        .with_default(false),
    )
}
