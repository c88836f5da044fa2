//! Built-in tools
//!
//! # Profiles
//! - `get_conan_profile` - Resolved configuration of a profile
//! - `list_conan_profiles` - Names of configured profiles
//!
//! # Projects
//! - `conan_new` - Scaffold a project from a template
//!
//! # Packages
//! - `list_conan_packages` - Query available package versions and binaries
//! - `check_conan_dependencies_licenses` - Licenses of a project's host dependencies
//!
//! Tool and parameter names are part of the public surface; renaming any of
//! them requires a version bump.

pub mod licenses;
pub mod new;
pub mod packages;
pub mod profiles;

use std::sync::Arc;

use serde_json::Value;

use crate::conan::Conan;
use crate::registry::ToolRegistry;
use crate::Result;

/// Build the registry holding every built-in tool.
pub fn builtin_registry(conan: Arc<Conan>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(profiles::get_profile_descriptor(conan.clone()))?;
    registry.register(profiles::list_profiles_descriptor(conan.clone()))?;
    registry.register(new::descriptor(conan.clone()))?;
    registry.register(packages::descriptor(conan.clone()))?;
    registry.register(licenses::descriptor(conan))?;
    Ok(registry)
}

/// Structured JSON when the manager printed JSON, raw text otherwise.
pub(crate) fn json_or_text(stdout: String) -> Value {
    serde_json::from_str(stdout.trim()).unwrap_or(Value::String(stdout))
}
