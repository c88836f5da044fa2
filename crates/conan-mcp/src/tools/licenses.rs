//! Dependency license report tool
//!
//! Reports the licenses Conan records for each host-context dependency of a
//! project. No license policy is evaluated here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::args::Arguments;
use crate::conan::{Conan, GraphQuery};
use crate::handler::ToolHandler;
use crate::schema::{ParamType, ParameterSpec, ToolDescriptor};
use crate::{Error, Result};

/// Map each host-context, non-root node of a `conan graph info` document to
/// its license.
///
/// Multiple licenses are joined with `" OR "`; a missing license is `null`.
/// Node order follows the document.
pub fn collect_licenses(graph_info: &Value) -> Result<Map<String, Value>> {
    let graph = graph_info
        .get("graph")
        .ok_or_else(|| Error::UnderlyingToolError("graph info output has no 'graph'".into()))?;
    let nodes = graph
        .get("nodes")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::UnderlyingToolError("graph info output has no 'nodes'".into()))?;
    let roots = graph.get("root").and_then(Value::as_object);

    let mut licenses = Map::new();
    for (id, node) in nodes {
        if roots.is_some_and(|r| r.contains_key(id)) {
            continue;
        }
        if node.get("context").and_then(Value::as_str) != Some("host") {
            continue;
        }
        let Some(reference) = node.get("ref").and_then(Value::as_str) else {
            continue;
        };
        licenses.insert(reference.to_string(), license_of(node));
    }
    Ok(licenses)
}

fn license_of(node: &Value) -> Value {
    match node.get("license") {
        Some(Value::String(license)) => Value::String(license.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                Value::Null
            } else {
                Value::String(parts.join(" OR "))
            }
        }
        _ => Value::Null,
    }
}

/// Handle check_conan_dependencies_licenses - Report dependency licenses
pub struct CheckLicenses {
    conan: Arc<Conan>,
}

#[async_trait]
impl ToolHandler for CheckLicenses {
    async fn call(&self, args: Arguments) -> Result<Value> {
        let base = match args.opt_str("work_dir") {
            Some(dir) => self.conan.resolve(Path::new(dir)),
            None => self.conan.work_dir().to_path_buf(),
        };
        let path: PathBuf = base.join(args.str("path")?);

        let query = GraphQuery {
            path,
            remote: args.opt_str("remote").map(str::to_string),
            build_profile: args.opt_str("build_profile").map(str::to_string),
            host_profile: args.opt_str("host_profile").map(str::to_string),
        };

        let graph = self.conan.graph_info(&query).await?;
        Ok(Value::Object(collect_licenses(&graph)?))
    }
}

pub fn descriptor(conan: Arc<Conan>) -> ToolDescriptor {
    ToolDescriptor::new(
        "check_conan_dependencies_licenses",
        "Report the license of every host dependency of a Conan project, as \
         recorded by the package recipes. Returns a map of reference to license.",
        Arc::new(CheckLicenses { conan }),
    )
    .param(ParameterSpec::required(
        "path",
        ParamType::String,
        "Path to the conanfile.py or conanfile.txt, relative to work_dir",
    ))
    .param(ParameterSpec::optional(
        "work_dir",
        ParamType::String,
        "Directory the path is relative to. Defaults to the working directory.",
    ))
    .param(ParameterSpec::optional(
        "remote",
        ParamType::String,
        "Remote to resolve dependencies from",
    ))
    .param(ParameterSpec::optional(
        "build_profile",
        ParamType::String,
        "Profile for the build context",
    ))
    .param(ParameterSpec::optional(
        "host_profile",
        ParamType::String,
        "Profile for the host context",
    ))
}
