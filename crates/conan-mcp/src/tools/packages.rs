//! Package listing tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::args::Arguments;
use crate::conan::{Conan, ListQuery};
use crate::handler::ToolHandler;
use crate::schema::{ParamType, ParameterSpec, ToolDescriptor};

use super::json_or_text;

/// Parts of a package reference pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePattern<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub user: Option<&'a str>,
    pub channel: Option<&'a str>,
    pub recipe_revision: Option<&'a str>,
    pub package_id: Option<&'a str>,
    pub package_revision: Option<&'a str>,
}

impl ReferencePattern<'_> {
    /// Render `name/version[@user/channel][#rrev][:pid[#prev]]`.
    ///
    /// Filtering binaries only makes sense at package level, so `has_filters`
    /// forces a package id of `*` when none was given.
    pub fn render(&self, has_filters: bool) -> String {
        let mut reference = format!("{}/{}", self.name, self.version);

        if self.user.is_some() || self.channel.is_some() {
            reference.push_str(&format!(
                "@{}/{}",
                self.user.unwrap_or("*"),
                self.channel.unwrap_or("*")
            ));
        }
        if let Some(rrev) = self.recipe_revision {
            reference.push('#');
            reference.push_str(rrev);
        }

        let package_id = match (self.package_id, self.package_revision) {
            (Some(pid), _) => Some(pid),
            (None, Some(_)) => Some("*"),
            (None, None) if has_filters => Some("*"),
            (None, None) => None,
        };
        if let Some(pid) = package_id {
            reference.push(':');
            reference.push_str(pid);
            if let Some(prev) = self.package_revision {
                reference.push('#');
                reference.push_str(prev);
            }
        }
        reference
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Handle list_conan_packages - Query available versions and binaries
pub struct ListPackages {
    conan: Arc<Conan>,
}

#[async_trait]
impl ToolHandler for ListPackages {
    async fn call(&self, args: Arguments) -> Result<Value> {
        let filter_settings = args.string_list("filter_settings");
        let filter_options = args.string_list("filter_options");

        let pattern = ReferencePattern {
            name: args.str("name")?,
            version: args.opt_str("version").unwrap_or("*"),
            user: non_empty(args.opt_str("user")),
            channel: non_empty(args.opt_str("channel")),
            recipe_revision: non_empty(args.opt_str("recipe_revision")),
            package_id: non_empty(args.opt_str("package_id")),
            package_revision: non_empty(args.opt_str("package_revision")),
        };
        let has_filters = !filter_settings.is_empty() || !filter_options.is_empty();

        let query = ListQuery {
            reference: pattern.render(has_filters),
            remote: non_empty(args.opt_str("remote")).map(str::to_string),
            filter_settings,
            filter_options,
        };

        let stdout = self.conan.list(&query).await?;
        Ok(json_or_text(stdout))
    }
}

pub fn descriptor(conan: Arc<Conan>) -> ToolDescriptor {
    ToolDescriptor::new(
        "list_conan_packages",
        "List the available versions of Conan packages across remotes. \
         Supports version ranges, user/channel, revisions, package ids and \
         filtering binaries by settings and options. Only name is required.",
        Arc::new(ListPackages { conan }),
    )
    .param(ParameterSpec::required(
        "name",
        ParamType::String,
        "Package name pattern: \"fmt\" (exact), \"fmt*\" (prefix), \"*fmt*\" (contains), \"*fmt\" (suffix)",
    ))
    .param(
        ParameterSpec::optional(
            "version",
            ParamType::String,
            "Version or version range, e.g. \"1.2.3\", \"[>=1.0 <2.0]\", \"[~1.2]\", \"*\"",
        )
        .with_default("*"),
    )
    .param(ParameterSpec::optional(
        "user",
        ParamType::String,
        "User name. Use * to search all users.",
    ))
    .param(ParameterSpec::optional(
        "channel",
        ParamType::String,
        "Channel name. Use * to search all channels.",
    ))
    .param(ParameterSpec::optional(
        "recipe_revision",
        ParamType::String,
        "Recipe revision (rrev). Use * for all revisions or \"latest\".",
    ))
    .param(ParameterSpec::optional(
        "package_id",
        ParamType::String,
        "Package ID. Use * for all packages.",
    ))
    .param(ParameterSpec::optional(
        "package_revision",
        ParamType::String,
        "Package revision (prev). Use * for all revisions.",
    ))
    .param(
        ParameterSpec::optional(
            "filter_settings",
            ParamType::StringList,
            "Binary setting filters, e.g. [\"arch=armv8\", \"os=Windows\"] or \"arch=armv8,os=Windows\"",
        )
        .comma_separated(),
    )
    .param(
        ParameterSpec::optional(
            "filter_options",
            ParamType::StringList,
            "Binary option filters, e.g. [\"*:fPIC=True\", \"&:shared=False\"] or \"*:fPIC=True,&:shared=False\"",
        )
        .comma_separated(),
    )
    .param(
        ParameterSpec::optional(
            "remote",
            ParamType::String,
            "Remote name. Use * to search all remotes.",
        )
        .with_default("*"),
    )
}
