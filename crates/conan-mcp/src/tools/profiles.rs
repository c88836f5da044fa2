//! Profile inspection tools

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::args::Arguments;
use crate::conan::Conan;
use crate::handler::ToolHandler;
use crate::schema::{ParamType, ParameterSpec, ToolDescriptor};

use super::json_or_text;

/// Handle get_conan_profile - Show a profile's resolved configuration
pub struct GetProfile {
    conan: Arc<Conan>,
}

#[async_trait]
impl ToolHandler for GetProfile {
    async fn call(&self, args: Arguments) -> Result<Value> {
        let stdout = self.conan.profile_show(args.opt_str("profile")).await?;
        Ok(json_or_text(stdout))
    }
}

pub fn get_profile_descriptor(conan: Arc<Conan>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_conan_profile",
        "Get the resolved host and build configuration of a Conan profile. \
         Omit the profile to get the default profile.",
        Arc::new(GetProfile { conan }),
    )
    .param(ParameterSpec::optional(
        "profile",
        ParamType::String,
        "Profile name, as returned by list_conan_profiles. Omit for the default profile.",
    ))
}

/// Handle list_conan_profiles - List configured profile names
pub struct ListProfiles {
    conan: Arc<Conan>,
}

#[async_trait]
impl ToolHandler for ListProfiles {
    async fn call(&self, _args: Arguments) -> Result<Value> {
        let names = self.conan.profile_list().await?;
        Ok(Value::from(names))
    }
}

pub fn list_profiles_descriptor(conan: Arc<Conan>) -> ToolDescriptor {
    ToolDescriptor::new(
        "list_conan_profiles",
        "List the names of all configured Conan profiles.",
        Arc::new(ListProfiles { conan }),
    )
}
