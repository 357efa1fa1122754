// src/models.rs

use crate::constants::{DEFAULT_VARIADIC_LABEL, DEFAULT_VARIADIC_NAME};
use crate::core::arg_parser::ArgSpec;
use crate::core::command::CommandSpec;
use serde::{Deserialize, Serialize};

// --- PUBLIC MANIFEST MODELS (FOR TOML) ---
// These are what the user writes in a command manifest file.

/// Un manifiesto declarativo de comando, tal como se escribe en TOML.
/// El handler se adjunta por nombre durante la población del directorio.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommandManifest {
    pub name: String,
    /// Name of the execution handler the host supplies at population time.
    pub handler: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub args: Vec<ArgManifest>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    /// An unbounded tail of extra words, appended after the declared args.
    #[serde(default)]
    pub variadic: Option<VariadicManifest>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ArgManifest {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_label: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VariadicManifest {
    #[serde(default = "default_variadic_name")]
    pub name: String,
    #[serde(default = "default_variadic_label", rename = "type")]
    pub label: String,
}

fn default_required() -> bool {
    true
}

fn default_variadic_name() -> String {
    DEFAULT_VARIADIC_NAME.to_string()
}

fn default_variadic_label() -> String {
    DEFAULT_VARIADIC_LABEL.to_string()
}

impl From<ArgManifest> for ArgSpec {
    fn from(manifest: ArgManifest) -> Self {
        let mut spec = Self::new(
            manifest.name,
            manifest.type_label.as_deref(),
            manifest.required,
        );
        spec.hidden = manifest.hidden;
        spec
    }
}

impl CommandManifest {
    /// Builds the runtime definition this manifest describes. Arity is
    /// derived while the args are appended, exactly as for hand-built
    /// definitions.
    pub fn into_spec(self) -> CommandSpec {
        let mut spec = CommandSpec::new(self.name)
            .description(self.description)
            .aliases(self.aliases)
            .examples(self.examples)
            .disabled(self.disabled);
        if let Some(kind) = self.kind {
            spec = spec.kind(kind);
        }
        for arg in self.args {
            spec = spec.arg(arg.into());
        }
        if let Some(usage) = self.usage {
            spec = spec.usage(usage);
        }
        for user in self.allowed_users {
            spec = spec.allow_user(user);
        }
        if let Some(variadic) = self.variadic {
            spec = spec.variadic(variadic.name, Some(variadic.label.as_str()));
        }
        spec
    }
}

// MARK: --- UNIT TESTS ---
