//! Form settings (formloom.toml)

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::NAME_SEPARATOR;

/// Top-level form settings
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FormSettings {
    #[serde(default)]
    pub compiler: CompilerSettings,
    #[serde(default)]
    pub events: EventSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// AST compiler settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CompilerSettings {
    /// Separator between name path segments
    #[serde(default = "default_separator")]
    pub name_separator: String,
}

fn default_separator() -> String {
    NAME_SEPARATOR.to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            name_separator: default_separator(),
        }
    }
}

/// Event bus settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EventSettings {
    /// Report `field:valid`/`field:invalid` after every edit
    #[serde(default = "default_true")]
    pub field_validity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            field_validity: true,
        }
    }
}

/// Store settings
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub reentrancy: ReentrancyPolicy,
}

/// What a dispatch made while another is being delivered does
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentrancyPolicy {
    /// Run it after the current notification round
    #[default]
    Queue,
    /// Fail with `FormError::ReentrantDispatch`
    Reject,
}

impl FormSettings {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
