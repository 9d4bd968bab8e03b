//! Template configuration.
//!
//! Options are bit-combinable so they can be written the way hosts usually pass them:
//! `TemplateOptions::MERGE_SCRIPTS | TemplateOptions::REMOVE_WHITE_SPACE`. On disk the
//! configuration is a JSON document and the options are their plain integer value.

use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// Bit set of template behaviours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateOptions(u8);

impl TemplateOptions {
    /// Collapse whitespace between tags before the template is parsed.
    pub const REMOVE_WHITE_SPACE: Self = Self(1);
    /// Merge adjacent client scripts into numbered bundles.
    pub const MERGE_SCRIPTS: Self = Self(2);
    /// Promote lifecycle diagnostics to `info`. No behavioural effect.
    pub const VERBOSE: Self = Self(4);

    const ALL: u8 = 1 | 2 | 4;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds options from raw bits, dropping unknown ones.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn removes_white_space(self) -> bool {
        self.contains(Self::REMOVE_WHITE_SPACE)
    }

    pub const fn merges_scripts(self) -> bool {
        self.contains(Self::MERGE_SCRIPTS)
    }

    pub const fn is_verbose(self) -> bool {
        self.contains(Self::VERBOSE)
    }
}

impl BitOr for TemplateOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TemplateOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Where a template lives and how it is prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding the template; also the site root local script paths resolve against.
    pub template_dir: PathBuf,

    #[serde(default = "default_template_name")]
    pub template_name: String,

    #[serde(default)]
    pub options: TemplateOptions,

    /// Scheme and authority prepended to request paths to form the document location.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_template_name() -> String {
    "template.htm".to_string()
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

impl TemplateConfig {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            template_name: default_template_name(),
            options: TemplateOptions::empty(),
            base_url: default_base_url(),
        }
    }

    pub fn with_template_name(mut self, name: impl Into<String>) -> Self {
        self.template_name = name.into();
        self
    }

    pub fn with_options(mut self, options: TemplateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full path of the template file.
    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(&self.template_name)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::ConfigNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TemplateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
