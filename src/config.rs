// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Derivation configuration.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `input_suffix` | `"Input"` | Suffix of the create type (`BookInput`) |
//! | `update_suffix` | `"Update"` | Suffix of the update type (`BookUpdate`) |
//! | `nullable_updates` | `true` | Widen update fields to `Option` with `None` default |
//! | `filters` | `["*"]` | Package patterns gating entity discovery |
//! | `namespace` | `"types"` | Sub-module generated types are placed in |
//! | `derives` | `Debug, Clone` | Derives on generated types |
//! | `max_rounds` | `8` | Upper bound of the fixed-point iteration |
//!
//! # Sources
//!
//! ```rust,ignore
//! // entity-types.toml
//! let config = DeriveConfig::from_file("entity-types.toml")?;
//!
//! // host-style string options, camelCase keys accepted
//! let config = DeriveConfig::from_options([("inputSuffix", "Create"), ("filters", "crate::model::*")])?;
//! ```

use std::{fs, path::Path};

use convert_case::{Case, Casing};
use serde::Deserialize;

use crate::{error::ConfigError, utils::pattern::PackageFilter};

fn default_input_suffix() -> String {
    "Input".to_string()
}

fn default_update_suffix() -> String {
    "Update".to_string()
}

fn default_filters() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_namespace() -> String {
    "types".to_string()
}

fn default_derives() -> Vec<String> {
    ["Debug", "Clone"].map(String::from).to_vec()
}

/// Options controlling derivation and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeriveConfig {
    pub input_suffix:     String,
    pub update_suffix:    String,
    pub nullable_updates: bool,
    pub filters:          Vec<String>,
    pub namespace:        String,
    pub derives:          Vec<String>,
    pub max_rounds:       usize
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            input_suffix:     default_input_suffix(),
            update_suffix:    default_update_suffix(),
            nullable_updates: true,
            filters:          default_filters(),
            namespace:        default_namespace(),
            derives:          default_derives(),
            max_rounds:       8
        }
    }
}

impl DeriveConfig {
    /// Parse a TOML document and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed documents or unknown keys,
    /// and the [`validate`](Self::validate) errors otherwise.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source
        })?;
        Self::from_toml_str(&text)
    }

    /// Build from host-style string options.
    ///
    /// Keys are normalised to snake case, so `nullableUpdates` and
    /// `nullable_updates` are the same option. List options are
    /// comma-separated. Options not given keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Option`] for unknown keys or unparsable values.
    pub fn from_options<I, K, V>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>
    {
        let mut config = Self::default();

        for (key, value) in options {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            let option_error = |reason: &str| ConfigError::Option {
                key:    key.to_string(),
                value:  value.to_string(),
                reason: reason.to_string()
            };

            match key.to_case(Case::Snake).as_str() {
                "input_suffix" => config.input_suffix = value.to_string(),
                "update_suffix" => config.update_suffix = value.to_string(),
                "nullable_updates" => {
                    config.nullable_updates = value
                        .parse()
                        .map_err(|_| option_error("expected `true` or `false`"))?;
                }
                "filters" => config.filters = split_list(value),
                "namespace" => config.namespace = value.to_string(),
                "derives" => config.derives = split_list(value),
                "max_rounds" => {
                    config.max_rounds = value
                        .parse()
                        .map_err(|_| option_error("expected a positive integer"))?;
                }
                _ => return Err(option_error("unknown option"))
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the options form a usable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, suffix) in [
            ("input_suffix", &self.input_suffix),
            ("update_suffix", &self.update_suffix)
        ] {
            if suffix.is_empty() || syn::parse_str::<syn::Ident>(&format!("T{suffix}")).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{option} `{suffix}` cannot extend a type name"
                )));
            }
        }

        if self.input_suffix == self.update_suffix {
            return Err(ConfigError::Invalid(
                "input_suffix and update_suffix must differ".to_string()
            ));
        }

        if syn::parse_str::<syn::Ident>(&self.namespace).is_err() {
            return Err(ConfigError::Invalid(format!(
                "namespace `{}` is not a module name",
                self.namespace
            )));
        }

        if let Some(derive) = self
            .derives
            .iter()
            .find(|derive| syn::parse_str::<syn::Path>(derive).is_err())
        {
            return Err(ConfigError::Invalid(format!("derive `{derive}` is not a path")));
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Compiled package filter.
    #[must_use]
    pub fn package_filter(&self) -> PackageFilter {
        PackageFilter::new(&self.filters)
    }

    /// Package generated types for `entity_package` are placed in.
    #[must_use]
    pub fn types_package(&self, entity_package: &str) -> String {
        if entity_package.is_empty() {
            self.namespace.clone()
        } else {
            format!("{entity_package}::{}", self.namespace)
        }
    }

    #[must_use]
    pub fn input_name(&self, base: &str) -> String {
        format!("{base}{}", self.input_suffix)
    }

    #[must_use]
    pub fn update_name(&self, base: &str) -> String {
        format!("{base}{}", self.update_suffix)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DeriveConfig::default();
        assert_eq!(config.input_suffix, "Input");
        assert_eq!(config.update_suffix, "Update");
        assert!(config.nullable_updates);
        assert_eq!(config.filters, vec!["*"]);
        assert_eq!(config.namespace, "types");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn options_accept_camel_case_keys() {
        let config = DeriveConfig::from_options([
            ("inputSuffix", "In"),
            ("updateSuffix", "Up"),
            ("nullableUpdates", "false"),
            ("filters", "crate::model::*, crate::billing::*")
        ])
        .unwrap();

        assert_eq!(config.input_suffix, "In");
        assert_eq!(config.update_suffix, "Up");
        assert!(!config.nullable_updates);
        assert_eq!(config.filters, vec!["crate::model::*", "crate::billing::*"]);
    }

    #[test]
    fn options_reject_bad_boolean() {
        let err = DeriveConfig::from_options([("nullable_updates", "yes")]).unwrap_err();
        assert!(matches!(err, ConfigError::Option { .. }));
    }

    #[test]
    fn options_reject_unknown_key() {
        let err = DeriveConfig::from_options([("outputDir", "build")]).unwrap_err();
        assert!(err.to_string().contains("unknown option"));
    }

    #[test]
    fn toml_partial_document() {
        let config = DeriveConfig::from_toml_str(
            r#"
            update_suffix = "Patch"
            derives = ["Debug", "serde::Deserialize"]
            "#
        )
        .unwrap();

        assert_eq!(config.input_suffix, "Input");
        assert_eq!(config.update_suffix, "Patch");
        assert_eq!(config.derives, vec!["Debug", "serde::Deserialize"]);
    }

    #[test]
    fn toml_unknown_field_is_error() {
        assert!(DeriveConfig::from_toml_str("suffix = \"X\"").is_err());
    }

    #[test]
    fn validate_rejects_equal_suffixes() {
        let config = DeriveConfig {
            update_suffix: "Input".to_string(),
            ..DeriveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_suffix_and_namespace() {
        let config = DeriveConfig {
            input_suffix: "-In".to_string(),
            ..DeriveConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DeriveConfig {
            namespace: "generated types".to_string(),
            ..DeriveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_rounds() {
        let config = DeriveConfig {
            max_rounds: 0,
            ..DeriveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn naming_helpers() {
        let config = DeriveConfig::default();
        assert_eq!(config.types_package("crate::library"), "crate::library::types");
        assert_eq!(config.types_package(""), "types");
        assert_eq!(config.input_name("Book"), "BookInput");
        assert_eq!(config.update_name("Book"), "BookUpdate");
    }
}
