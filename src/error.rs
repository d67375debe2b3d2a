// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Error types.
//!
//! Errors are split by the boundary they cross:
//!
//! | Type | Raised by | Effect on a pass |
//! |------|-----------|------------------|
//! | [`HostError`] | [`EntityHost`](crate::host::EntityHost) | Discovery: zero entities. Resolution: syntactic fallback |
//! | [`DeriveError`] | one entity's processing | Entity deferred, pass continues |
//! | [`WriteError`] | [`CodeWriter`](crate::writer::CodeWriter) | Entity deferred, pass continues |
//! | [`ConfigError`] | [`DeriveConfig`](crate::config::DeriveConfig) | Caller decides |
//!
//! Nothing in a pass aborts it; see [`crate::derive`].

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::QualifiedName;

/// Failure reported by the type-resolution host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error
    },

    /// A source unit could not be parsed.
    #[error("failed to parse `{origin}`: {message}")]
    Parse { origin: String, message: String },

    /// Field or entity attributes were malformed.
    #[error("invalid attribute in `{origin}`: {message}")]
    Attribute { origin: String, message: String },

    /// A referenced type name is not (yet) known.
    #[error("unresolved type `{name}`")]
    Unresolved { name: String },

    /// The host could not answer a marker query.
    #[error("declaration query failed: {0}")]
    Query(String)
}

/// Failure while committing generated files.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write `{path}`: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error
    },

    /// Another entity already produced a file with this name.
    #[error("`{type_name}` in `{package}` is already generated from `{owner}`")]
    Conflict {
        package:   String,
        type_name: String,
        owner:     String
    }
}

/// Failure processing a single entity.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// A property name is not a valid Rust identifier.
    #[error("`{entity}.{property}` is not a valid field name")]
    InvalidFieldName {
        entity:   QualifiedName,
        property: String
    },

    /// A resolved type does not render to valid Rust syntax.
    #[error("`{entity}.{property}` has unrenderable type `{ty}`: {message}")]
    InvalidType {
        entity:   QualifiedName,
        property: String,
        ty:       String,
        message:  String
    },

    /// The generated type name is not a valid Rust identifier.
    #[error("`{name}` is not a valid type name")]
    InvalidTypeName { name: String },

    /// A configured derive cannot hold for a set of generated types.
    #[error("`{entity}.{property}` holds a `{collection}` of generated types, which cannot derive `{derive}`")]
    UnsupportedSetDerive {
        entity:     QualifiedName,
        property:   String,
        collection: String,
        derive:     String
    },

    #[error(transparent)]
    Write(#[from] WriteError)
}

/// Invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Unknown option key or unparsable value.
    #[error("option `{key}` = `{value}`: {reason}")]
    Option {
        key:    String,
        value:  String,
        reason: String
    },

    /// Values parse but do not form a usable configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String)
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Config(#[from] ConfigError)
}
