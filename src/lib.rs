// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]

//! # entity-types
//!
//! Build-time derivation of `Input` and `Update` types from entity
//! declarations.
//!
//! For every entity, two types are generated next to it:
//!
//! | Type | Fields | Use |
//! |------|--------|-----|
//! | `BookInput` | Editable properties, types as declared | Create |
//! | `BookUpdate` | Editable properties, all `Option`, default `None` | Partial update |
//!
//! Identity (`#[id]`), version (`#[version]`) and read-only properties are
//! left out. References to other entities become references to their
//! `Input` types.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // build.rs
//! use entity_types::{DeriveConfig, Deriver, DirWriter, SourceHost};
//!
//! fn main() -> Result<(), entity_types::Error> {
//!     let mut host = SourceHost::new();
//!     host.add_file("crate::model", "src/model.rs")?;
//!
//!     let out = std::env::var("OUT_DIR").unwrap();
//!     let mut writer = DirWriter::new(out).with_rerun_directives();
//!
//!     let report = Deriver::new(DeriveConfig::default())?.run(&mut host, &mut writer);
//!     assert!(!report.has_errors());
//!     Ok(())
//! }
//! ```
//!
//! ```rust,ignore
//! // src/model.rs
//! #[derive(Debug, Entity)]
//! pub struct Book {
//!     #[id]
//!     pub id: i64,
//!     pub title: String,
//!     pub author: Author,
//!     #[field(readonly)]
//!     pub isbn: String
//! }
//!
//! // generated: crate::model::types::{BookInput, BookUpdate}
//! // pub struct BookInput  { pub title: String, pub author: AuthorInput }
//! // pub struct BookUpdate { pub title: Option<String>, pub author: Option<AuthorInput> }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`derive`] | The derivation pipeline and fixed-point driver |
//! | [`host`] | [`EntityHost`], the interface to the declaration graph |
//! | [`source`] | [`SourceHost`], a host over Rust sources |
//! | [`writer`] | [`CodeWriter`] implementations |
//! | [`config`] | [`DeriveConfig`] |
//! | [`model`] | Declarations, types and outcomes |

pub mod config;
pub mod derive;
pub mod error;
pub mod host;
pub mod marker;
pub mod model;
pub mod source;
pub mod utils;
pub mod writer;

pub use config::DeriveConfig;
pub use derive::{Convergence, DerivationReport, Deriver, Diagnostic, Level, PassReport};
pub use error::{ConfigError, DeriveError, Error, HostError, WriteError};
pub use host::EntityHost;
pub use marker::Marker;
pub use model::{DerivationOutcome, DerivedTypeSpec, EntityDeclaration, QualifiedName, ResolvedType};
pub use source::SourceHost;
pub use writer::{CodeWriter, DirWriter, GeneratedFile, MemoryWriter};
