// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Input/Update type derivation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         Deriver::pass                          │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │  EntityHost ──► reader ──► EntityDeclaration (per entity)      │
//! │                                    │                           │
//! │                                    ▼                           │
//! │                    classify ──► editable properties            │
//! │                                    │                           │
//! │                                    ▼                           │
//! │                    resolve ──► ResolvedType per property       │
//! │                                    │                           │
//! │                                    ▼                           │
//! │                    emit ──► DerivedTypeSpec (Input, Update)    │
//! │                                    │                           │
//! │                                    ▼                           │
//! │                    render ──► GeneratedFile ──► CodeWriter     │
//! │                                                                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`reader`] | Entity discovery and package filtering |
//! | [`classify`] | Editable / excluded property partition |
//! | [`resolve`] | Entity-to-Input type substitution |
//! | [`emit`] | Input and Update type specs |
//! | [`render`] | Rust source for a type spec |
//! | [`coordinator`] | Passes, outcomes and the fixed-point driver |

pub mod classify;
pub mod coordinator;
pub mod emit;
pub mod reader;
pub mod render;
pub mod resolve;

#[cfg(test)]
mod testing;

pub use coordinator::{
    Convergence, DerivationReport, Deriver, Diagnostic, Level, PassReport
};
