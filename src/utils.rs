// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Shared utilities.
//!
//! # Submodules
//!
//! - [`docs`]: doc comment extraction from `syn` attributes
//! - [`pattern`]: package filter patterns

pub mod docs;
pub mod pattern;
