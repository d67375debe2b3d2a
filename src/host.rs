// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Type-resolution host interface.
//!
//! The derivation never inspects sources itself. It asks a host, which owns
//! the declaration graph, through the [`EntityHost`] capability trait. A
//! host for Rust sources ships in [`crate::source`]; build tools with their
//! own symbol tables implement the trait directly.
//!
//! # Contract
//!
//! - Answers are stable within a pass.
//! - At most one pass is active at a time; the host is borrowed mutably
//!   for its duration.
//! - [`EntityHost::is_fully_resolvable`] returning `false` is not an error.
//!   The entity is retried in a later round.

use crate::{
    error::HostError,
    marker::Marker,
    model::{DerivedTypeSpec, EntityDeclaration, PropertyDeclaration, TypeHandle}
};

/// Capability interface the derivation depends on.
pub trait EntityHost {
    /// All declarations carrying `marker`, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the query cannot be answered. The pass then
    /// proceeds with zero entities.
    fn declarations_with_marker(
        &self,
        marker: Marker
    ) -> Result<Vec<EntityDeclaration>, HostError>;

    /// Resolve the declared type of `property` on `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the type cannot be resolved. The caller
    /// falls back to the type as written.
    fn resolve_type(
        &self,
        entity: &EntityDeclaration,
        property: &PropertyDeclaration
    ) -> Result<TypeHandle, HostError>;

    /// Whether every type the declaration references is known.
    fn is_fully_resolvable(&self, entity: &EntityDeclaration) -> bool;

    /// Called for every committed derived type, once the pass has handled
    /// its last entity.
    ///
    /// Hosts that feed generated code back into later rounds register the
    /// type here. Returns `true` if the host learned something new.
    fn observe_generated(&mut self, spec: &DerivedTypeSpec) -> bool {
        let _ = spec;
        false
    }
}
