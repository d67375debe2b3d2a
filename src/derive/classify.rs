// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Property classification.
//!
//! A property is excluded when it is immutable, or carries the identity or
//! version marker. Every other property is editable. Editable properties
//! keep declaration order, which becomes the field order of both derived
//! types.

use std::collections::BTreeSet;

use crate::model::{EntityDeclaration, PropertyDeclaration};

/// Editable and excluded properties of one entity.
#[derive(Debug)]
pub struct Classification<'a> {
    /// Editable properties in declaration order.
    pub editable: Vec<&'a PropertyDeclaration>,

    /// Names of excluded properties.
    pub excluded: BTreeSet<String>
}

impl Classification<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.editable.is_empty()
    }
}

/// Whether a property takes part in derived types.
#[must_use]
pub fn is_editable(property: &PropertyDeclaration) -> bool {
    property.mutable && !property.markers.iter().any(|marker| marker.excludes_property())
}

/// Partition the properties of `entity`.
#[must_use]
pub fn classify(entity: &EntityDeclaration) -> Classification<'_> {
    let (editable, excluded): (Vec<_>, Vec<_>) =
        entity.properties.iter().partition(|property| is_editable(property));

    Classification {
        editable,
        excluded: excluded
            .into_iter()
            .map(|property| property.name.clone())
            .collect()
    }
}
