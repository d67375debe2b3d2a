// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Input and Update type specs.
//!
//! For an entity `Book` with editable `title: String` and
//! `subtitle: Option<String>`:
//!
//! | Type | `nullable_updates = true` | `nullable_updates = false` |
//! |------|---------------------------|----------------------------|
//! | `BookInput` | `title: String`, `subtitle: Option<String>` | same |
//! | `BookUpdate` | `title: Option<String> = None`, `subtitle: Option<String> = None` | same as `BookInput` |
//!
//! Both types live in `<entity package>::<namespace>` and list fields in
//! classification order.

use crate::{
    config::DeriveConfig,
    model::{
        CollectionShape, DerivedField, DerivedTypeSpec, EntityDeclaration, ResolvedType, TypeRole
    }
};

/// An editable property with its derived type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub name:        String,
    pub ty:          ResolvedType,
    pub doc:         Option<String>,
    /// Sets in `ty` holding generated Input types.
    pub entity_sets: Vec<CollectionShape>
}

/// The two specs produced for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedTypes {
    pub input:  DerivedTypeSpec,
    pub update: DerivedTypeSpec
}

impl EmittedTypes {
    #[must_use]
    pub fn specs(&self) -> [&DerivedTypeSpec; 2] {
        [&self.input, &self.update]
    }
}

/// Build the Input and Update specs for `entity`.
#[must_use]
pub fn emit(
    entity: &EntityDeclaration,
    properties: &[ResolvedProperty],
    config: &DeriveConfig
) -> EmittedTypes {
    let package = config.types_package(entity.package());
    let base = entity.simple_name();

    let input_fields = properties
        .iter()
        .map(|property| DerivedField {
            name:        property.name.clone(),
            ty:          property.ty.clone(),
            has_default: false,
            doc:         property.doc.clone(),
            entity_sets: property.entity_sets.clone()
        })
        .collect();

    let update_fields = properties
        .iter()
        .map(|property| DerivedField {
            name:        property.name.clone(),
            ty:          if config.nullable_updates {
                property.ty.clone().widened()
            } else {
                property.ty.clone()
            },
            has_default: config.nullable_updates,
            doc:         property.doc.clone(),
            entity_sets: property.entity_sets.clone()
        })
        .collect();

    EmittedTypes {
        input:  DerivedTypeSpec {
            name:    config.input_name(base),
            package: package.clone(),
            role:    TypeRole::Input,
            source:  entity.name.clone(),
            doc:     entity.doc.clone(),
            fields:  input_fields
        },
        update: DerivedTypeSpec {
            name: config.update_name(base),
            package,
            role: TypeRole::Update,
            source: entity.name.clone(),
            doc: entity.doc.clone(),
            fields: update_fields
        }
    }
}
