// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory host for unit tests.

use std::collections::{BTreeSet, HashMap};

use crate::{
    error::HostError,
    host::EntityHost,
    marker::Marker,
    model::{DerivedTypeSpec, EntityDeclaration, PropertyDeclaration, QualifiedName, TypeHandle}
};

/// Host serving a fixed list of entities.
///
/// Types resolve to the handle registered for the property name, or fail.
#[derive(Debug, Default)]
pub struct StaticHost {
    entities:     Vec<EntityDeclaration>,
    handles:      HashMap<String, TypeHandle>,
    unresolvable: BTreeSet<QualifiedName>,
    failure:      Option<String>,
    learns:       bool,
    pub observed: Vec<QualifiedName>
}

impl StaticHost {
    pub fn new(entities: Vec<EntityDeclaration>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_handle(mut self, property: &str, handle: TypeHandle) -> Self {
        self.handles.insert(property.to_string(), handle);
        self
    }

    pub fn with_unresolvable(mut self, name: QualifiedName) -> Self {
        self.unresolvable.insert(name);
        self
    }

    /// Observing a generated type makes every entity resolvable.
    pub fn learning(mut self) -> Self {
        self.learns = true;
        self
    }
}

impl EntityHost for StaticHost {
    fn declarations_with_marker(
        &self,
        marker: Marker
    ) -> Result<Vec<EntityDeclaration>, HostError> {
        if let Some(message) = &self.failure {
            return Err(HostError::Query(message.clone()));
        }
        Ok(if marker == Marker::Entity {
            self.entities.clone()
        } else {
            Vec::new()
        })
    }

    fn resolve_type(
        &self,
        _entity: &EntityDeclaration,
        property: &PropertyDeclaration
    ) -> Result<TypeHandle, HostError> {
        self.handles
            .get(&property.name)
            .cloned()
            .ok_or_else(|| HostError::Unresolved {
                name: property.declared.to_string()
            })
    }

    fn is_fully_resolvable(&self, entity: &EntityDeclaration) -> bool {
        !self.unresolvable.contains(&entity.name)
    }

    fn observe_generated(&mut self, spec: &DerivedTypeSpec) -> bool {
        self.observed.push(spec.qualified_name());
        if self.learns && !self.unresolvable.is_empty() {
            self.unresolvable.clear();
            return true;
        }
        false
    }
}
