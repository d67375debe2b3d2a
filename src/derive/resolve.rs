// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Property type resolution.
//!
//! Computes the type a property has in the derived types. References to
//! entities are replaced by references to their generated Input types, so
//! an entity graph, self- and mutually-referential ones included, maps onto
//! a graph of Input types:
//!
//! | Declared | Derived |
//! |----------|---------|
//! | `Author` | `crate::library::types::AuthorInput` |
//! | `Option<Author>` | `Option<crate::library::types::AuthorInput>` |
//! | `Vec<Author>` | `Vec<crate::library::types::AuthorInput>` |
//! | `BTreeSet<Tag>` | `std::collections::BTreeSet<…::TagInput>` |
//! | `Option<Box<Self>>` | `Option<Box<…::CategoryInput>>` |
//! | `Vec<Arc<Author>>` | `Vec<std::sync::Arc<…::AuthorInput>>` |
//! | `HashMap<String, Author>` | unchanged |
//! | `String` | unchanged |
//!
//! Collections and the smart pointers `Box`, `Rc` and `Arc` are looked
//! through, so the Input type is found at any depth of such wrappers.
//!
//! Resolution never fails. When the host cannot resolve a type, the type
//! as written is used.

use tracing::debug;

use crate::{
    config::DeriveConfig,
    host::EntityHost,
    model::{
        CollectionShape, DeclarationInfo, EntityDeclaration, PropertyDeclaration, QualifiedName,
        ResolvedType, TypeHandle, TypeKind, split_path
    },
    utils::pattern::PackageFilter
};

/// Derived type of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ty:          ResolvedType,
    /// Sets in `ty` whose elements are generated Input types, outermost
    /// first.
    pub entity_sets: Vec<CollectionShape>
}

/// Resolves property types against a host.
#[derive(Debug)]
pub struct TypeResolver<'a, H: ?Sized> {
    host:   &'a H,
    config: &'a DeriveConfig,
    filter: &'a PackageFilter
}

impl<'a, H: EntityHost + ?Sized> TypeResolver<'a, H> {
    #[must_use]
    pub fn new(host: &'a H, config: &'a DeriveConfig, filter: &'a PackageFilter) -> Self {
        Self {
            host,
            config,
            filter
        }
    }

    /// Derived type of `property` on `entity`.
    #[must_use]
    pub fn resolve(&self, entity: &EntityDeclaration, property: &PropertyDeclaration) -> ResolvedType {
        self.resolution(entity, property).ty
    }

    /// Derived type of `property` on `entity`, with the sets of Input types
    /// it holds.
    #[must_use]
    pub fn resolution(&self, entity: &EntityDeclaration, property: &PropertyDeclaration) -> Resolution {
        let handle = match self.host.resolve_type(entity, property) {
            Ok(handle) => handle,
            Err(err) => {
                debug!(
                    entity = %entity.name,
                    property = %property.name,
                    error = %err,
                    "type resolution failed, using declared type"
                );
                return Resolution {
                    ty:          property.declared.clone(),
                    entity_sets: Vec::new()
                };
            }
        };

        let mut entity_sets = Vec::new();
        let (ty, _) = self.substitute(handle, &mut entity_sets);
        Resolution { ty, entity_sets }
    }

    /// Substituted type, and whether it holds an Input reference.
    fn substitute(&self, handle: TypeHandle, sets: &mut Vec<CollectionShape>) -> (ResolvedType, bool) {
        if let Some(entity) = self.derived_entity(handle.declaration.as_ref()) {
            return (input_reference(self.config, entity, handle.ty.nullable), true);
        }

        let TypeHandle { ty, arguments, .. } = handle;
        let Ok([argument]) = <[TypeHandle; 1]>::try_from(arguments) else {
            return (ty, false);
        };

        let rebuilt = match &ty.kind {
            TypeKind::Collection { shape, .. } => {
                let position = sets.len();
                let (element, is_input) = self.substitute(argument, sets);
                if is_input && shape.is_set() {
                    sets.insert(position, *shape);
                }
                Some((ResolvedType::collection(*shape, element), is_input))
            }
            TypeKind::Named { path, .. } if is_smart_pointer(path) => {
                let (inner, is_input) = self.substitute(argument, sets);
                Some((ResolvedType::named_with(path.clone(), vec![inner]), is_input))
            }
            _ => None
        };

        match rebuilt {
            Some((rebuilt, is_input)) => (rebuilt.with_nullable(ty.nullable), is_input),
            None => (ty, false)
        }
    }

    /// Entity name if the declaration is an entity whose types are derived.
    fn derived_entity<'d>(&self, declaration: Option<&'d DeclarationInfo>) -> Option<&'d QualifiedName> {
        declaration
            .filter(|declaration| declaration.is_entity())
            .filter(|declaration| self.filter.matches(declaration.name.package()))
            .map(|declaration| &declaration.name)
    }
}

/// `Box`, `Rc` or `Arc`, bare or by their standard path.
fn is_smart_pointer(path: &[String]) -> bool {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    matches!(
        segments.as_slice(),
        ["Box" | "Rc" | "Arc"]
            | ["std" | "alloc", "boxed", "Box"]
            | ["std" | "alloc", "rc", "Rc"]
            | ["std" | "alloc", "sync", "Arc"]
    )
}

/// Reference to the generated Input type of `entity`.
#[must_use]
pub fn input_reference(config: &DeriveConfig, entity: &QualifiedName, nullable: bool) -> ResolvedType {
    let mut path = split_path(&config.types_package(entity.package()));
    path.push(config.input_name(entity.name()));
    ResolvedType::named_with(path, Vec::new()).with_nullable(nullable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        derive::testing::StaticHost,
        marker::Marker,
        model::{CollectionShape, Origin}
    };

    fn book() -> EntityDeclaration {
        EntityDeclaration::new(QualifiedName::new("crate::library", "Book"), Origin::new("src/book.rs"))
    }

    fn author_info() -> DeclarationInfo {
        DeclarationInfo {
            name:    QualifiedName::new("crate::library", "Author"),
            markers: [Marker::Entity].into()
        }
    }

    fn entity_handle(nullable: bool) -> TypeHandle {
        TypeHandle {
            ty:          ResolvedType::named("crate::library::Author").with_nullable(nullable),
            declaration: Some(author_info()),
            arguments:   Vec::new()
        }
    }

    fn collection_handle(shape: CollectionShape, nullable: bool) -> TypeHandle {
        let element = entity_handle(false);
        TypeHandle {
            ty:          ResolvedType::collection(shape, element.ty.clone()).with_nullable(nullable),
            declaration: None,
            arguments:   vec![element]
        }
    }

    fn wrapped(path: &str, inner: TypeHandle) -> TypeHandle {
        TypeHandle {
            ty:          ResolvedType::named_with(split_path(path), vec![inner.ty.clone()]),
            declaration: None,
            arguments:   vec![inner]
        }
    }

    fn resolution_with(handle: TypeHandle, filter: &PackageFilter) -> Resolution {
        let config = DeriveConfig::default();
        let host = StaticHost::new(Vec::new()).with_handle("p", handle);
        let property = PropertyDeclaration::new("p", ResolvedType::named("Author"));
        TypeResolver::new(&host, &config, filter).resolution(&book(), &property)
    }

    fn resolve_with(handle: TypeHandle, filter: &PackageFilter) -> ResolvedType {
        resolution_with(handle, filter).ty
    }

    #[test]
    fn entity_reference_becomes_input() {
        let ty = resolve_with(entity_handle(false), &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "crate::library::types::AuthorInput");
        assert!(!ty.nullable);
    }

    #[test]
    fn entity_reference_keeps_nullability() {
        let ty = resolve_with(entity_handle(true), &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "Option<crate::library::types::AuthorInput>");
    }

    #[test]
    fn list_of_entities_keeps_list_shape() {
        let ty = resolve_with(collection_handle(CollectionShape::Vec, false), &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "Vec<crate::library::types::AuthorInput>");
    }

    #[test]
    fn set_of_entities_keeps_set_shape() {
        let ty = resolve_with(collection_handle(CollectionShape::HashSet, true), &PackageFilter::allow_all());
        assert_eq!(
            ty.to_string(),
            "Option<std::collections::HashSet<crate::library::types::AuthorInput>>"
        );
    }

    #[test]
    fn non_entity_is_unchanged() {
        let handle = TypeHandle::opaque(ResolvedType::primitive("String"));
        let ty = resolve_with(handle, &PackageFilter::allow_all());
        assert_eq!(ty, ResolvedType::primitive("String"));
    }

    #[test]
    fn other_generic_is_unchanged() {
        let handle = wrapped("crate::util::Tracked", entity_handle(false));
        let ty = resolve_with(handle, &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "crate::util::Tracked<crate::library::Author>");
    }

    #[test]
    fn boxed_reference_becomes_boxed_input() {
        let mut handle = wrapped("Box", entity_handle(false));
        handle.ty.nullable = true;
        let ty = resolve_with(handle, &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "Option<Box<crate::library::types::AuthorInput>>");
    }

    #[test]
    fn smart_pointers_inside_collections_are_looked_through() {
        let arc = wrapped("std::sync::Arc", entity_handle(false));
        let list = TypeHandle {
            ty:          ResolvedType::collection(CollectionShape::Vec, arc.ty.clone()),
            declaration: None,
            arguments:   vec![arc]
        };
        let ty = resolve_with(list, &PackageFilter::allow_all());
        assert_eq!(ty.to_string(), "Vec<std::sync::Arc<crate::library::types::AuthorInput>>");
    }

    #[test]
    fn sets_of_inputs_are_reported() {
        let resolution = resolution_with(
            collection_handle(CollectionShape::HashSet, false),
            &PackageFilter::allow_all()
        );
        assert_eq!(resolution.entity_sets, vec![CollectionShape::HashSet]);

        let resolution = resolution_with(
            collection_handle(CollectionShape::Vec, false),
            &PackageFilter::allow_all()
        );
        assert!(resolution.entity_sets.is_empty());
    }

    #[test]
    fn set_outside_filter_is_not_reported() {
        let resolution = resolution_with(
            collection_handle(CollectionShape::BTreeSet, false),
            &PackageFilter::new(&["crate::billing"])
        );
        assert!(resolution.entity_sets.is_empty());
        assert_eq!(
            resolution.ty.to_string(),
            "std::collections::BTreeSet<crate::library::Author>"
        );
    }

    #[test]
    fn entity_outside_filter_is_not_substituted() {
        let ty = resolve_with(entity_handle(false), &PackageFilter::new(&["crate::billing"]));
        assert_eq!(ty.to_string(), "crate::library::Author");
    }

    #[test]
    fn host_failure_falls_back_to_declared_type() {
        let config = DeriveConfig::default();
        let filter = PackageFilter::allow_all();
        let host = StaticHost::new(Vec::new());
        let property = PropertyDeclaration::new("p", ResolvedType::named("Missing"));

        let ty = TypeResolver::new(&host, &config, &filter).resolve(&book(), &property);
        assert_eq!(ty, ResolvedType::named("Missing"));
    }

    #[test]
    fn input_reference_uses_configured_names() {
        let config = DeriveConfig {
            input_suffix: "Create".into(),
            namespace: "dto".into(),
            ..DeriveConfig::default()
        };
        let ty = input_reference(&config, &QualifiedName::new("crate::shop", "Order"), false);
        assert_eq!(ty.to_string(), "crate::shop::dto::OrderCreate");
    }
}
