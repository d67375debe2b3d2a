// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Host over Rust source text.
//!
//! [`SourceHost`] parses sources with `syn` and answers the
//! [`EntityHost`] queries from what it recorded, so derivation can run from
//! a build script without a compiler in the loop.
//!
//! # Name Lookup
//!
//! A name in module `M` is looked up in this order:
//!
//! | Step | Written | Found in |
//! |------|---------|----------|
//! | 1 | `crate::a::T`, `self::T`, `super::T` | Declarations and generated types at that path |
//! | 2 | `T` | Declarations and generated types in `M` |
//! | 3 | `T` | `use` items in `M`, globs included |
//! | 4 | `T` | The only declaration or generated type named `T` |
//! | 5 | `T` | Primitives and the prelude |
//! | 6 | `T` | [`SourceHost::with_external_types`] |
//! | 7 | `a::T` | Child module `M::a`, else an import `a`, else an external crate |
//!
//! A name that is not found makes [`EntityHost::resolve_type`] fail and the
//! declaration not fully resolvable. Names become known when a later round
//! registers the generated type through [`EntityHost::observe_generated`].

mod parse;
mod types;

use std::{collections::BTreeSet, fs, path::Path};

use tracing::debug;

pub use self::parse::{Declaration, Import, SourceUnit, parse_unit};
use self::{
    parse::{absolutize, join},
    types::is_prelude
};
use crate::{
    error::HostError,
    host::EntityHost,
    marker::Marker,
    model::{
        DeclarationInfo, DerivedTypeSpec, EntityDeclaration, Origin, PropertyDeclaration,
        QualifiedName, ResolvedType, TypeHandle, TypeKind, split_path
    }
};

/// Where a name led.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// A declaration or generated type known to the host.
    Known(QualifiedName),
    /// A type outside the registered sources, by its full path.
    External(Vec<String>)
}

/// [`EntityHost`] over registered Rust sources.
///
/// # Example
///
/// ```rust,ignore
/// let mut host = SourceHost::new().with_external_types(["uuid::Uuid"]);
/// host.add_file("crate::model", "src/model.rs")?;
/// ```
#[derive(Debug, Default)]
pub struct SourceHost {
    units:     Vec<SourceUnit>,
    external:  BTreeSet<String>,
    generated: BTreeSet<QualifiedName>
}

impl SourceHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names resolvable without a declaration or an import.
    ///
    /// A qualified entry (`uuid::Uuid`) also makes its last segment
    /// resolvable and is used as its full path.
    #[must_use]
    pub fn with_external_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.external
            .extend(names.into_iter().map(|name| name.into().replace('.', "::")));
        self
    }

    /// Register `text` as the contents of module `package`.
    ///
    /// Registering an origin again replaces what it declared before.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the text does not parse or carries malformed
    /// attributes. Nothing is registered in that case.
    pub fn add_source(
        &mut self,
        package: &str,
        origin: impl Into<String>,
        text: &str
    ) -> Result<(), HostError> {
        let unit = parse_unit(package, Origin::new(origin), text)?;
        debug!(
            origin = %unit.origin,
            package,
            declarations = unit.declarations.len(),
            "source registered"
        );

        match self.units.iter_mut().find(|existing| existing.origin == unit.origin) {
            Some(existing) => *existing = unit,
            None => self.units.push(unit)
        }
        Ok(())
    }

    /// Read a file and register it as module `package`.
    ///
    /// The file path becomes the origin of its declarations.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Read`] if the file cannot be read, otherwise as
    /// [`add_source`](Self::add_source).
    pub fn add_file(&mut self, package: &str, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HostError::Read {
            path: path.to_path_buf(),
            source
        })?;
        self.add_source(package, path.display().to_string(), &text)
    }

    /// Forget a source unit. Returns whether it was registered.
    pub fn remove_source(&mut self, origin: &Origin) -> bool {
        let before = self.units.len();
        self.units.retain(|unit| &unit.origin != origin);
        self.units.len() != before
    }

    /// Registered source units, in registration order.
    #[must_use]
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// Generated types observed so far.
    pub fn generated(&self) -> impl Iterator<Item = &QualifiedName> {
        self.generated.iter()
    }

    fn declarations(&self) -> impl Iterator<Item = (&SourceUnit, &Declaration)> {
        self.units
            .iter()
            .flat_map(|unit| unit.declarations.iter().map(move |declaration| (unit, declaration)))
    }

    fn imports<'a>(&'a self, module: &str) -> impl Iterator<Item = &'a Import> + use<'a> {
        let module = module.to_string();
        self.units
            .iter()
            .flat_map(|unit| &unit.imports)
            .filter(move |import| import.module() == module)
    }

    fn is_known(&self, name: &QualifiedName) -> bool {
        self.generated.contains(name)
            || self
                .declarations()
                .any(|(_, declaration)| &declaration.name == name)
    }

    fn is_module(&self, module: &str) -> bool {
        let nested = format!("{module}::");
        self.units
            .iter()
            .flat_map(|unit| &unit.modules)
            .map(String::as_str)
            .chain(self.generated.iter().map(QualifiedName::package))
            .any(|known| known == module || known.starts_with(&nested))
    }

    fn info(&self, name: &QualifiedName) -> DeclarationInfo {
        let markers = self
            .declarations()
            .find(|(_, declaration)| &declaration.name == name)
            .map(|(_, declaration)| declaration.markers.clone())
            .unwrap_or_default();
        DeclarationInfo {
            name: name.clone(),
            markers
        }
    }

    fn lookup(&self, module: &str, path: &[String]) -> Option<Target> {
        let (last, prefix) = path.split_last()?;
        match prefix.first().map(String::as_str) {
            None => self.lookup_name(module, last),
            Some("crate" | "self" | "super") => {
                let absolute = absolutize(module, prefix)?;
                let name = QualifiedName::new(absolute.join("::"), last.clone());
                self.is_known(&name).then_some(Target::Known(name))
            }
            Some(first) => {
                let local = QualifiedName::new(join(module, &prefix.join("::")), last.clone());
                if self.is_known(&local) {
                    return Some(Target::Known(local));
                }
                if let Some(imported) = self.import_named(module, first) {
                    let mut expanded = imported.to_vec();
                    expanded.extend(path[1..].iter().cloned());
                    return self.lookup_path(module, &expanded);
                }
                if self.is_module(&join(module, first)) {
                    return None;
                }
                Some(Target::External(path.to_vec()))
            }
        }
    }

    fn lookup_name(&self, module: &str, name: &str) -> Option<Target> {
        let local = QualifiedName::new(module, name);
        if self.is_known(&local) {
            return Some(Target::Known(local));
        }

        if let Some(path) = self.import_named(module, name) {
            return self.lookup_path(module, path);
        }

        for import in self.imports(module) {
            if let Import::Glob { path, .. } = import {
                let candidate = QualifiedName::new(path.join("::"), name);
                if self.is_known(&candidate) {
                    return Some(Target::Known(candidate));
                }
            }
        }

        let mut same_name = self
            .declarations()
            .map(|(_, declaration)| &declaration.name)
            .chain(&self.generated)
            .filter(|candidate| candidate.name() == name);
        if let (Some(unique), None) = (same_name.next(), same_name.next()) {
            return Some(Target::Known(unique.clone()));
        }

        if is_prelude(name) {
            return Some(Target::External(vec![name.to_string()]));
        }

        self.external
            .iter()
            .find(|external| split_path(external).last().is_some_and(|last| last == name))
            .map(|external| Target::External(split_path(external)))
    }

    /// Lookup of an imported, already absolutized path.
    fn lookup_path(&self, module: &str, path: &[String]) -> Option<Target> {
        let (last, prefix) = path.split_last()?;
        if prefix.first().is_some_and(|first| first == "crate") {
            let name = QualifiedName::new(prefix.join("::"), last.clone());
            return self.is_known(&name).then_some(Target::Known(name));
        }

        // `use child::T;` names a child module before an external crate
        let local = QualifiedName::new(join(module, &prefix.join("::")), last.clone());
        if self.is_known(&local) {
            return Some(Target::Known(local));
        }
        if prefix
            .first()
            .is_some_and(|first| self.is_module(&join(module, first)))
        {
            return None;
        }
        Some(Target::External(path.to_vec()))
    }

    fn import_named(&self, module: &str, alias: &str) -> Option<&[String]> {
        self.imports(module).find_map(|import| match import {
            Import::Name {
                alias: name, path, ..
            } if name == alias => Some(path.as_slice()),
            _ => None
        })
    }

    /// Qualify every name in `ty`, as seen from `module`.
    fn handle(&self, module: &str, ty: &ResolvedType) -> Result<TypeHandle, HostError> {
        match &ty.kind {
            TypeKind::Primitive(_) | TypeKind::Verbatim(_) => Ok(TypeHandle::opaque(ty.clone())),
            TypeKind::Collection { shape, element } => {
                let element = self.handle(module, element)?;
                Ok(TypeHandle {
                    ty:          ResolvedType::collection(*shape, element.ty.clone())
                        .with_nullable(ty.nullable),
                    declaration: None,
                    arguments:   vec![element]
                })
            }
            TypeKind::Named { path, args } => {
                let target = self.lookup(module, path).ok_or_else(|| HostError::Unresolved {
                    name: path.join("::")
                })?;
                let arguments = args
                    .iter()
                    .map(|arg| self.handle(module, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let resolved_args = arguments.iter().map(|arg| arg.ty.clone()).collect();

                let (path, declaration) = match target {
                    Target::Known(name) => (name.segments(), Some(self.info(&name))),
                    Target::External(path) => (path, None)
                };
                Ok(TypeHandle {
                    ty: ResolvedType::named_with(path, resolved_args).with_nullable(ty.nullable),
                    declaration,
                    arguments
                })
            }
        }
    }
}

impl EntityHost for SourceHost {
    fn declarations_with_marker(
        &self,
        marker: Marker
    ) -> Result<Vec<EntityDeclaration>, HostError> {
        Ok(self
            .declarations()
            .filter(|(_, declaration)| declaration.has_marker(marker))
            .map(|(unit, declaration)| declaration.to_entity(&unit.origin))
            .collect())
    }

    fn resolve_type(
        &self,
        entity: &EntityDeclaration,
        property: &PropertyDeclaration
    ) -> Result<TypeHandle, HostError> {
        self.handle(entity.package(), &property.declared)
    }

    fn is_fully_resolvable(&self, entity: &EntityDeclaration) -> bool {
        entity.properties.iter().all(|property| {
            let resolved = self.handle(entity.package(), &property.declared);
            if let Err(err) = &resolved {
                debug!(entity = %entity.name, property = %property.name, error = %err, "unresolved");
            }
            resolved.is_ok()
        })
    }

    fn observe_generated(&mut self, spec: &DerivedTypeSpec) -> bool {
        let name = spec.qualified_name();
        let learned = !self.is_known(&name);
        if learned {
            debug!(generated = %name, "generated type registered");
            self.generated.insert(name);
        }
        learned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CollectionShape, TypeRole};

    const LIBRARY: &str = r#"
        use chrono::{DateTime, Utc};
        use super::people::Person;

        /// Book in the catalogue.
        #[entity]
        pub struct Book {
            #[id]
            pub id: i64,
            pub title: String,
            pub author: Author,
            pub co_authors: Vec<Author>,
            pub editor: Option<Person>,
            pub published: Option<DateTime<Utc>>
        }

        #[derive(Debug, Entity)]
        pub struct Author {
            pub name: String,
            pub books: std::collections::HashSet<Book>
        }

        pub enum Genre { Fiction }
    "#;

    const PEOPLE: &str = "pub struct Person { pub name: String }";

    fn host() -> SourceHost {
        let mut host = SourceHost::new();
        host.add_source("crate::library", "src/library.rs", LIBRARY).unwrap();
        host.add_source("crate::people", "src/people.rs", PEOPLE).unwrap();
        host
    }

    fn entity(host: &SourceHost, name: &str) -> EntityDeclaration {
        host.declarations_with_marker(Marker::Entity)
            .unwrap()
            .into_iter()
            .find(|entity| entity.simple_name() == name)
            .unwrap()
    }

    fn resolve(host: &SourceHost, entity_name: &str, property: &str) -> TypeHandle {
        let entity = entity(host, entity_name);
        let property = entity
            .properties
            .iter()
            .find(|p| p.name == property)
            .unwrap()
            .clone();
        host.resolve_type(&entity, &property).unwrap()
    }

    #[test]
    fn discovers_entities_in_order() {
        let names: Vec<_> = host()
            .declarations_with_marker(Marker::Entity)
            .unwrap()
            .into_iter()
            .map(|entity| entity.name.to_string())
            .collect();
        assert_eq!(names, vec!["crate::library::Book", "crate::library::Author"]);
    }

    #[test]
    fn entity_carries_origin_and_doc() {
        let book = entity(&host(), "Book");
        assert_eq!(book.origin.as_str(), "src/library.rs");
        assert_eq!(book.doc.as_deref(), Some("Book in the catalogue."));
    }

    #[test]
    fn local_entity_reference() {
        let handle = resolve(&host(), "Book", "author");
        assert_eq!(handle.ty.to_string(), "crate::library::Author");
        assert!(handle.declaration.unwrap().is_entity());
    }

    #[test]
    fn collection_argument_handles() {
        let handle = resolve(&host(), "Book", "co_authors");
        assert!(matches!(handle.ty.kind, TypeKind::Collection {
            shape: CollectionShape::Vec,
            ..
        }));
        assert_eq!(handle.arguments.len(), 1);
        assert!(handle.arguments[0].declaration.as_ref().unwrap().is_entity());
    }

    #[test]
    fn imported_non_entity() {
        let handle = resolve(&host(), "Book", "editor");
        assert_eq!(handle.ty.to_string(), "Option<crate::people::Person>");
        assert!(!handle.declaration.unwrap().is_entity());
    }

    #[test]
    fn import_lookup_borrows_only_the_host() {
        let host = host();
        let path = {
            let module = ["crate", "library"].join("::");
            host.import_named(&module, "Person")
        };
        assert_eq!(path, Some(["crate", "people", "Person"].map(String::from).as_slice()));
    }

    #[test]
    fn imported_external_types_are_qualified() {
        let handle = resolve(&host(), "Book", "published");
        assert_eq!(handle.ty.to_string(), "Option<chrono::DateTime<chrono::Utc>>");
        assert!(handle.declaration.is_none());
    }

    #[test]
    fn qualified_collection_path() {
        let handle = resolve(&host(), "Author", "books");
        assert_eq!(handle.arguments[0].ty.to_string(), "crate::library::Book");
    }

    #[test]
    fn unknown_name_is_unresolvable() {
        let mut host = host();
        host.add_source("crate::shop", "src/shop.rs", "#[entity] struct Order { item: Item }")
            .unwrap();
        let order = entity(&host, "Order");

        assert!(!host.is_fully_resolvable(&order));
        assert!(host.resolve_type(&order, &order.properties[0]).is_err());
        assert!(host.is_fully_resolvable(&entity(&host, "Book")));
    }

    #[test]
    fn external_types_resolve() {
        let mut host = SourceHost::new().with_external_types(["uuid::Uuid"]);
        host.add_source("crate", "src/lib.rs", "#[entity] struct Key { value: Uuid }")
            .unwrap();
        let key = entity(&host, "Key");

        assert!(host.is_fully_resolvable(&key));
        assert_eq!(host.resolve_type(&key, &key.properties[0]).unwrap().ty.to_string(), "uuid::Uuid");
    }

    #[test]
    fn crate_paths_must_exist() {
        let mut host = host();
        host.add_source(
            "crate::shop",
            "src/shop.rs",
            "#[entity] struct Order { book: crate::library::Book, other: crate::library::Missing }"
        )
        .unwrap();
        let order = entity(&host, "Order");

        assert!(host.resolve_type(&order, &order.properties[0]).is_ok());
        assert!(host.resolve_type(&order, &order.properties[1]).is_err());
    }

    #[test]
    fn observed_types_become_resolvable() {
        let mut host = host();
        host.add_source("crate::library", "src/draft.rs", "#[entity] struct Draft { base: BookInput }")
            .unwrap();
        let draft = entity(&host, "Draft");
        assert!(!host.is_fully_resolvable(&draft));

        let spec = DerivedTypeSpec {
            name:    "BookInput".into(),
            package: "crate::library::types".into(),
            role:    TypeRole::Input,
            source:  QualifiedName::new("crate::library", "Book"),
            doc:     None,
            fields:  Vec::new()
        };
        assert!(host.observe_generated(&spec));
        assert!(!host.observe_generated(&spec));
        assert!(host.is_fully_resolvable(&draft));
        assert_eq!(
            host.resolve_type(&draft, &draft.properties[0]).unwrap().ty.to_string(),
            "crate::library::types::BookInput"
        );
    }

    #[test]
    fn re_adding_origin_replaces_unit() {
        let mut host = host();
        host.add_source("crate::library", "src/library.rs", "#[entity] struct Only { x: u8 }")
            .unwrap();
        let names: Vec<_> = host
            .declarations_with_marker(Marker::Entity)
            .unwrap()
            .into_iter()
            .map(|entity| entity.simple_name().to_string())
            .collect();
        assert_eq!(names, vec!["Only"]);
    }

    #[test]
    fn remove_source_forgets_declarations() {
        let mut host = host();
        assert!(host.remove_source(&Origin::new("src/library.rs")));
        assert!(!host.remove_source(&Origin::new("src/library.rs")));
        assert!(host.declarations_with_marker(Marker::Entity).unwrap().is_empty());
    }

    #[test]
    fn child_module_paths() {
        let mut host = SourceHost::new();
        host.add_source(
            "crate",
            "src/lib.rs",
            r#"
            mod model {
                pub struct Tag { pub label: String }
            }
            #[entity]
            struct Post { tag: model::Tag, missing: model::Nope, ext: serde_json::Value }
        "#
        )
        .unwrap();
        let post = entity(&host, "Post");

        let tag = host.resolve_type(&post, &post.properties[0]).unwrap();
        assert_eq!(tag.ty.to_string(), "crate::model::Tag");
        assert!(host.resolve_type(&post, &post.properties[1]).is_err());
        assert_eq!(
            host.resolve_type(&post, &post.properties[2]).unwrap().ty.to_string(),
            "serde_json::Value"
        );
    }

    #[test]
    fn add_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.rs");
        fs::write(&path, "#[entity] struct Note { text: String }").unwrap();

        let mut host = SourceHost::new();
        host.add_file("crate::model", &path).unwrap();
        assert_eq!(entity(&host, "Note").origin.as_str(), path.display().to_string());

        let err = host.add_file("crate::model", dir.path().join("missing.rs")).unwrap_err();
        assert!(matches!(err, HostError::Read { .. }));
    }
}
