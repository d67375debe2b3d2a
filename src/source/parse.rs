// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Source unit parsing.
//!
//! Walks a parsed file and its inline modules, recording what the host
//! needs for discovery and name lookup.
//!
//! # Recognised Syntax
//!
//! ```rust,ignore
//! use chrono::{DateTime, Utc};          // import: DateTime, Utc
//!
//! /// Book in the catalogue.
//! #[derive(Debug, Entity)]              // entity marker (derive list)
//! pub struct Book {
//!     #[id]                             // excluded marker
//!     pub id: i64,
//!
//!     pub title: String,                // editable
//!
//!     #[field(readonly)]                // immutable
//!     pub isbn: String,
//!
//!     pub published: Option<DateTime<Utc>>
//! }
//!
//! #[entity(table = "authors")]          // entity marker, arguments ignored
//! pub struct Author { .. }
//! ```

use std::collections::BTreeSet;

use darling::FromField;
use syn::{Attribute, Field, Fields, Item, Path, Token, UseTree, punctuated::Punctuated};

use super::types::convert;
use crate::{
    error::HostError,
    marker::Marker,
    model::{EntityDeclaration, Origin, PropertyDeclaration, QualifiedName, split_path},
    utils::docs::{extract_doc_comments, extract_doc_summary}
};

/// Options from `#[field(..)]`.
///
/// | Option | Effect |
/// |--------|--------|
/// | `readonly` | Property cannot be written after construction |
/// | `skip` | Property is left out of derived types |
#[derive(Debug, Default, FromField)]
#[darling(attributes(field))]
struct FieldOptions {
    #[darling(default)]
    readonly: bool,

    #[darling(default)]
    skip: bool
}

impl FieldOptions {
    fn is_mutable(&self) -> bool {
        !(self.readonly || self.skip)
    }
}

/// A type declared in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name:       QualifiedName,
    pub markers:    BTreeSet<Marker>,
    pub doc:        Option<String>,
    /// Named fields; empty for enums, aliases and tuple or unit structs.
    pub properties: Vec<PropertyDeclaration>
}

impl Declaration {
    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// Declaration as seen by the derivation.
    #[must_use]
    pub fn to_entity(&self, origin: &Origin) -> EntityDeclaration {
        EntityDeclaration {
            name:       self.name.clone(),
            properties: self.properties.clone(),
            origin:     origin.clone(),
            doc:        self.doc.clone()
        }
    }
}

/// A `use` item, path made absolute where the syntax allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `use a::b::C;` or `use a::b::C as D;`
    Name {
        module: String,
        alias:  String,
        path:   Vec<String>
    },
    /// `use a::b::*;`
    Glob { module: String, path: Vec<String> }
}

impl Import {
    /// Module the `use` item appears in.
    #[must_use]
    pub fn module(&self) -> &str {
        match self {
            Self::Name { module, .. } | Self::Glob { module, .. } => module
        }
    }
}

/// Everything recorded from one source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub origin:       Origin,
    pub package:      String,
    /// Declarations in source order, inline modules included.
    pub declarations: Vec<Declaration>,
    pub imports:      Vec<Import>,
    /// The unit's package and every inline module below it.
    pub modules:      Vec<String>
}

/// Parse `text` as the contents of module `package`.
///
/// # Errors
///
/// Returns [`HostError::Parse`] for invalid Rust and
/// [`HostError::Attribute`] for malformed `#[field]` or `#[derive]`
/// attributes.
pub fn parse_unit(package: &str, origin: Origin, text: &str) -> Result<SourceUnit, HostError> {
    let file = syn::parse_file(text).map_err(|err| HostError::Parse {
        origin:  origin.to_string(),
        message: err.to_string()
    })?;

    let mut unit = SourceUnit {
        origin,
        package: package.to_string(),
        declarations: Vec::new(),
        imports: Vec::new(),
        modules: vec![package.to_string()]
    };
    collect(&mut unit, package, &file.items)?;
    Ok(unit)
}

fn collect(unit: &mut SourceUnit, module: &str, items: &[Item]) -> Result<(), HostError> {
    for item in items {
        match item {
            Item::Struct(item) => {
                let properties = match &item.fields {
                    Fields::Named(named) => named
                        .named
                        .iter()
                        .filter_map(|field| {
                            field
                                .ident
                                .as_ref()
                                .map(|ident| parse_field(&unit.origin, &item.ident, ident, field))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    Fields::Unnamed(_) | Fields::Unit => Vec::new()
                };
                let declaration = declaration(&unit.origin, module, &item.ident, &item.attrs)?;
                unit.declarations.push(Declaration {
                    properties,
                    ..declaration
                });
            }
            Item::Enum(item) => {
                let declaration = declaration(&unit.origin, module, &item.ident, &item.attrs)?;
                unit.declarations.push(declaration);
            }
            Item::Type(item) => {
                let declaration = declaration(&unit.origin, module, &item.ident, &item.attrs)?;
                unit.declarations.push(declaration);
            }
            Item::Use(item) => collect_use(&mut unit.imports, module, Vec::new(), &item.tree),
            Item::Mod(item) => {
                if let Some((_, items)) = &item.content {
                    let child = join(module, &item.ident.to_string());
                    unit.modules.push(child.clone());
                    collect(unit, &child, items)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn declaration(
    origin: &Origin,
    module: &str,
    ident: &syn::Ident,
    attrs: &[Attribute]
) -> Result<Declaration, HostError> {
    Ok(Declaration {
        name:       QualifiedName::new(module, ident.to_string()),
        markers:    declaration_markers(origin, attrs)?,
        doc:        extract_doc_summary(attrs),
        properties: Vec::new()
    })
}

/// Markers on a type: marker attributes and `Entity` in derive lists.
fn declaration_markers(origin: &Origin, attrs: &[Attribute]) -> Result<BTreeSet<Marker>, HostError> {
    let mut markers: BTreeSet<Marker> = attrs
        .iter()
        .filter_map(|attr| Marker::from_path(attr.path()))
        .collect();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let derives = attr
            .parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
            .map_err(|err| HostError::Attribute {
                origin:  origin.to_string(),
                message: err.to_string()
            })?;
        if derives
            .iter()
            .any(|path| Marker::from_path(path) == Some(Marker::Entity))
        {
            markers.insert(Marker::Entity);
        }
    }

    Ok(markers)
}

fn parse_field(
    origin: &Origin,
    owner: &syn::Ident,
    ident: &syn::Ident,
    field: &Field
) -> Result<PropertyDeclaration, HostError> {
    let options = FieldOptions::from_field(field).map_err(|err| HostError::Attribute {
        origin:  origin.to_string(),
        message: format!("{owner}.{ident}: {err}")
    })?;

    let markers = field
        .attrs
        .iter()
        .filter_map(|attr| Marker::from_path(attr.path()))
        .filter(|marker| *marker != Marker::Entity)
        .collect();

    Ok(PropertyDeclaration {
        name: ident.to_string(),
        declared: convert(&field.ty, &owner.to_string()),
        mutable: options.is_mutable(),
        markers,
        doc: extract_doc_comments(&field.attrs)
    })
}

fn collect_use(imports: &mut Vec<Import>, module: &str, mut prefix: Vec<String>, tree: &UseTree) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use(imports, module, prefix, &path.tree);
        }
        UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                if let Some(alias) = prefix.last().cloned() {
                    push_name(imports, module, alias, &prefix);
                }
            } else {
                prefix.push(ident.clone());
                push_name(imports, module, ident, &prefix);
            }
        }
        UseTree::Rename(rename) => {
            prefix.push(rename.ident.to_string());
            let alias = rename.rename.to_string();
            if alias != "_" {
                push_name(imports, module, alias, &prefix);
            }
        }
        UseTree::Glob(_) => {
            if let Some(path) = absolutize(module, &prefix) {
                imports.push(Import::Glob {
                    module: module.to_string(),
                    path
                });
            }
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_use(imports, module, prefix.clone(), tree);
            }
        }
    }
}

fn push_name(imports: &mut Vec<Import>, module: &str, alias: String, path: &[String]) {
    if let Some(path) = absolutize(module, path) {
        imports.push(Import::Name {
            module: module.to_string(),
            alias,
            path
        });
    }
}

/// Resolve leading `self` and `super` against `module`.
///
/// Paths starting with `crate` or any other name are returned unchanged.
/// Returns `None` when `super` climbs above the root.
#[must_use]
pub fn absolutize(module: &str, path: &[String]) -> Option<Vec<String>> {
    match path.first().map(String::as_str) {
        Some("self") => {
            let mut absolute = split_path(module);
            absolute.extend(path[1..].iter().cloned());
            Some(absolute)
        }
        Some("super") => {
            let mut absolute = split_path(module);
            let mut rest = path;
            while let Some((first, tail)) = rest.split_first()
                && first == "super"
            {
                absolute.pop()?;
                rest = tail;
            }
            absolute.extend(rest.iter().cloned());
            Some(absolute)
        }
        _ => Some(path.to_vec())
    }
}

/// `module::name`, or `name` at the root.
#[must_use]
pub fn join(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{module}::{name}")
    }
}
