// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Rust source rendering of derived type specs.
//!
//! # Generated Code
//!
//! ```rust,ignore
//! // @generated by entity-types. Do not edit.
//! // Source: crate::model::Dummy (src/model.rs)
//!
//! /// Partial update for `crate::model::Dummy`.
//! #[derive(Debug, Clone, Default)]
//! pub struct DummyUpdate {
//!     pub name: Option<String>,
//! }
//! ```
//!
//! `Default` is added when every field defaults to `None`, and a
//! `Deserialize` derive gets `#[serde(default)]` on those fields, so an
//! omitted field reads as null.
//!
//! # Sets of Generated Types
//!
//! Every generated type carries the same derive list, so a derive on a type
//! holding a set of Input types holds only if the set supports it for
//! elements with that list:
//!
//! | Set | Derive | Holds |
//! |-----|--------|-------|
//! | `HashSet` | `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`, `Deserialize` | never |
//! | `BTreeSet` | `Deserialize` | when `Ord` is configured |
//! | either | anything else | always |
//!
//! `HashSet` equality needs `Hash` on the element, and the holder would then
//! derive `Hash` too, which `HashSet` does not implement. A derive that does
//! not hold is reported as [`DeriveError::UnsupportedSetDerive`].

use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, Path, Type};

use crate::{
    error::DeriveError,
    model::{CollectionShape, DerivedField, DerivedTypeSpec, Origin, TypeRole},
    writer::GeneratedFile
};

/// Header written above every generated type.
pub const HEADER: &str = "// @generated by entity-types. Do not edit.";

/// Render `spec` into a file attributed to `origin`.
///
/// # Errors
///
/// Returns [`DeriveError`] if the type name, a field name or a field type
/// does not form valid Rust.
pub fn render(
    spec: &DerivedTypeSpec,
    derives: &[Path],
    origin: &Origin
) -> Result<GeneratedFile, DeriveError> {
    let tokens = render_tokens(spec, derives)?;
    let contents = format!(
        "{HEADER}\n// Source: {} ({origin})\n\n{tokens}\n",
        spec.source
    );

    Ok(GeneratedFile {
        package: spec.package.clone(),
        type_name: spec.name.clone(),
        file_name: format!("{}.rs", spec.name.to_case(Case::Snake)),
        contents,
        source: spec.source.clone(),
        origin: origin.clone()
    })
}

/// Struct definition tokens for `spec`.
///
/// # Errors
///
/// See [`render`].
pub fn render_tokens(spec: &DerivedTypeSpec, derives: &[Path]) -> Result<TokenStream, DeriveError> {
    let name: Ident = syn::parse_str(&spec.name).map_err(|_| DeriveError::InvalidTypeName {
        name: spec.name.clone()
    })?;

    check_set_derives(spec, derives)?;

    let deserializes = derives.iter().any(|path| is_named(path, "Deserialize"));
    let field_defs = spec
        .fields
        .iter()
        .map(|field| render_field(spec, field, deserializes))
        .collect::<Result<Vec<_>, _>>()?;

    let all_default = !spec.fields.is_empty() && spec.fields.iter().all(|field| field.has_default);
    let default_path: Path = syn::parse_quote!(Default);
    let mut derives: Vec<&Path> = derives.iter().collect();
    if all_default && !derives.iter().any(|path| is_named(path, "Default")) {
        derives.push(&default_path);
    }
    let derive_attr = if derives.is_empty() {
        TokenStream::new()
    } else {
        quote! { #[derive(#(#derives),*)] }
    };

    let mut docs = vec![match spec.role {
        TypeRole::Input => format!(" Create input for `{}`.", spec.source),
        TypeRole::Update => format!(" Partial update for `{}`.", spec.source)
    }];
    if let Some(doc) = &spec.doc {
        docs.push(String::new());
        docs.push(format!(" {doc}"));
    }

    Ok(quote! {
        #(#[doc = #docs])*
        #derive_attr
        pub struct #name {
            #(#field_defs),*
        }
    })
}

fn render_field(
    spec: &DerivedTypeSpec,
    field: &DerivedField,
    deserializes: bool
) -> Result<TokenStream, DeriveError> {
    let name: Ident = syn::parse_str(&field.name).map_err(|_| DeriveError::InvalidFieldName {
        entity:   spec.source.clone(),
        property: field.name.clone()
    })?;

    let rendered = field.ty.to_string();
    let ty: Type = syn::parse_str(&rendered).map_err(|err| DeriveError::InvalidType {
        entity:   spec.source.clone(),
        property: field.name.clone(),
        ty:       rendered.clone(),
        message:  err.to_string()
    })?;

    let docs: Vec<String> = field
        .doc
        .iter()
        .flat_map(|doc| doc.lines())
        .map(|line| format!(" {line}"))
        .collect();
    let serde_default = if field.has_default && deserializes {
        quote! { #[serde(default)] }
    } else {
        TokenStream::new()
    };

    Ok(quote! {
        #(#[doc = #docs])*
        #serde_default
        pub #name: #ty
    })
}

fn check_set_derives(spec: &DerivedTypeSpec, derives: &[Path]) -> Result<(), DeriveError> {
    let configured = |name: &str| derives.iter().any(|path| is_named(path, name));

    for field in &spec.fields {
        for &shape in &field.entity_sets {
            for derive in derives {
                let Some(segment) = derive.segments.last() else {
                    continue;
                };
                let name = segment.ident.to_string();
                let holds = match (shape, name.as_str()) {
                    (
                        CollectionShape::HashSet,
                        "PartialEq" | "Eq" | "Hash" | "PartialOrd" | "Ord" | "Deserialize"
                    ) => false,
                    (CollectionShape::BTreeSet, "Deserialize") => configured("Ord"),
                    _ => true
                };
                if !holds {
                    return Err(DeriveError::UnsupportedSetDerive {
                        entity:     spec.source.clone(),
                        property:   field.name.clone(),
                        collection: shape.path().to_string(),
                        derive:     name
                    });
                }
            }
        }
    }
    Ok(())
}

fn is_named(path: &Path, ident: &str) -> bool {
    path.segments.last().is_some_and(|segment| segment.ident == ident)
}
