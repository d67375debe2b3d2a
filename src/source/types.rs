// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Syntactic conversion of `syn` types.
//!
//! | Written | Converted |
//! |---------|-----------|
//! | `Option<T>` | `T`, nullable |
//! | `i64`, `String`, ... | [`TypeKind::Primitive`](crate::model::TypeKind::Primitive) |
//! | `Vec<T>`, `HashSet<T>`, ... | [`TypeKind::Collection`](crate::model::TypeKind::Collection) |
//! | `Author`, `chrono::DateTime<Utc>` | [`TypeKind::Named`](crate::model::TypeKind::Named), path as written |
//! | `&str`, `(A, B)`, `[u8; 4]`, `fn()` | [`TypeKind::Verbatim`](crate::model::TypeKind::Verbatim) |
//!
//! Names are not resolved here; see [`SourceHost`](super::SourceHost).

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type, TypePath};

use crate::model::{CollectionShape, ResolvedType};

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64"
];

const PRELUDE: &[&str] = &["Box", "Option", "Result", "String", "Vec"];

/// Built-in scalar type name.
#[must_use]
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Name usable without an import.
#[must_use]
pub fn is_prelude(name: &str) -> bool {
    is_primitive(name) || PRELUDE.contains(&name)
}

/// Convert a field type. `Self` is replaced by `self_name`.
#[must_use]
pub fn convert(ty: &Type, self_name: &str) -> ResolvedType {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            convert_path(path, self_name).unwrap_or_else(|| verbatim(ty))
        }
        Type::Group(group) => convert(&group.elem, self_name),
        Type::Paren(paren) => convert(&paren.elem, self_name),
        _ => verbatim(ty)
    }
}

fn verbatim(ty: &Type) -> ResolvedType {
    ResolvedType::verbatim(ty.to_token_stream().to_string())
}

fn convert_path(path: &TypePath, self_name: &str) -> Option<ResolvedType> {
    let segments = &path.path.segments;
    let last = segments.last()?;
    // only the last segment may carry arguments
    if segments
        .iter()
        .take(segments.len() - 1)
        .any(|segment| !segment.arguments.is_none())
    {
        return None;
    }

    let args = match &last.arguments {
        PathArguments::None => Vec::new(),
        PathArguments::AngleBracketed(generic) => generic
            .args
            .iter()
            .map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None
            })
            .collect::<Option<Vec<_>>>()?,
        PathArguments::Parenthesized(_) => return None
    };

    let name = last.ident.to_string();

    if name == "Option"
        && let [inner] = args.as_slice()
    {
        let converted = convert(inner, self_name);
        // Option<Option<T>> keeps the inner Option as written
        return Some(if converted.nullable {
            verbatim(inner).widened()
        } else {
            converted.widened()
        });
    }

    let single = path.path.segments.len() == 1;
    if single && args.is_empty() && is_primitive(&name) {
        return Some(ResolvedType::primitive(name));
    }

    if let Some(shape) = CollectionShape::from_ident(&name)
        && let [element] = args.as_slice()
    {
        return Some(ResolvedType::collection(shape, convert(element, self_name)));
    }

    let segments = if single && name == "Self" {
        vec![self_name.to_string()]
    } else {
        path.path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect()
    };
    let args = args.into_iter().map(|arg| convert(arg, self_name)).collect();

    Some(ResolvedType::named_with(segments, args))
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::model::TypeKind;

    fn convert_str(ty: &str) -> ResolvedType {
        convert(&syn::parse_str(ty).unwrap(), "Node")
    }

    #[test]
    fn option_is_nullable() {
        let ty = convert(&parse_quote!(Option<String>), "Node");
        assert_eq!(ty, ResolvedType::primitive("String").widened());
    }

    #[test]
    fn nested_option_keeps_inner() {
        let ty = convert_str("Option<Option<u8>>");
        assert!(ty.nullable);
        assert!(matches!(ty.kind, TypeKind::Verbatim(_)));
        assert!(syn::parse_str::<Type>(&ty.to_string()).is_ok());
    }

    #[test]
    fn primitives() {
        assert_eq!(convert_str("i64"), ResolvedType::primitive("i64"));
        assert_eq!(convert_str("bool"), ResolvedType::primitive("bool"));
    }

    #[test]
    fn qualified_primitive_name_is_named() {
        assert_eq!(convert_str("std::string::String").to_string(), "std::string::String");
    }

    #[test]
    fn collections() {
        let ty = convert_str("Vec<Author>");
        assert_eq!(ty, ResolvedType::collection(CollectionShape::Vec, ResolvedType::named("Author")));

        let ty = convert_str("std::collections::BTreeSet<Option<Tag>>");
        let TypeKind::Collection { shape, element } = ty.kind else {
            panic!("expected collection");
        };
        assert_eq!(shape, CollectionShape::BTreeSet);
        assert!(element.nullable);
    }

    #[test]
    fn maps_are_named() {
        let ty = convert_str("HashMap<String, Author>");
        assert_eq!(ty.head_path(), Some(["HashMap".to_string()].as_slice()));
        assert_eq!(ty.to_string(), "HashMap<String, Author>");
    }

    #[test]
    fn self_is_replaced() {
        assert_eq!(convert_str("Option<Box<Self>>").to_string(), "Option<Box<Node>>");
        assert_eq!(convert_str("Vec<Self>").to_string(), "Vec<Node>");
    }

    #[test]
    fn other_syntax_is_verbatim() {
        for ty in ["&'static str", "(u8, u8)", "[u8; 4]", "fn(u8) -> u8", "<T as Trait>::Out"] {
            let converted = convert_str(ty);
            assert!(matches!(converted.kind, TypeKind::Verbatim(_)), "{ty}");
        }
    }

    #[test]
    fn lifetime_arguments_are_verbatim() {
        assert!(matches!(convert_str("Cow<'static, str>").kind, TypeKind::Verbatim(_)));
    }

    #[test]
    fn prelude_names() {
        assert!(is_prelude("Vec"));
        assert!(is_prelude("u32"));
        assert!(!is_prelude("HashMap"));
    }
}
