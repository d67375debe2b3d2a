// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Persistence marker vocabulary.
//!
//! The derivation only understands three markers. Everything else attached
//! to a declaration is ignored, so a field carrying `#[column(..)]` or
//! `#[serde(..)]` is still editable.
//!
//! | Marker | Short names | Effect |
//! |--------|-------------|--------|
//! | [`Marker::Entity`] | `entity`, `Entity` | Declaration is derived |
//! | [`Marker::Id`] | `id`, `Id`, `generated_value`, `GeneratedValue` | Property excluded |
//! | [`Marker::Version`] | `version`, `Version` | Property excluded |
//!
//! Qualified spellings are accepted when the namespace is a known
//! persistence namespace (`entity_types::id`, `jakarta.persistence.Id`).

use std::fmt;

/// Namespaces whose qualified marker names are recognised.
const NAMESPACES: &[&str] = &["entity_types", "jakarta::persistence", "javax::persistence"];

/// Closed set of persistence markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    /// Persistent domain type eligible for derivation.
    Entity,
    /// Primary key property.
    Id,
    /// Optimistic-locking version property.
    Version
}

impl Marker {
    /// Match a short or qualified marker name.
    ///
    /// Both `::` and `.` separators are accepted. Returns `None` for names
    /// outside the vocabulary and for qualified names in a foreign namespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('.', "::");
        let (namespace, short) = match normalized.rsplit_once("::") {
            Some((namespace, short)) => (Some(namespace.trim_start_matches("::")), short),
            None => (None, normalized.as_str())
        };

        if let Some(namespace) = namespace
            && !NAMESPACES.contains(&namespace)
        {
            return None;
        }

        Self::from_short(short)
    }

    /// Match a `syn` attribute or derive path.
    #[must_use]
    pub fn from_path(path: &syn::Path) -> Option<Self> {
        let joined = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        Self::from_name(&joined)
    }

    fn from_short(short: &str) -> Option<Self> {
        match short {
            "entity" | "Entity" => Some(Self::Entity),
            "id" | "Id" | "generated_value" | "GeneratedValue" => Some(Self::Id),
            "version" | "Version" => Some(Self::Version),
            _ => None
        }
    }

    /// Whether a property carrying this marker is left out of derived types.
    #[must_use]
    pub const fn excludes_property(self) -> bool {
        matches!(self, Self::Id | Self::Version)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entity => "entity",
            Self::Id => "id",
            Self::Version => "version"
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_in_both_cases() {
        assert_eq!(Marker::from_name("entity"), Some(Marker::Entity));
        assert_eq!(Marker::from_name("Entity"), Some(Marker::Entity));
        assert_eq!(Marker::from_name("id"), Some(Marker::Id));
        assert_eq!(Marker::from_name("Version"), Some(Marker::Version));
    }

    #[test]
    fn generated_value_is_identity() {
        assert_eq!(Marker::from_name("GeneratedValue"), Some(Marker::Id));
        assert_eq!(Marker::from_name("generated_value"), Some(Marker::Id));
    }

    #[test]
    fn qualified_names_in_known_namespaces() {
        assert_eq!(Marker::from_name("jakarta.persistence.Entity"), Some(Marker::Entity));
        assert_eq!(Marker::from_name("javax::persistence::Version"), Some(Marker::Version));
        assert_eq!(Marker::from_name("entity_types::id"), Some(Marker::Id));
        assert_eq!(Marker::from_name("::entity_types::entity"), Some(Marker::Entity));
    }

    #[test]
    fn foreign_namespace_is_not_a_marker() {
        assert_eq!(Marker::from_name("serde::Id"), None);
        assert_eq!(Marker::from_name("my::own::Entity"), None);
    }

    #[test]
    fn unknown_names_are_ignored() {
        assert_eq!(Marker::from_name("column"), None);
        assert_eq!(Marker::from_name("Transient"), None);
        assert_eq!(Marker::from_name(""), None);
    }

    #[test]
    fn from_syn_path() {
        let path: syn::Path = syn::parse_quote!(entity_types::version);
        assert_eq!(Marker::from_path(&path), Some(Marker::Version));

        let path: syn::Path = syn::parse_quote!(id);
        assert_eq!(Marker::from_path(&path), Some(Marker::Id));
    }

    #[test]
    fn exclusion() {
        assert!(Marker::Id.excludes_property());
        assert!(Marker::Version.excludes_property());
        assert!(!Marker::Entity.excludes_property());
    }
}
