// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Declarative entity graph and derived type model.
//!
//! # Overview
//!
//! ```text
//! EntityDeclaration ──┬── PropertyDeclaration ── ResolvedType (as written)
//!                     └── Origin
//!
//! DerivedTypeSpec ──── DerivedField ── ResolvedType (after substitution)
//! ```
//!
//! Declarations are read fresh from the host on every pass and never
//! mutated by the derivation. Derived specs are plain values, so two passes
//! over the same input compare equal.

use std::{collections::BTreeSet, fmt};

use crate::marker::Marker;

/// Fully qualified declaration name.
///
/// The package is a Rust module path (`crate::library`). An empty package
/// names a declaration at the root of its source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    package: String,
    name:    String
}

impl QualifiedName {
    /// Create a qualified name from a package path and a simple name.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name:    name.into()
        }
    }

    /// Package (module path) of the declaration.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Simple name of the declaration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path segments, package first.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        let mut segments = split_path(&self.package);
        segments.push(self.name.clone());
        segments
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.package, self.name)
        }
    }
}

/// Split a `::` separated module path into its segments.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split("::")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Source unit a declaration was read from.
///
/// Generated files are attributed to the origin of their entity so that
/// incremental builds invalidate them when that unit changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin(String);

impl Origin {
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self(unit.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single property of an entity, as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    /// Property name as written (`name`, `r#type`).
    pub name: String,

    /// Declared type, syntactic form.
    ///
    /// Used as the fallback when the host cannot resolve the type.
    pub declared: ResolvedType,

    /// Whether the property can be written after construction.
    pub mutable: bool,

    /// Persistence markers attached to the property.
    pub markers: BTreeSet<Marker>,

    /// Documentation comment, copied onto generated fields.
    pub doc: Option<String>
}

impl PropertyDeclaration {
    /// Mutable, unmarked property.
    #[must_use]
    pub fn new(name: impl Into<String>, declared: ResolvedType) -> Self {
        Self {
            name: name.into(),
            declared,
            mutable: true,
            markers: BTreeSet::new(),
            doc: None
        }
    }

    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// An entity-marked declaration read from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDeclaration {
    /// Identity of the entity.
    pub name: QualifiedName,

    /// Properties in declaration order.
    pub properties: Vec<PropertyDeclaration>,

    /// Source unit the declaration lives in.
    pub origin: Origin,

    /// Documentation comment of the declaration.
    pub doc: Option<String>
}

impl EntityDeclaration {
    #[must_use]
    pub fn new(name: QualifiedName, origin: Origin) -> Self {
        Self {
            name,
            properties: Vec::new(),
            origin,
            doc: None
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn package(&self) -> &str {
        self.name.package()
    }

    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.name()
    }
}

/// Shape of a single-argument collection.
///
/// Substitution never changes the shape: an ordered sequence stays an
/// ordered sequence, a set stays a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionShape {
    Vec,
    VecDeque,
    LinkedList,
    HashSet,
    BTreeSet
}

impl CollectionShape {
    /// Recognise a collection by the last segment of its path.
    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "Vec" => Some(Self::Vec),
            "VecDeque" => Some(Self::VecDeque),
            "LinkedList" => Some(Self::LinkedList),
            "HashSet" => Some(Self::HashSet),
            "BTreeSet" => Some(Self::BTreeSet),
            _ => None
        }
    }

    /// Path the shape renders as.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Vec => "Vec",
            Self::VecDeque => "std::collections::VecDeque",
            Self::LinkedList => "std::collections::LinkedList",
            Self::HashSet => "std::collections::HashSet",
            Self::BTreeSet => "std::collections::BTreeSet"
        }
    }

    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::Vec | Self::VecDeque | Self::LinkedList)
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::HashSet | Self::BTreeSet)
    }
}

/// Structure of a type, without nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Built-in scalar (`i64`, `bool`, `String`).
    Primitive(String),

    /// Named type with optional type arguments (`Author`, `HashMap<K, V>`).
    Named {
        path: Vec<String>,
        args: Vec<ResolvedType>
    },

    /// Single-argument collection of an element type.
    Collection {
        shape:   CollectionShape,
        element: Box<ResolvedType>
    },

    /// Syntax the model does not interpret, kept as written.
    Verbatim(String)
}

/// A type together with its nullability.
///
/// Nullable types render as `Option<T>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    pub kind:     TypeKind,
    pub nullable: bool
}

impl ResolvedType {
    #[must_use]
    pub fn primitive(name: impl Into<String>) -> Self {
        Self {
            kind:     TypeKind::Primitive(name.into()),
            nullable: false
        }
    }

    /// Named type from a `::` separated path.
    #[must_use]
    pub fn named(path: &str) -> Self {
        Self::named_with(split_path(path), Vec::new())
    }

    #[must_use]
    pub fn named_with(path: Vec<String>, args: Vec<ResolvedType>) -> Self {
        Self {
            kind:     TypeKind::Named { path, args },
            nullable: false
        }
    }

    #[must_use]
    pub fn collection(shape: CollectionShape, element: ResolvedType) -> Self {
        Self {
            kind:     TypeKind::Collection {
                shape,
                element: Box::new(element)
            },
            nullable: false
        }
    }

    #[must_use]
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self {
            kind:     TypeKind::Verbatim(text.into()),
            nullable: false
        }
    }

    /// Same type with the given nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Widen to nullable. Already-nullable types are unchanged.
    #[must_use]
    pub fn widened(self) -> Self {
        self.with_nullable(true)
    }

    /// Path of the head declaration for named types.
    #[must_use]
    pub fn head_path(&self) -> Option<&[String]> {
        match &self.kind {
            TypeKind::Named { path, .. } => Some(path),
            _ => None
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("Option<")?;
        }
        match &self.kind {
            TypeKind::Primitive(name) => f.write_str(name)?,
            TypeKind::Named { path, args } => {
                f.write_str(&path.join("::"))?;
                if !args.is_empty() {
                    let args = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                    write!(f, "<{}>", args.join(", "))?;
                }
            }
            TypeKind::Collection { shape, element } => write!(f, "{}<{element}>", shape.path())?,
            TypeKind::Verbatim(text) => f.write_str(text)?
        }
        if self.nullable {
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Head declaration of a resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationInfo {
    pub name:    QualifiedName,
    pub markers: BTreeSet<Marker>
}

impl DeclarationInfo {
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.markers.contains(&Marker::Entity)
    }
}

/// Host answer to a type resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    /// The type with its head path fully qualified.
    pub ty: ResolvedType,

    /// Declaration behind the head of a named type.
    pub declaration: Option<DeclarationInfo>,

    /// Handles for the type arguments, in order.
    pub arguments: Vec<TypeHandle>
}

impl TypeHandle {
    /// Handle for a type with no known declaration.
    #[must_use]
    pub fn opaque(ty: ResolvedType) -> Self {
        Self {
            ty,
            declaration: None,
            arguments: Vec::new()
        }
    }
}

/// Which of the two derived types a spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRole {
    /// Create input; all fields required.
    Input,
    /// Partial update; fields optionally nullable with null defaults.
    Update
}

impl fmt::Display for TypeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Update => f.write_str("update")
        }
    }
}

/// One field of a derived type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    pub name:        String,
    pub ty:          ResolvedType,
    /// Field defaults to null when omitted.
    pub has_default: bool,
    pub doc:         Option<String>,
    /// Sets in `ty` whose elements are generated Input types.
    pub entity_sets: Vec<CollectionShape>
}

/// In-memory description of a generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTypeSpec {
    pub name:    String,
    pub package: String,
    pub role:    TypeRole,
    /// Entity the type was derived from.
    pub source:  QualifiedName,
    /// Summary line of the entity documentation.
    pub doc:     Option<String>,
    pub fields:  Vec<DerivedField>
}

impl DerivedTypeSpec {
    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.package.clone(), self.name.clone())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&DerivedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Why an entity was not completed this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferReason {
    /// Host reported a pending forward reference.
    NotResolvable,
    /// Processing failed; the message carries the cause.
    Failed(String)
}

/// Why an entity produced no output without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoEditableProperties
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEditableProperties => f.write_str("no editable properties")
        }
    }
}

/// Per-entity result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationOutcome {
    /// Both types were written, attributed to `origin`.
    Emitted {
        origin: Origin,
        types:  [QualifiedName; 2]
    },
    Deferred(DeferReason),
    Skipped(SkipReason)
}

impl DerivationOutcome {
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}
