//! AST node model for declaration files.
//!
//! Nodes are produced by the parser and consumed by the resolver, the
//! validator and downstream generators. Apart from type resolution,
//! annotation attachment and method id assignment, nodes are immutable
//! once built.

use crate::diagnostics::{Location, Reporter};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub mod constant;
pub mod decl;
pub mod defined;
pub mod document;
pub mod types;

pub use constant::{ConstantType, ConstantValue};
pub use decl::{Argument, ConstantDeclaration, Direction, Member, Method, VariableDeclaration};
pub use defined::{
    DefinedKind, DefinedType, Interface, Parcelable, QualifiedName, StructuredParcelable,
    TypeHeader,
};
pub use document::{Document, Import};
pub use types::TypeSpecifier;

// ──────────────────────────────────────────────
// Annotations
// ──────────────────────────────────────────────

/// The fixed set of recognized annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
    Nullable,
    Utf8,
    Utf8InCpp,
}

impl Annotation {
    pub const ALL: [Annotation; 3] = [
        Annotation::Nullable,
        Annotation::Utf8,
        Annotation::Utf8InCpp,
    ];

    /// Parse `@name`. Unknown names are reported and yield `None`.
    pub fn parse(location: &Location, name: &str, reporter: &mut Reporter) -> Option<Annotation> {
        let found = Annotation::ALL.iter().find(|a| a.name() == name).copied();
        if found.is_none() {
            let known: Vec<&str> = Annotation::ALL.iter().map(|a| a.name()).collect();
            reporter.error(
                location,
                format!(
                    "'{}' is not a recognized annotation. It must be one of: {}",
                    name,
                    known.join(", ")
                ),
            );
        }
        found
    }

    pub fn name(&self) -> &'static str {
        match self {
            Annotation::Nullable => "nullable",
            Annotation::Utf8 => "utf8",
            Annotation::Utf8InCpp => "utf8InCpp",
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// A node that can carry annotations.
pub trait Annotatable {
    fn annotations(&self) -> &BTreeSet<Annotation>;

    /// Replace the annotation set.
    fn annotate(&mut self, annotations: BTreeSet<Annotation>);

    fn is_nullable(&self) -> bool {
        self.annotations().contains(&Annotation::Nullable)
    }

    fn is_utf8(&self) -> bool {
        self.annotations().contains(&Annotation::Utf8)
    }

    fn is_utf8_in_cpp(&self) -> bool {
        self.annotations().contains(&Annotation::Utf8InCpp)
    }

    /// Space-joined `@name` list, in a stable order.
    fn annotations_to_string(&self) -> String {
        self.annotations()
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ──────────────────────────────────────────────
// Backend attachment
// ──────────────────────────────────────────────

/// Opaque handle a code generator may attach to a resolved type.
/// The front end never looks inside it.
#[derive(Clone)]
pub struct LanguageType(pub Arc<dyn Any + Send + Sync>);

impl LanguageType {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for LanguageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LanguageType(..)")
    }
}
