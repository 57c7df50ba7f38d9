//! The name registry of one compilation unit.
//!
//! Holds the built-in type names plus a [`TypeRecord`] for every defined
//! type parsed so far and every type read from a preprocessed file. Type
//! specifiers resolve against it by exact key: a built-in name, a canonical
//! name, or a registered simple name. A simple name shared by several
//! packages goes to the import that names it, otherwise to the first match
//! in canonical-name order.

use crate::ast::{DefinedKind, DefinedType, TypeSpecifier};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const BUILTIN_TYPES: &[&str] = &[
    "void",
    "boolean",
    "byte",
    "char",
    "int",
    "long",
    "float",
    "double",
    "String",
    "List",
    "Map",
    "IBinder",
    "FileDescriptor",
    "CharSequence",
    "java.util.List",
    "java.util.Map",
];

/// Container built-ins, which can carry data back to the caller.
const CONTAINER_TYPES: &[&str] = &["List", "Map", "java.util.List", "java.util.Map"];

/// What the registry knows about a defined or preprocessed type. Records
/// are plain values, so the registry never borrows the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub kind: DefinedKind,
    pub name: String,
    pub package: Vec<String>,
}

impl TypeRecord {
    pub fn new(kind: DefinedKind, name: impl Into<String>, package: Vec<String>) -> Self {
        TypeRecord {
            kind,
            name: name.into(),
            package,
        }
    }

    pub fn from_defined(t: &DefinedType) -> Self {
        TypeRecord::new(t.kind(), t.name(), t.split_package().to_vec())
    }

    pub fn canonical_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package.join("."), self.name)
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    by_canonical: BTreeMap<String, TypeRecord>,
    by_simple: HashMap<String, BTreeSet<String>>,
}

impl Table {
    fn insert(&mut self, record: TypeRecord) -> bool {
        let canonical = record.canonical_name();
        if self.by_canonical.contains_key(&canonical) {
            return false;
        }
        self.by_simple
            .entry(record.name.clone())
            .or_default()
            .insert(canonical.clone());
        self.by_canonical.insert(canonical, record);
        true
    }

    /// First type with this simple name in canonical-name order.
    fn alias(&self, simple: &str) -> Option<&TypeRecord> {
        let canonical = self.by_simple.get(simple)?.iter().next()?;
        self.by_canonical.get(canonical)
    }
}

#[derive(Debug, Default)]
pub struct TypeNames {
    defined: Table,
    preprocessed: Table,
}

impl TypeNames {
    pub fn new() -> Self {
        TypeNames::default()
    }

    /// Register a type parsed from a declaration file. Returns `false` if
    /// a defined type with the same canonical name already exists.
    pub fn add_defined_type(&mut self, record: TypeRecord) -> bool {
        self.defined.insert(record)
    }

    /// Register a type read from a preprocessed file. Returns `false` on a
    /// duplicate canonical name among preprocessed types.
    pub fn add_preprocessed_type(&mut self, record: TypeRecord) -> bool {
        self.preprocessed.insert(record)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        BUILTIN_TYPES.contains(&name)
    }

    /// Look up a defined or preprocessed type by canonical name, then by
    /// simple name. Defined types win over preprocessed ones at each step;
    /// a simple name shared by several packages finds the first in
    /// canonical-name order.
    pub fn lookup(&self, name: &str) -> Option<&TypeRecord> {
        if let Some(r) = self.defined.by_canonical.get(name) {
            return Some(r);
        }
        if let Some(r) = self.preprocessed.by_canonical.get(name) {
            return Some(r);
        }
        self.defined
            .alias(name)
            .or_else(|| self.preprocessed.alias(name))
    }

    /// Canonical form of `name`, or `None` if it names nothing registered.
    pub fn resolve_typename(&self, name: &str) -> Option<String> {
        self.resolve_imported(name, &[])
    }

    /// Like [`resolve_typename`](Self::resolve_typename), but a simple name
    /// that one of `imports` ends in resolves to that import when the
    /// registry knows it.
    pub fn resolve_imported(&self, name: &str, imports: &[String]) -> Option<String> {
        if self.is_builtin(name) {
            return Some(name.to_owned());
        }
        let imported = imports
            .iter()
            .filter(|class| class.rsplit('.').next() == Some(name))
            .find_map(|class| self.lookup(class));
        imported
            .or_else(|| self.lookup(name))
            .map(TypeRecord::canonical_name)
    }

    /// Whether a value of this (resolved) type can carry data back to the
    /// caller, i.e. be an `out` or `inout` argument.
    pub fn can_be_out_parameter(&self, spec: &TypeSpecifier) -> bool {
        if spec.is_array() {
            return true;
        }
        let name = spec.name();
        if CONTAINER_TYPES.contains(&name) {
            return true;
        }
        if self.is_builtin(name) {
            return false;
        }
        self.lookup(name)
            .map(|r| r.kind != DefinedKind::Interface)
            .unwrap_or(false)
    }

    /// Defined types, then preprocessed ones, each in canonical-name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeRecord> + '_ {
        self.defined
            .by_canonical
            .values()
            .chain(self.preprocessed.by_canonical.values())
    }

    pub fn defined_types(&self) -> impl Iterator<Item = &TypeRecord> + '_ {
        self.defined.by_canonical.values()
    }
}
