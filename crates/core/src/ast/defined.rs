use super::{
    Annotatable, Annotation, ConstantDeclaration, LanguageType, Member, Method, TypeSpecifier,
    VariableDeclaration,
};
use crate::code_writer::CodeWriter;
use crate::diagnostics::{Locatable, Location};
use std::collections::BTreeSet;
use std::fmt::{self, Write};

// ──────────────────────────────────────────────
// Qualified names
// ──────────────────────────────────────────────

/// A dotted name as written, e.g. `a.b.Foo`. Terms can only be appended.
#[derive(Debug, Clone)]
pub struct QualifiedName {
    location: Location,
    terms: Vec<String>,
    comments: String,
}

impl QualifiedName {
    pub fn new(location: Location, term: impl Into<String>, comments: impl Into<String>) -> Self {
        QualifiedName {
            location,
            terms: vec![term.into()],
            comments: comments.into(),
        }
    }

    pub fn add_term(&mut self, term: impl Into<String>) {
        self.terms.push(term.into());
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn dot_name(&self) -> String {
        self.terms.join(".")
    }

    /// C++ spelling, `a::b::Foo`.
    pub fn colon_name(&self) -> String {
        self.terms.join("::")
    }
}

impl Locatable for QualifiedName {
    fn location(&self) -> &Location {
        &self.location
    }
}

// ──────────────────────────────────────────────
// Shared header
// ──────────────────────────────────────────────

/// Fields common to every kind of defined type.
#[derive(Debug, Clone)]
pub struct TypeHeader {
    location: Location,
    name: String,
    comments: String,
    package: Vec<String>,
    annotations: BTreeSet<Annotation>,
    language_type: Option<LanguageType>,
}

impl TypeHeader {
    pub fn new(
        location: Location,
        name: impl Into<String>,
        comments: impl Into<String>,
        package: Vec<String>,
    ) -> Self {
        TypeHeader {
            location,
            name: name.into(),
            comments: comments.into(),
            package,
            annotations: BTreeSet::new(),
            language_type: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn package(&self) -> String {
        self.package.join(".")
    }

    pub fn split_package(&self) -> &[String] {
        &self.package
    }

    /// `package.Name`, or just `Name` in the default package.
    pub fn canonical_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package(), self.name)
        }
    }
}

// ──────────────────────────────────────────────
// Variants
// ──────────────────────────────────────────────

/// Opaque parcelable: declared here, implemented by hand in each backend.
#[derive(Debug, Clone)]
pub struct Parcelable {
    header: TypeHeader,
    qualified_name: QualifiedName,
    cpp_header: String,
}

impl Parcelable {
    pub fn new(
        location: Location,
        name: QualifiedName,
        package: Vec<String>,
        cpp_header: impl Into<String>,
    ) -> Self {
        let header = TypeHeader::new(location, name.dot_name(), name.comments(), package);
        Parcelable {
            header,
            qualified_name: name,
            cpp_header: cpp_header.into(),
        }
    }

    pub fn header(&self) -> &TypeHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn qualified_name(&self) -> &QualifiedName {
        &self.qualified_name
    }

    /// Inner classes use `::` in C++.
    pub fn cpp_name(&self) -> String {
        self.qualified_name.colon_name()
    }

    pub fn cpp_header(&self) -> &str {
        &self.cpp_header
    }
}

/// A parcelable whose fields are declared in the file.
#[derive(Debug, Clone)]
pub struct StructuredParcelable {
    parcelable: Parcelable,
    pub(crate) fields: Vec<VariableDeclaration>,
}

impl StructuredParcelable {
    pub fn new(
        location: Location,
        name: QualifiedName,
        package: Vec<String>,
        fields: Vec<VariableDeclaration>,
    ) -> Self {
        StructuredParcelable {
            parcelable: Parcelable::new(location, name, package, ""),
            fields,
        }
    }

    pub fn header(&self) -> &TypeHeader {
        &self.parcelable.header
    }

    pub fn name(&self) -> &str {
        self.parcelable.name()
    }

    pub fn as_parcelable(&self) -> &Parcelable {
        &self.parcelable
    }

    pub fn fields(&self) -> &[VariableDeclaration] {
        &self.fields
    }
}

#[derive(Debug, Clone)]
pub struct Interface {
    header: TypeHeader,
    oneway: bool,
    pub(crate) methods: Vec<Method>,
    pub(crate) constants: Vec<ConstantDeclaration>,
}

impl Interface {
    /// Members are split by kind, each list keeping declaration order.
    pub fn new(
        location: Location,
        name: impl Into<String>,
        comments: impl Into<String>,
        oneway: bool,
        members: Vec<Member>,
        package: Vec<String>,
    ) -> Self {
        let mut methods = Vec::new();
        let mut constants = Vec::new();
        for member in members {
            match member {
                Member::Method(mut m) => {
                    m.apply_interface_oneway(oneway);
                    methods.push(m);
                }
                Member::Constant(c) => constants.push(c),
            }
        }
        Interface {
            header: TypeHeader::new(location, name, comments, package),
            oneway,
            methods,
            constants,
        }
    }

    pub fn header(&self) -> &TypeHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut [Method] {
        &mut self.methods
    }

    pub fn constants(&self) -> &[ConstantDeclaration] {
        &self.constants
    }
}

// ──────────────────────────────────────────────
// DefinedType
// ──────────────────────────────────────────────

/// Discriminant of [`DefinedType`], also stored in registry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefinedKind {
    Parcelable,
    StructuredParcelable,
    Interface,
}

impl DefinedKind {
    /// Keyword used in preprocessed files.
    pub fn declaration_name(self) -> &'static str {
        match self {
            DefinedKind::Parcelable => "parcelable",
            DefinedKind::StructuredParcelable => "structured_parcelable",
            DefinedKind::Interface => "interface",
        }
    }

    pub fn from_declaration_name(word: &str) -> Option<DefinedKind> {
        match word {
            "parcelable" => Some(DefinedKind::Parcelable),
            "structured_parcelable" => Some(DefinedKind::StructuredParcelable),
            "interface" => Some(DefinedKind::Interface),
            _ => None,
        }
    }
}

/// A top-level declaration of a document.
#[derive(Debug, Clone)]
pub enum DefinedType {
    Parcelable(Parcelable),
    StructuredParcelable(StructuredParcelable),
    Interface(Interface),
}

impl DefinedType {
    pub fn header(&self) -> &TypeHeader {
        match self {
            DefinedType::Parcelable(p) => &p.header,
            DefinedType::StructuredParcelable(s) => &s.parcelable.header,
            DefinedType::Interface(i) => &i.header,
        }
    }

    fn header_mut(&mut self) -> &mut TypeHeader {
        match self {
            DefinedType::Parcelable(p) => &mut p.header,
            DefinedType::StructuredParcelable(s) => &mut s.parcelable.header,
            DefinedType::Interface(i) => &mut i.header,
        }
    }

    pub fn kind(&self) -> DefinedKind {
        match self {
            DefinedType::Parcelable(_) => DefinedKind::Parcelable,
            DefinedType::StructuredParcelable(_) => DefinedKind::StructuredParcelable,
            DefinedType::Interface(_) => DefinedKind::Interface,
        }
    }

    pub fn name(&self) -> &str {
        self.header().name()
    }

    pub fn comments(&self) -> &str {
        self.header().comments()
    }

    pub fn package(&self) -> String {
        self.header().package()
    }

    pub fn split_package(&self) -> &[String] {
        self.header().split_package()
    }

    pub fn canonical_name(&self) -> String {
        self.header().canonical_name()
    }

    pub fn preprocess_declaration_name(&self) -> &'static str {
        self.kind().declaration_name()
    }

    /// Both parcelable kinds; for a structured one this is its header part.
    pub fn as_parcelable(&self) -> Option<&Parcelable> {
        match self {
            DefinedType::Parcelable(p) => Some(p),
            DefinedType::StructuredParcelable(s) => Some(&s.parcelable),
            DefinedType::Interface(_) => None,
        }
    }

    pub fn as_structured_parcelable(&self) -> Option<&StructuredParcelable> {
        match self {
            DefinedType::StructuredParcelable(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&Interface> {
        match self {
            DefinedType::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_interface_mut(&mut self) -> Option<&mut Interface> {
        match self {
            DefinedType::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// Only a plain (non-structured) parcelable.
    pub fn as_unstructured_parcelable(&self) -> Option<&Parcelable> {
        match self {
            DefinedType::Parcelable(p) => Some(p),
            _ => None,
        }
    }

    pub fn set_language_type(&mut self, language_type: LanguageType) {
        self.header_mut().language_type = Some(language_type);
    }

    pub fn language_type(&self) -> Option<&LanguageType> {
        self.header().language_type.as_ref()
    }

    /// Top-level type specifiers of this declaration in source order.
    /// Generic parameters are reached through their owner.
    pub fn type_specifiers(&self) -> Vec<&TypeSpecifier> {
        match self {
            DefinedType::Parcelable(_) => Vec::new(),
            DefinedType::StructuredParcelable(s) => s.fields.iter().map(|f| &f.type_).collect(),
            DefinedType::Interface(i) => {
                let mut out = Vec::new();
                for m in &i.methods {
                    out.push(&m.type_);
                    out.extend(m.arguments.iter().map(|a| &a.var.type_));
                }
                out.extend(i.constants.iter().map(|c| &c.type_));
                out
            }
        }
    }

    pub(crate) fn type_specifiers_mut(&mut self) -> Vec<&mut TypeSpecifier> {
        match self {
            DefinedType::Parcelable(_) => Vec::new(),
            DefinedType::StructuredParcelable(s) => {
                s.fields.iter_mut().map(|f| &mut f.type_).collect()
            }
            DefinedType::Interface(i) => {
                let mut out = Vec::new();
                for m in i.methods.iter_mut() {
                    let Method {
                        type_, arguments, ..
                    } = m;
                    out.push(type_);
                    out.extend(arguments.iter_mut().map(|a| &mut a.var.type_));
                }
                out.extend(i.constants.iter_mut().map(|c| &mut c.type_));
                out
            }
        }
    }

    /// Render the declaration as source text, without the package.
    pub fn write_api(&self, w: &mut CodeWriter) -> fmt::Result {
        let annotations = self.annotations_to_string();
        if !annotations.is_empty() {
            write!(w, "{} ", annotations)?;
        }
        match self {
            DefinedType::Parcelable(p) => writeln!(w, "parcelable {};", p.name()),
            DefinedType::StructuredParcelable(s) => {
                writeln!(w, "parcelable {} {{", s.name())?;
                w.indent();
                for field in &s.fields {
                    write!(w, "{}", field.signature())?;
                    if let Some(v) = field.default_value() {
                        write!(w, " = {}", v)?;
                    }
                    writeln!(w, ";")?;
                }
                w.dedent();
                writeln!(w, "}}")
            }
            DefinedType::Interface(i) => {
                if i.oneway {
                    write!(w, "oneway ")?;
                }
                writeln!(w, "interface {} {{", i.name())?;
                w.indent();
                for m in &i.methods {
                    writeln!(w, "{};", m)?;
                }
                for c in &i.constants {
                    writeln!(w, "{};", c)?;
                }
                w.dedent();
                writeln!(w, "}}")
            }
        }
    }
}

impl Annotatable for DefinedType {
    fn annotations(&self) -> &BTreeSet<Annotation> {
        &self.header().annotations
    }

    fn annotate(&mut self, annotations: BTreeSet<Annotation>) {
        self.header_mut().annotations = annotations;
    }
}

impl Locatable for DefinedType {
    fn location(&self) -> &Location {
        &self.header().location
    }
}
