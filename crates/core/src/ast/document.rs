use super::{DefinedType, TypeSpecifier};
use crate::diagnostics::{Locatable, Location};
use std::path::{Path, PathBuf};

/// An `import a.b.C;` statement.
///
/// The file it names and the parsed document are filled in separately by
/// the compilation-unit loader; either may stay unset.
#[derive(Debug, Clone)]
pub struct Import {
    location: Location,
    needed_class: String,
    filename: Option<PathBuf>,
    document: Option<Box<Document>>,
}

impl Import {
    pub fn new(location: Location, needed_class: impl Into<String>) -> Self {
        Import {
            location,
            needed_class: needed_class.into(),
            filename: None,
            document: None,
        }
    }

    pub fn needed_class(&self) -> &str {
        &self.needed_class
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: PathBuf) {
        self.filename = Some(filename);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_deref()
    }

    pub fn set_document(&mut self, document: Document) {
        self.document = Some(Box::new(document));
    }
}

impl Locatable for Import {
    fn location(&self) -> &Location {
        &self.location
    }
}

/// The parse result of one file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    defined_types: Vec<DefinedType>,
    imports: Vec<Import>,
}

impl Document {
    pub fn new(defined_types: Vec<DefinedType>, imports: Vec<Import>) -> Self {
        Document {
            defined_types,
            imports,
        }
    }

    pub fn defined_types(&self) -> &[DefinedType] {
        &self.defined_types
    }

    pub fn defined_types_mut(&mut self) -> &mut [DefinedType] {
        &mut self.defined_types
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut [Import] {
        &mut self.imports
    }

    /// Take the only defined type out of the document. Returns `None`, and
    /// leaves the document untouched, unless there is exactly one.
    pub fn release_defined_type(&mut self) -> Option<DefinedType> {
        if self.defined_types.len() != 1 {
            return None;
        }
        self.defined_types.pop()
    }

    pub fn into_imports(self) -> Vec<Import> {
        self.imports
    }

    /// Every top-level type specifier of every defined type.
    pub fn type_specifiers(&self) -> impl Iterator<Item = &TypeSpecifier> + '_ {
        self.defined_types.iter().flat_map(|t| t.type_specifiers())
    }

    pub(crate) fn type_specifiers_mut(&mut self) -> Vec<&mut TypeSpecifier> {
        self.defined_types
            .iter_mut()
            .flat_map(|t| t.type_specifiers_mut())
            .collect()
    }
}
