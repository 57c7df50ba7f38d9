use super::{Annotatable, Annotation, LanguageType};
use crate::diagnostics::{Locatable, Location, Reporter};
use crate::error::Fatal;
use crate::typenames::TypeNames;
use std::collections::BTreeSet;
use std::fmt;

/// A reference to a built-in type, a defined type, or an array/generic form
/// of one, as written in source.
///
/// The canonical name stays empty until [`resolve`](Self::resolve) finds the
/// name in the registry. Once set it is never cleared.
#[derive(Debug, Clone)]
pub struct TypeSpecifier {
    location: Location,
    unresolved_name: String,
    fully_qualified_name: String,
    is_array: bool,
    type_params: Option<Vec<TypeSpecifier>>,
    comments: String,
    annotations: BTreeSet<Annotation>,
    language_type: Option<LanguageType>,
}

impl TypeSpecifier {
    pub fn new(
        location: Location,
        unresolved_name: impl Into<String>,
        is_array: bool,
        type_params: Option<Vec<TypeSpecifier>>,
        comments: impl Into<String>,
    ) -> Self {
        TypeSpecifier {
            location,
            unresolved_name: unresolved_name.into(),
            fully_qualified_name: String::new(),
            is_array,
            type_params,
            comments: comments.into(),
            annotations: BTreeSet::new(),
            language_type: None,
        }
    }

    /// Canonical name when resolved, otherwise the name as written.
    ///
    /// int -> int, int[] -> int, List<String> -> List,
    /// IFoo -> foo.bar.IFoo (if IFoo is in package foo.bar)
    pub fn name(&self) -> &str {
        if self.is_resolved() {
            &self.fully_qualified_name
        } else {
            &self.unresolved_name
        }
    }

    /// The canonical name, or `None` while unresolved.
    pub fn resolved_name(&self) -> Option<&str> {
        if self.is_resolved() {
            Some(&self.fully_qualified_name)
        } else {
            None
        }
    }

    pub fn unresolved_name(&self) -> &str {
        &self.unresolved_name
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn is_resolved(&self) -> bool {
        !self.fully_qualified_name.is_empty()
    }

    /// Own name and every generic parameter resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.is_resolved() && self.type_parameters().iter().all(|p| p.is_fully_resolved())
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn is_generic(&self) -> bool {
        self.type_params.is_some()
    }

    pub fn type_parameters(&self) -> &[TypeSpecifier] {
        self.type_params.as_deref().unwrap_or(&[])
    }

    /// Resolve the base name, then every generic parameter.
    ///
    /// Returns `true` only if everything resolved. Parts that fail stay
    /// untouched, so the call can be repeated after more names are
    /// registered.
    pub fn resolve(&mut self, typenames: &TypeNames) -> bool {
        self.resolve_imported(typenames, &[])
    }

    /// [`resolve`](Self::resolve) in a file that imports the classes in
    /// `imports`, which take precedence for their simple names.
    pub fn resolve_imported(&mut self, typenames: &TypeNames, imports: &[String]) -> bool {
        let mut resolved = self.is_resolved();
        if !resolved {
            if let Some(canonical) = typenames.resolve_imported(&self.unresolved_name, imports) {
                self.fully_qualified_name = canonical;
                resolved = true;
            }
        }
        if let Some(params) = &mut self.type_params {
            for p in params.iter_mut() {
                // every parameter is attempted, even after a failure
                let ok = p.resolve_imported(typenames, imports);
                resolved = resolved && ok;
            }
        }
        resolved
    }

    /// This specifier and its nested parameters that are still unresolved,
    /// outermost first.
    pub fn unresolved_parts(&self) -> Vec<&TypeSpecifier> {
        let mut out = Vec::new();
        if !self.is_resolved() {
            out.push(self);
        }
        for p in self.type_parameters() {
            out.extend(p.unresolved_parts());
        }
        out
    }

    /// Structural checks on a resolved specifier.
    ///
    /// `List` takes at most one parameter, `Map` zero or two, and nothing
    /// else may be generic. Calling this before resolution is a bug in the
    /// caller and is reported as fatal.
    pub fn check_valid(&self, reporter: &mut Reporter) -> Result<bool, Fatal> {
        if !self.is_fully_resolved() {
            return Err(reporter.fatal(
                &self.location,
                format!("type '{}' validated before it was resolved", self),
            ));
        }
        let mut valid = true;
        if let Some(params) = &self.type_params {
            let n = params.len();
            match self.name() {
                "List" | "java.util.List" => {
                    if n > 1 {
                        reporter.error(
                            &self.location,
                            format!(
                                "List cannot have type parameters more than one, but got '{}'",
                                self
                            ),
                        );
                        valid = false;
                    }
                }
                "Map" | "java.util.Map" => {
                    if n != 0 && n != 2 {
                        reporter.error(
                            &self.location,
                            format!("Map must have 0 or 2 type parameters, but got '{}'", self),
                        );
                        valid = false;
                    }
                }
                other => {
                    reporter.error(
                        &self.location,
                        format!("'{}' is not a generic type, but got '{}'", other, self),
                    );
                    valid = false;
                }
            }
            for p in params {
                valid &= p.check_valid(reporter)?;
            }
        }
        Ok(valid)
    }

    /// Annotations followed by the type, e.g. `@nullable List<String>`.
    pub fn signature(&self) -> String {
        let annotations = self.annotations_to_string();
        if annotations.is_empty() {
            self.to_string()
        } else {
            format!("{} {}", annotations, self)
        }
    }

    pub fn set_language_type(&mut self, language_type: LanguageType) {
        self.language_type = Some(language_type);
    }

    pub fn language_type(&self) -> Option<&LanguageType> {
        self.language_type.as_ref()
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some(params) = &self.type_params {
            let names: Vec<String> = params.iter().map(|p| p.to_string()).collect();
            write!(f, "<{}>", names.join(","))?;
        }
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl Annotatable for TypeSpecifier {
    fn annotations(&self) -> &BTreeSet<Annotation> {
        &self.annotations
    }

    fn annotate(&mut self, annotations: BTreeSet<Annotation>) {
        self.annotations = annotations;
    }
}

impl Locatable for TypeSpecifier {
    fn location(&self) -> &Location {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typenames::TypeRecord;
    use crate::ast::DefinedKind;

    fn spec(name: &str) -> TypeSpecifier {
        TypeSpecifier::new(Location::nowhere(), name, false, None, "")
    }

    fn generic(name: &str, params: Vec<TypeSpecifier>) -> TypeSpecifier {
        TypeSpecifier::new(Location::nowhere(), name, false, Some(params), "")
    }

    fn registry_with_foo() -> TypeNames {
        let mut t = TypeNames::new();
        t.add_defined_type(TypeRecord::new(
            DefinedKind::Parcelable,
            "Foo",
            vec!["a".into(), "b".into()],
        ));
        t
    }

    #[test]
    fn unresolved_until_resolve_succeeds() {
        let mut s = spec("Foo");
        assert!(!s.is_resolved());
        assert_eq!(s.name(), "Foo");
        assert!(!s.resolve(&TypeNames::new()));
        assert!(!s.is_resolved());

        let names = registry_with_foo();
        assert!(s.resolve(&names));
        assert!(s.is_resolved());
        assert_eq!(s.name(), "a.b.Foo");
        assert_eq!(s.unresolved_name(), "Foo");
    }

    #[test]
    fn resolution_is_monotonic() {
        let mut s = spec("Foo");
        assert!(s.resolve(&registry_with_foo()));
        // resolving against an empty registry must not undo anything
        assert!(s.resolve(&TypeNames::new()));
        assert!(s.is_resolved());
        assert_eq!(s.name(), "a.b.Foo");
    }

    #[test]
    fn generic_resolves_only_when_all_params_do() {
        let mut s = generic("List", vec![spec("Bar")]);
        let names = registry_with_foo();
        assert!(!s.resolve(&names));
        assert!(s.is_resolved());
        assert!(!s.is_fully_resolved());
        let parts: Vec<&str> = s.unresolved_parts().iter().map(|p| p.name()).collect();
        assert_eq!(parts, vec!["Bar"]);
    }

    #[test]
    fn to_string_renders_params_and_array() {
        let mut s = TypeSpecifier::new(
            Location::nowhere(),
            "Map",
            true,
            Some(vec![spec("String"), spec("Foo")]),
            "",
        );
        assert_eq!(s.to_string(), "Map<String,Foo>[]");
        assert!(s.resolve(&registry_with_foo()));
        assert_eq!(s.to_string(), "Map<String,a.b.Foo>[]");
    }

    #[test]
    fn signature_includes_annotations() {
        let mut s = spec("String");
        s.annotate([Annotation::Utf8InCpp, Annotation::Nullable].into_iter().collect());
        assert_eq!(s.signature(), "@nullable @utf8InCpp String");
        assert!(s.is_nullable());
        assert!(!s.is_utf8());
    }

    #[test]
    fn generic_arity_rules() {
        let names = TypeNames::new();
        let mut r = Reporter::silent();

        let mut ok_list = generic("List", vec![spec("String")]);
        assert!(ok_list.resolve(&names));
        assert!(ok_list.check_valid(&mut r).unwrap());

        let mut bad_list = generic("List", vec![spec("String"), spec("int")]);
        assert!(bad_list.resolve(&names));
        assert!(!bad_list.check_valid(&mut r).unwrap());

        let mut bad_map = generic("Map", vec![spec("String")]);
        assert!(bad_map.resolve(&names));
        assert!(!bad_map.check_valid(&mut r).unwrap());

        let mut not_generic = generic("int", vec![spec("String")]);
        assert!(not_generic.resolve(&names));
        assert!(!not_generic.check_valid(&mut r).unwrap());

        assert_eq!(r.error_count(), 3);
    }

    #[test]
    fn check_valid_before_resolve_is_fatal() {
        let mut r = Reporter::silent();
        let s = spec("Foo");
        assert!(s.check_valid(&mut r).is_err());
    }
}
