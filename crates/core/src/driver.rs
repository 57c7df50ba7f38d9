//! Per-file parsing driver.
//!
//! A [`Driver`] takes one file through
//! Scanning → Building → DeferredRegistration → Resolving → Done.
//! The name registry and the reporter live in a [`Context`] that the
//! caller owns and lends to every driver of a compilation unit, so types
//! registered by one file are visible when another file resolves.

use crate::ast::{Document, QualifiedName};
use crate::diagnostics::{Locatable, Reporter};
use crate::error::ParseFailure;
use crate::lexer;
use crate::parser;
use crate::source::SourceProvider;
use crate::typenames::{TypeNames, TypeRecord};
use std::path::Path;

/// Shared state of one compilation unit.
#[derive(Debug, Default)]
pub struct Context {
    pub typenames: TypeNames,
    pub reporter: Reporter,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn with_reporter(reporter: Reporter) -> Self {
        Context {
            typenames: TypeNames::new(),
            reporter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Ready,
    Scanning,
    Building,
    DeferredRegistration,
    Resolving,
    Done,
}

pub struct Driver<'p> {
    provider: &'p dyn SourceProvider,
    filename: String,
    package: Option<QualifiedName>,
    document: Option<Document>,
    state: DriverState,
    deferred: usize,
}

impl<'p> Driver<'p> {
    pub fn new(provider: &'p dyn SourceProvider) -> Self {
        Driver {
            provider,
            filename: String::new(),
            package: None,
            document: None,
            state: DriverState::Ready,
            deferred: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Dot-joined package, empty when the file declares none.
    pub fn package(&self) -> String {
        self.package
            .as_ref()
            .map(QualifiedName::dot_name)
            .unwrap_or_default()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub(crate) fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    pub fn take_document(&mut self) -> Option<Document> {
        self.document.take()
    }

    /// Number of type specifiers waiting for the resolution pass.
    pub fn deferred_count(&self) -> usize {
        self.deferred
    }

    fn enter(&mut self, state: DriverState) {
        tracing::debug!(file = %self.filename, from = ?self.state, to = ?state, "driver phase");
        self.state = state;
    }

    /// Scan and build `path`, then register its defined types in the
    /// shared registry. Every type specifier of the document is left for
    /// [`resolve`](Self::resolve).
    pub fn parse_file(&mut self, path: &Path, ctx: &mut Context) -> Result<(), ParseFailure> {
        if self.state != DriverState::Ready {
            return Err(ctx
                .reporter
                .fatal(path, format!("parse_file called in state {:?}", self.state))
                .into());
        }
        self.filename = path.display().to_string();

        self.enter(DriverState::Scanning);
        let source = match self.provider.read_source(path) {
            Ok(s) => s,
            Err(source) => {
                ctx.reporter.error(
                    path,
                    format!("error while opening file for parsing: {}", source),
                );
                return Err(ParseFailure::Read {
                    file: self.filename.clone(),
                    source,
                });
            }
        };
        let errors_before = ctx.reporter.error_count();
        let tokens = lexer::lex(&source, &self.filename, &mut ctx.reporter);

        self.enter(DriverState::Building);
        let parsed = parser::parse(&tokens, &self.filename, &mut ctx.reporter);
        let errors = ctx.reporter.error_count() - errors_before;
        if errors > 0 {
            return Err(ParseFailure::Syntax {
                file: self.filename.clone(),
                errors,
            });
        }
        self.package = parsed.package;
        let document = Document::new(parsed.defined_types, parsed.imports);

        self.enter(DriverState::DeferredRegistration);
        self.deferred = document.type_specifiers().count();
        let mut duplicates = 0;
        for t in document.defined_types() {
            if !ctx.typenames.add_defined_type(TypeRecord::from_defined(t)) {
                ctx.reporter.error(
                    t.location(),
                    format!("redefinition of type '{}'", t.canonical_name()),
                );
                duplicates += 1;
            }
        }
        tracing::debug!(
            file = %self.filename,
            types = document.defined_types().len(),
            imports = document.imports().len(),
            deferred = self.deferred,
            "document built"
        );
        self.document = Some(document);
        if duplicates > 0 {
            return Err(ParseFailure::Syntax {
                file: self.filename.clone(),
                errors: duplicates,
            });
        }
        Ok(())
    }

    /// Resolve every deferred type specifier against the registry, with the
    /// file's own imports first for the simple names they end in. Each
    /// failure is reported and the pass continues, so all unresolved names
    /// of the file are surfaced at once.
    pub fn resolve(&mut self, ctx: &mut Context) -> Result<(), ParseFailure> {
        if self.state != DriverState::DeferredRegistration {
            return Err(ctx
                .reporter
                .fatal(
                    self.filename.as_str(),
                    format!("resolve called in state {:?}", self.state),
                )
                .into());
        }
        self.enter(DriverState::Resolving);

        let mut unresolved = 0;
        if let Some(document) = self.document.as_mut() {
            let imports: Vec<String> = document
                .imports()
                .iter()
                .map(|i| i.needed_class().to_owned())
                .collect();
            for spec in document.type_specifiers_mut() {
                if spec.resolve_imported(&ctx.typenames, &imports) {
                    continue;
                }
                for part in spec.unresolved_parts() {
                    ctx.reporter.error(
                        part.location(),
                        format!("Failed to resolve '{}'", part.unresolved_name()),
                    );
                    unresolved += 1;
                }
            }
        }
        tracing::debug!(file = %self.filename, deferred = self.deferred, unresolved, "resolution pass");
        self.deferred = unresolved;

        self.enter(DriverState::Done);
        if unresolved > 0 {
            return Err(ParseFailure::Unresolved {
                file: self.filename.clone(),
                unresolved,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    fn provider(files: &[(&str, &str)]) -> InMemoryProvider {
        let mut p = InMemoryProvider::default();
        for (path, src) in files {
            p.insert(path, *src);
        }
        p
    }

    #[test]
    fn parse_then_resolve_walks_every_phase() {
        let p = provider(&[(
            "a/IFoo.aidl",
            "package a;\ninterface IFoo { List<String> names(in int x); }\n",
        )]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        assert_eq!(d.state(), DriverState::Ready);
        d.parse_file(Path::new("a/IFoo.aidl"), &mut ctx).unwrap();
        assert_eq!(d.state(), DriverState::DeferredRegistration);
        assert_eq!(d.package(), "a");
        assert_eq!(d.deferred_count(), 2);
        assert_eq!(ctx.typenames.resolve_typename("IFoo").as_deref(), Some("a.IFoo"));

        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.state(), DriverState::Done);
        assert_eq!(d.deferred_count(), 0);
        let doc = d.document().unwrap();
        assert!(doc.type_specifiers().all(|s| s.is_fully_resolved()));
    }

    #[test]
    fn unresolved_type_fails_and_counts() {
        let p = provider(&[("IFoo.aidl", "interface IFoo { void f(in Foo x); }")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        d.parse_file(Path::new("IFoo.aidl"), &mut ctx).unwrap();
        let err = d.resolve(&mut ctx).unwrap_err();
        assert!(matches!(err, ParseFailure::Unresolved { unresolved: 1, .. }));
        assert!(ctx.reporter.error_count() > 0);
        assert!(ctx.reporter.diagnostics()[0]
            .line()
            .ends_with("Failed to resolve 'Foo'"));
    }

    #[test]
    fn missing_file_is_a_read_failure() {
        let p = InMemoryProvider::default();
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        let err = d.parse_file(Path::new("nope.aidl"), &mut ctx).unwrap_err();
        assert!(matches!(err, ParseFailure::Read { .. }));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn syntax_errors_fail_building() {
        let p = provider(&[("IFoo.aidl", "interface IFoo { void f( }")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        let err = d.parse_file(Path::new("IFoo.aidl"), &mut ctx).unwrap_err();
        assert!(matches!(err, ParseFailure::Syntax { .. }));
        assert_eq!(d.state(), DriverState::Building);
    }

    #[test]
    fn duplicate_definition_across_files_is_reported() {
        let p = provider(&[
            ("one/P.aidl", "package x; parcelable P;"),
            ("two/P.aidl", "package x; parcelable P;"),
        ]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        Driver::new(&p)
            .parse_file(Path::new("one/P.aidl"), &mut ctx)
            .unwrap();
        let err = Driver::new(&p)
            .parse_file(Path::new("two/P.aidl"), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, ParseFailure::Syntax { errors: 1, .. }));
        assert!(ctx.reporter.diagnostics()[0]
            .message
            .contains("redefinition of type 'x.P'"));
    }

    #[test]
    fn phases_out_of_order_are_fatal() {
        let p = InMemoryProvider::default();
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        assert!(matches!(d.resolve(&mut ctx), Err(ParseFailure::Fatal(_))));
    }
}
