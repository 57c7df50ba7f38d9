//! Compilation-unit loading.
//!
//! [`load_and_validate`] takes one input file from source text to a
//! resolved, validated [`LoadedUnit`]: preprocessed files, the input
//! document, the transitive import closure, resolution and the
//! post-resolution checks. [`dump_api`] and [`preprocess`] are the two
//! multi-file operations built on the same drivers.

use crate::ast::{DefinedKind, DefinedType, Document, Import};
use crate::code_writer::CodeWriter;
use crate::diagnostics::{Locatable, Location, Reporter};
use crate::driver::{Context, Driver};
use crate::error::{LoadError, ParseFailure};
use crate::import_resolver::ImportResolver;
use crate::options::Options;
use crate::preprocessed::{read_preprocessed_file, write_preprocessed};
use crate::source::SourceProvider;
use crate::typenames::TypeNames;
use crate::validate::{check_and_assign_method_ids, check_types, validate_constants};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

/// A resolved and validated compilation unit, ready for code generation.
#[derive(Debug)]
pub struct LoadedUnit {
    pub defined_type: DefinedType,
    /// Imports of the input file. Each carries the file it was found in
    /// and, when that file was parsed for this unit, its document.
    pub imports: Vec<Import>,
}

/// `<package dirs>/<Name>.aidl`. Only the part of the name before the first
/// dot counts, so a nested parcelable `Outer.Inner` lives in `Outer.aidl`.
pub fn expected_filename(defined: &DefinedType) -> PathBuf {
    let mut path = PathBuf::new();
    for term in defined.split_package() {
        path.push(term);
    }
    let name = defined.name();
    let stem = name.split('.').next().unwrap_or(name);
    path.push(format!("{}.aidl", stem));
    path
}

/// Whether `file` is where `defined` should be declared. A mismatch is
/// reported at the declaration.
pub fn check_filename(file: &Path, defined: &DefinedType, reporter: &mut Reporter) -> bool {
    let expected = expected_filename(defined);
    if file.ends_with(&expected) {
        return true;
    }
    reporter.error(
        defined.location(),
        format!(
            "{} should be declared in a file called {}",
            defined.canonical_name(),
            expected.display()
        ),
    );
    false
}

fn check_filenames(file: &Path, document: &Document, reporter: &mut Reporter) -> bool {
    let mut ok = true;
    for t in document.defined_types() {
        ok &= check_filename(file, t, reporter);
    }
    ok
}

fn read_preprocessed_files(
    options: &Options,
    provider: &dyn SourceProvider,
    ctx: &mut Context,
) -> Result<(), LoadError> {
    let mut ok = true;
    for path in &options.preprocessed_files {
        ok &= read_preprocessed_file(provider, path, &mut ctx.typenames, &mut ctx.reporter);
    }
    if !ok {
        return Err(LoadError::BadPreprocessedFile);
    }
    Ok(())
}

/// One parsed file of the import closure. `parent` is the node and import
/// index whose document this file becomes.
struct Node<'p> {
    path: PathBuf,
    driver: Driver<'p>,
    parent: Option<(usize, usize)>,
}

fn canonical(provider: &dyn SourceProvider, path: &Path) -> PathBuf {
    provider
        .canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Parse every file reachable through imports from `nodes[0]`. Classes
/// already in the registry are not loaded again, which also makes import
/// cycles terminate, and no file is parsed twice. Every missing or broken
/// import is reported before failing.
fn load_imports<'p>(
    nodes: &mut Vec<Node<'p>>,
    resolver: &ImportResolver<'_>,
    provider: &'p dyn SourceProvider,
    ctx: &mut Context,
) -> Result<(), LoadError> {
    let mut class_files: HashMap<String, PathBuf> = HashMap::new();
    let mut visited: HashSet<PathBuf> = nodes
        .iter()
        .map(|n| canonical(provider, &n.path))
        .collect();
    let mut broken: HashSet<PathBuf> = HashSet::new();
    let mut ok = true;
    let mut next = 0;
    while next < nodes.len() {
        let current = next;
        next += 1;

        let wanted: Vec<(String, Location)> = match nodes[current].driver.document() {
            Some(doc) => doc
                .imports()
                .iter()
                .map(|i| (i.needed_class().to_owned(), i.location().clone()))
                .collect(),
            None => continue,
        };

        for (index, (class, location)) in wanted.into_iter().enumerate() {
            if let Some(known) = ctx.typenames.lookup(&class) {
                let name = known.canonical_name();
                tracing::trace!(class = %class, "import already known");
                if let Some(path) = class_files.get(&name).cloned() {
                    set_import_filename(&mut nodes[current], index, path);
                }
                continue;
            }

            let path = match resolver.find_import_file(&class) {
                Some(p) => p,
                None => {
                    ctx.reporter
                        .error(&location, format!("couldn't find import for class {}", class));
                    ok = false;
                    continue;
                }
            };
            set_import_filename(&mut nodes[current], index, path.clone());
            let key = canonical(provider, &path);
            if !visited.insert(key.clone()) {
                // parsed already, but it did not declare this class
                if !broken.contains(&key) {
                    ctx.reporter.error(
                        &location,
                        format!("{} does not declare {}", path.display(), class),
                    );
                }
                ok = false;
                continue;
            }

            let mut driver = Driver::new(provider);
            match driver.parse_file(&path, ctx) {
                Ok(()) => {}
                Err(ParseFailure::Fatal(f)) => return Err(LoadError::Fatal(f)),
                Err(_) => {
                    ctx.reporter.error(
                        &location,
                        format!("error while importing {} for {}", path.display(), class),
                    );
                    broken.insert(key);
                    ok = false;
                    continue;
                }
            }

            if let Some(doc) = driver.document() {
                ok &= check_filenames(&path, doc, &mut ctx.reporter);
                for t in doc.defined_types() {
                    class_files.insert(t.canonical_name(), path.clone());
                }
            }
            tracing::debug!(class = %class, path = %path.display(), "import loaded");
            nodes.push(Node {
                path,
                driver,
                parent: Some((current, index)),
            });
        }
    }
    if !ok {
        return Err(LoadError::BadImport);
    }
    Ok(())
}

fn set_import_filename(node: &mut Node<'_>, index: usize, path: PathBuf) {
    if let Some(import) = node
        .driver
        .document_mut()
        .and_then(|d| d.imports_mut().get_mut(index))
    {
        import.set_filename(path);
    }
}

/// Load `input` and everything it imports, resolve every type specifier and
/// run the post-resolution checks.
///
/// Diagnostics go to `ctx.reporter`; the returned error only names the
/// class of failure. Types registered along the way stay in
/// `ctx.typenames` either way.
pub fn load_and_validate(
    input: &Path,
    options: &Options,
    provider: &dyn SourceProvider,
    ctx: &mut Context,
) -> Result<LoadedUnit, LoadError> {
    read_preprocessed_files(options, provider, ctx)?;

    let mut main = Driver::new(provider);
    main.parse_file(input, ctx)?;

    let (count, all_unstructured) = match main.document() {
        Some(doc) => (
            doc.defined_types().len(),
            doc.defined_types()
                .iter()
                .all(|t| t.as_unstructured_parcelable().is_some()),
        ),
        None => (0, true),
    };
    if count == 0 {
        ctx.reporter
            .error(input, "Cannot generate file without any definitions.");
        return Err(LoadError::BadType);
    }
    if all_unstructured {
        // nothing to generate; the caller decides whether that is an error
        return Err(LoadError::FoundParcelable);
    }
    if count > 1 {
        ctx.reporter
            .error(input, "Exactly one structured type is required to be defined.");
        return Err(LoadError::BadType);
    }
    if let Some(t) = main.document().and_then(|d| d.defined_types().first()) {
        if !check_filename(input, t, &mut ctx.reporter) {
            let package = main.package();
            ctx.reporter
                .error(input, format!("Invalid package declaration '{}'", package));
            return Err(LoadError::BadPackage(package));
        }
    }

    let resolver = ImportResolver::new(provider, &options.import_paths, &options.input_files);
    let mut nodes = vec![Node {
        path: input.to_path_buf(),
        driver: main,
        parent: None,
    }];
    load_imports(&mut nodes, &resolver, provider, ctx)?;

    let mut unresolved = false;
    for node in nodes.iter_mut() {
        match node.driver.resolve(ctx) {
            Ok(()) => {}
            Err(ParseFailure::Fatal(f)) => return Err(LoadError::Fatal(f)),
            Err(e) => {
                tracing::debug!(path = %node.path.display(), error = %e, "resolution failed");
                unresolved = true;
            }
        }
    }
    if unresolved {
        return Err(LoadError::BadType);
    }

    // Children always come after their parent, so attaching back to front
    // moves each document only once its own imports are filled in.
    for k in (1..nodes.len()).rev() {
        let document = nodes[k].driver.take_document();
        if let (Some(document), Some((parent, index))) = (document, nodes[k].parent) {
            if let Some(import) = nodes[parent]
                .driver
                .document_mut()
                .and_then(|d| d.imports_mut().get_mut(index))
            {
                import.set_document(document);
            }
        }
    }

    let mut document = match nodes[0].driver.take_document() {
        Some(d) => d,
        None => return Err(ctx.reporter.fatal(input, "input document vanished").into()),
    };
    let mut defined = match document.release_defined_type() {
        Some(t) => t,
        None => {
            return Err(ctx
                .reporter
                .fatal(input, "input must define exactly one type")
                .into())
        }
    };
    let imports = document.into_imports();

    if !check_types(&defined, &ctx.typenames, &mut ctx.reporter)? {
        return Err(LoadError::BadType);
    }

    if options.structured {
        let unstructured: Vec<String> = ctx
            .typenames
            .iter()
            .filter(|r| r.kind == DefinedKind::Parcelable)
            .map(|r| r.canonical_name())
            .collect();
        if !unstructured.is_empty() {
            for name in unstructured {
                ctx.reporter.error(
                    defined.location(),
                    format!(
                        "{} is not structured, but this is a structured interface.",
                        name
                    ),
                );
            }
            return Err(LoadError::BadType);
        }
    }

    if let Some(interface) = defined.as_interface_mut() {
        let file = input.display().to_string();
        if !check_and_assign_method_ids(&file, interface.methods_mut(), &mut ctx.reporter) {
            return Err(LoadError::BadMethodId);
        }
        if !validate_constants(interface, &mut ctx.reporter)? {
            return Err(LoadError::BadConstants);
        }
    }

    tracing::debug!(
        input = %input.display(),
        canonical = %defined.canonical_name(),
        imports = imports.len(),
        "unit loaded"
    );
    Ok(LoadedUnit {
        defined_type: defined,
        imports,
    })
}

/// Load every input file of `options` as its own unit and render the
/// resulting types grouped by package, packages and types sorted by name.
/// Each unit gets a fresh registry; the reporter is shared.
pub fn dump_api(
    options: &Options,
    provider: &dyn SourceProvider,
    ctx: &mut Context,
) -> Result<String, LoadError> {
    let mut by_package: BTreeMap<String, Vec<DefinedType>> = BTreeMap::new();
    for input in &options.input_files {
        ctx.typenames = TypeNames::new();
        let unit = load_and_validate(input, options, provider, ctx)?;
        by_package
            .entry(unit.defined_type.package())
            .or_default()
            .push(unit.defined_type);
    }

    let mut w = CodeWriter::new();
    for (package, mut types) in by_package {
        types.sort_by(|a, b| a.name().cmp(b.name()));
        if write_package(&mut w, &package, &types).is_err() {
            return Err(ctx
                .reporter
                .fatal(package.as_str(), "failed to render api dump")
                .into());
        }
    }
    Ok(w.into_string())
}

fn write_package(w: &mut CodeWriter, package: &str, types: &[DefinedType]) -> fmt::Result {
    writeln!(w, "package {} {{", package)?;
    w.indent();
    for t in types {
        t.write_api(w)?;
        writeln!(w)?;
    }
    w.dedent();
    writeln!(w, "}}")
}

/// Parse every input file of `options` and list its types in preprocessed
/// form. Imports are neither loaded nor resolved.
pub fn preprocess(
    options: &Options,
    provider: &dyn SourceProvider,
    ctx: &mut Context,
) -> Result<String, LoadError> {
    let mut documents = Vec::with_capacity(options.input_files.len());
    for input in &options.input_files {
        ctx.typenames = TypeNames::new();
        let mut driver = Driver::new(provider);
        driver.parse_file(input, ctx)?;
        if let Some(doc) = driver.take_document() {
            documents.push(doc);
        }
    }
    Ok(write_preprocessed(&documents))
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

    fn messages(ctx: &Context) -> Vec<String> {
        ctx.reporter
            .diagnostics()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn expected_filename_uses_outer_name() {
        let p = provider(&[("a/b/Outer.aidl", "package a.b; parcelable Outer.Inner;")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        d.parse_file(Path::new("a/b/Outer.aidl"), &mut ctx).unwrap();
        let t = &d.document().unwrap().defined_types()[0];
        assert_eq!(expected_filename(t), PathBuf::from("a/b/Outer.aidl"));
        assert!(check_filename(Path::new("src/a/b/Outer.aidl"), t, &mut ctx.reporter));
        assert!(!check_filename(Path::new("src/b/Outer.aidl"), t, &mut ctx.reporter));
        assert_eq!(
            messages(&ctx),
            vec!["a.b.Outer.Inner should be declared in a file called a/b/Outer.aidl"]
        );
    }

    #[test]
    fn loads_interface_with_ids() {
        let p = provider(&[(
            "a/IFoo.aidl",
            "package a; interface IFoo { void x(); int y(in int v); }",
        )]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let unit =
            load_and_validate(Path::new("a/IFoo.aidl"), &Options::default(), &p, &mut ctx).unwrap();
        let ids: Vec<Option<i32>> = unit
            .defined_type
            .as_interface()
            .unwrap()
            .methods()
            .iter()
            .map(|m| m.id())
            .collect();
        assert_eq!(ids, vec![Some(0), Some(1)]);
        assert_eq!(ctx.reporter.error_count(), 0);
    }

    #[test]
    fn empty_and_multiple_definitions_are_type_errors() {
        let p = provider(&[
            ("Empty.aidl", "package a;"),
            ("a/Two.aidl", "package a; parcelable Two {} interface IOther {}"),
        ]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let o = Options::default();
        assert!(matches!(
            load_and_validate(Path::new("Empty.aidl"), &o, &p, &mut ctx),
            Err(LoadError::BadType)
        ));
        let mut ctx = Context::with_reporter(Reporter::silent());
        assert!(matches!(
            load_and_validate(Path::new("a/Two.aidl"), &o, &p, &mut ctx),
            Err(LoadError::BadType)
        ));
    }

    #[test]
    fn only_unstructured_parcelables_found() {
        let p = provider(&[("a/P.aidl", "package a; parcelable P;")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/P.aidl"), &Options::default(), &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::FoundParcelable)));
        assert_eq!(ctx.reporter.error_count(), 0);
    }

    #[test]
    fn package_must_match_path() {
        let p = provider(&[("b/IFoo.aidl", "package a; interface IFoo {}")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("b/IFoo.aidl"), &Options::default(), &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadPackage(ref pkg)) if pkg == "a"));
        assert!(messages(&ctx).contains(&"Invalid package declaration 'a'".to_owned()));
    }

    #[test]
    fn imports_are_loaded_and_attached() {
        let p = provider(&[
            (
                "src/a/IFoo.aidl",
                "package a; import b.Data; interface IFoo { void f(in Data d); }",
            ),
            (
                "inc/b/Data.aidl",
                "package b; import c.Leaf; parcelable Data { Leaf leaf; }",
            ),
            ("inc/c/Leaf.aidl", "package c; parcelable Leaf { int v; }"),
        ]);
        let options = Options {
            import_paths: vec![PathBuf::from("inc")],
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let unit = load_and_validate(Path::new("src/a/IFoo.aidl"), &options, &p, &mut ctx).unwrap();
        let import = &unit.imports[0];
        assert_eq!(import.filename(), Some(Path::new("inc/b/Data.aidl")));
        let data = import.document().unwrap();
        assert_eq!(data.defined_types()[0].canonical_name(), "b.Data");
        let leaf = &data.imports()[0];
        assert_eq!(
            leaf.document().unwrap().defined_types()[0].canonical_name(),
            "c.Leaf"
        );
        let arg = &unit.defined_type.as_interface().unwrap().methods()[0].arguments()[0];
        assert_eq!(arg.type_spec().resolved_name(), Some("b.Data"));
    }

    #[test]
    fn missing_import_is_reported() {
        let p = provider(&[(
            "a/IFoo.aidl",
            "package a; import b.Gone; interface IFoo { void f(in Gone g); }",
        )]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/IFoo.aidl"), &Options::default(), &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadImport)));
        assert_eq!(messages(&ctx), vec!["couldn't find import for class b.Gone"]);
    }

    #[test]
    fn file_not_declaring_its_class_is_parsed_once() {
        let p = provider(&[
            (
                "a/IFoo.aidl",
                "package a; import b.Wrong; import c.Data; interface IFoo { void f(in c.Data d); }",
            ),
            ("inc/b/Wrong.aidl", "package b; parcelable Other {}"),
            ("inc/c/Data.aidl", "package c; import b.Wrong; parcelable Data {}"),
        ]);
        let options = Options {
            import_paths: vec![PathBuf::from("inc")],
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/IFoo.aidl"), &options, &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadImport)));
        assert_eq!(
            messages(&ctx),
            vec![
                "b.Other should be declared in a file called b/Other.aidl",
                "inc/b/Wrong.aidl does not declare b.Wrong",
            ]
        );
    }

    #[test]
    fn unresolved_type_is_bad_type() {
        let p = provider(&[("a/IFoo.aidl", "package a; interface IFoo { void f(in Foo x); }")]);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/IFoo.aidl"), &Options::default(), &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadType)));
        assert!(ctx.reporter.error_count() > 0);
    }

    #[test]
    fn structured_mode_rejects_unstructured_references() {
        let p = provider(&[
            ("a/IFoo.aidl", "package a; interface IFoo { void f(in P p); }"),
            ("pre.txt", "parcelable a.P;\n"),
        ]);
        let options = Options {
            preprocessed_files: vec![PathBuf::from("pre.txt")],
            structured: true,
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/IFoo.aidl"), &options, &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadType)));
        assert_eq!(
            messages(&ctx),
            vec!["a.P is not structured, but this is a structured interface."]
        );
    }

    #[test]
    fn bad_preprocessed_file() {
        let p = provider(&[("a/IFoo.aidl", "package a; interface IFoo {}"), ("pre.txt", "junk\n")]);
        let options = Options {
            preprocessed_files: vec![PathBuf::from("pre.txt")],
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let r = load_and_validate(Path::new("a/IFoo.aidl"), &options, &p, &mut ctx);
        assert!(matches!(r, Err(LoadError::BadPreprocessedFile)));
    }

    #[test]
    fn method_id_and_constant_failures() {
        let p = provider(&[
            ("a/IIds.aidl", "package a; interface IIds { void x() = 1; void y(); }"),
            ("a/IConst.aidl", "package a; interface IConst { const int A = 1; const int A = 2; }"),
        ]);
        let o = Options::default();
        let mut ctx = Context::with_reporter(Reporter::silent());
        assert!(matches!(
            load_and_validate(Path::new("a/IIds.aidl"), &o, &p, &mut ctx),
            Err(LoadError::BadMethodId)
        ));
        let mut ctx = Context::with_reporter(Reporter::silent());
        assert!(matches!(
            load_and_validate(Path::new("a/IConst.aidl"), &o, &p, &mut ctx),
            Err(LoadError::BadConstants)
        ));
    }

    #[test]
    fn dump_groups_by_package() {
        let p = provider(&[
            ("b/IZed.aidl", "package b; interface IZed { void z(); }"),
            ("a/IFoo.aidl", "package a; interface IFoo { int f(in String s); }"),
            ("a/Bar.aidl", "package a; parcelable Bar { int x = 3; }"),
        ]);
        let options = Options {
            input_files: vec![
                PathBuf::from("b/IZed.aidl"),
                PathBuf::from("a/IFoo.aidl"),
                PathBuf::from("a/Bar.aidl"),
            ],
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let out = dump_api(&options, &p, &mut ctx).unwrap();
        assert_eq!(
            out,
            "package a {\n\
             \x20 parcelable Bar {\n\
             \x20   int x = 3;\n\
             \x20 }\n\
             \n\
             \x20 interface IFoo {\n\
             \x20   int f(in String s);\n\
             \x20 }\n\
             \n\
             }\n\
             package b {\n\
             \x20 interface IZed {\n\
             \x20   void z();\n\
             \x20 }\n\
             \n\
             }\n"
        );
    }

    #[test]
    fn preprocess_lists_every_type() {
        let p = provider(&[
            ("a/P.aidl", "package a; parcelable P;"),
            ("a/IFoo.aidl", "package a; import x.Unknown; interface IFoo { void f(in Unknown u); }"),
        ]);
        let options = Options {
            input_files: vec![PathBuf::from("a/P.aidl"), PathBuf::from("a/IFoo.aidl")],
            ..Options::default()
        };
        let mut ctx = Context::with_reporter(Reporter::silent());
        let out = preprocess(&options, &p, &mut ctx).unwrap();
        assert_eq!(out, "parcelable a.P;\ninterface a.IFoo;\n");
    }
}
