//! Preprocessed type files: one `<decl> <qualified.Name>;` line per type,
//! used to make types known without parsing their declaration files.

use crate::ast::{DefinedKind, Document};
use crate::diagnostics::{Location, Point, Reporter};
use crate::source::SourceProvider;
use crate::typenames::{TypeNames, TypeRecord};
use std::fmt::Write;
use std::path::Path;

/// Split one line into its kind and record. `None` for a malformed line.
pub fn parse_line(line: &str) -> Option<TypeRecord> {
    let body = line.trim().strip_suffix(';')?;
    let mut words = body.split_whitespace();
    let kind = DefinedKind::from_declaration_name(words.next()?)?;
    let qualified = words.next()?;
    if words.next().is_some() {
        return None;
    }
    let (package, name) = match qualified.rsplit_once('.') {
        Some((package, name)) => (package.split('.').map(str::to_owned).collect(), name),
        None => (Vec::new(), qualified),
    };
    if name.is_empty() {
        return None;
    }
    Some(TypeRecord::new(kind, name, package))
}

/// Read `path` and register every listed type as preprocessed. Stops at
/// the first malformed line; returns `false` if the file is unreadable or
/// malformed.
pub fn read_preprocessed_file(
    provider: &dyn SourceProvider,
    path: &Path,
    typenames: &mut TypeNames,
    reporter: &mut Reporter,
) -> bool {
    let text = match provider.read_source(path) {
        Ok(t) => t,
        Err(e) => {
            reporter.error(path, format!("cannot open preprocessed file: {}", e));
            return false;
        }
    };
    let file = path.display().to_string();
    let mut count = 0;
    for (index, line) in text.lines().enumerate() {
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        match parse_line(line) {
            Some(record) => {
                typenames.add_preprocessed_type(record);
                count += 1;
            }
            None => {
                let point = Point::new(index as u32 + 1, 0);
                let location = Location::new(file.as_str(), point, point);
                reporter.error(
                    &location,
                    format!("malformed preprocessed file line: '{}'", line),
                );
                return false;
            }
        }
    }
    tracing::debug!(file = %file, types = count, "preprocessed file loaded");
    true
}

/// One line per defined type of each document, in document order.
pub fn write_preprocessed<'d>(documents: impl IntoIterator<Item = &'d Document>) -> String {
    let mut out = String::new();
    for doc in documents {
        for t in doc.defined_types() {
            // writing to a String cannot fail
            let _ = writeln!(
                out,
                "{} {};",
                t.preprocess_declaration_name(),
                t.canonical_name()
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DefinedType, Parcelable, QualifiedName, StructuredParcelable};
    use crate::source::InMemoryProvider;

    #[test]
    fn line_splits_package_at_last_dot() {
        let r = parse_line("interface android.os.IFoo;").unwrap();
        assert_eq!(r.kind, DefinedKind::Interface);
        assert_eq!(r.name, "IFoo");
        assert_eq!(r.package, vec!["android".to_string(), "os".to_string()]);
        assert_eq!(r.canonical_name(), "android.os.IFoo");

        let bare = parse_line("structured_parcelable Top;").unwrap();
        assert!(bare.package.is_empty());
    }

    #[test]
    fn malformed_lines_rejected() {
        assert!(parse_line("interface a.IFoo").is_none());
        assert!(parse_line("enum a.E;").is_none());
        assert!(parse_line("parcelable a b;").is_none());
        assert!(parse_line("parcelable a.;").is_none());
    }

    #[test]
    fn file_registers_types_and_skips_comments() {
        let mut p = InMemoryProvider::default();
        p.insert(
            "pre.txt",
            "// generated\n\nparcelable a.P;\ninterface a.IFoo;\n",
        );
        let mut names = TypeNames::new();
        let mut r = Reporter::silent();
        assert!(read_preprocessed_file(&p, Path::new("pre.txt"), &mut names, &mut r));
        assert_eq!(names.resolve_typename("IFoo").as_deref(), Some("a.IFoo"));
        assert_eq!(names.iter().count(), 2);
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let mut p = InMemoryProvider::default();
        p.insert("pre.txt", "parcelable a.P;\nbogus\n");
        let mut names = TypeNames::new();
        let mut r = Reporter::silent();
        assert!(!read_preprocessed_file(&p, Path::new("pre.txt"), &mut names, &mut r));
        assert_eq!(
            r.diagnostics()[0].line(),
            "ERROR: pre.txt:2.0-0: malformed preprocessed file line: 'bogus'"
        );
    }

    #[test]
    fn structured_and_bare_parcelables_write_different_keywords() {
        let q = |n: &str| QualifiedName::new(Location::nowhere(), n, "");
        let doc = Document::new(
            vec![
                DefinedType::Parcelable(Parcelable::new(
                    Location::nowhere(),
                    q("Foo"),
                    vec!["p".into()],
                    "",
                )),
                DefinedType::StructuredParcelable(StructuredParcelable::new(
                    Location::nowhere(),
                    q("Bar"),
                    vec!["p".into()],
                    vec![],
                )),
            ],
            vec![],
        );
        assert_eq!(
            write_preprocessed([&doc]),
            "parcelable p.Foo;\nstructured_parcelable p.Bar;\n"
        );
    }
}
