//! Checks that run after every type specifier of a unit is resolved.

use crate::ast::{Annotatable, DefinedType, Interface, Method};
use crate::diagnostics::{Locatable, Reporter};
use crate::error::Fatal;
use crate::typenames::TypeNames;
use std::collections::{BTreeSet, HashMap};

pub const MIN_USER_SET_METHOD_ID: i32 = 0;
pub const MAX_USER_SET_METHOD_ID: i32 = 16_777_214;

/// Type-level validity of a resolved declaration. Every problem is
/// reported; returns whether there were none.
pub fn check_types(
    defined: &DefinedType,
    typenames: &TypeNames,
    reporter: &mut Reporter,
) -> Result<bool, Fatal> {
    match defined {
        DefinedType::Interface(i) => check_interface(defined, i, typenames, reporter),
        DefinedType::StructuredParcelable(p) => {
            let mut ok = true;
            for field in p.fields() {
                ok &= field.check_valid(reporter)?;
            }
            Ok(ok)
        }
        DefinedType::Parcelable(_) => Ok(true),
    }
}

fn check_interface(
    defined: &DefinedType,
    interface: &Interface,
    typenames: &TypeNames,
    reporter: &mut Reporter,
) -> Result<bool, Fatal> {
    let mut ok = true;
    if defined.is_utf8() && defined.is_utf8_in_cpp() {
        reporter.error(
            defined.location(),
            "Interface cannot be marked as both @utf8 and @utf8InCpp",
        );
        ok = false;
    }

    let mut seen: HashMap<&str, &Method> = HashMap::new();
    for m in interface.methods() {
        let oneway = m.is_oneway() || interface.is_oneway();
        ok &= m.type_spec().check_valid(reporter)?;

        if oneway && m.type_spec().name() != "void" {
            reporter.error(
                m.location(),
                format!("oneway method '{}' cannot return a value", m.name()),
            );
            ok = false;
        }

        for (i, arg) in m.arguments().iter().enumerate() {
            ok &= arg.check_valid(typenames, i + 1, reporter)?;
            if oneway && arg.is_out() {
                reporter.error(
                    m.location(),
                    format!("oneway method '{}' cannot have out parameters", m.name()),
                );
                ok = false;
            }
        }

        match seen.get(m.name()) {
            Some(previous) => {
                reporter.error(
                    m.location(),
                    format!("attempt to redefine method {}:", m.name()),
                );
                reporter.error(previous.location(), "previously defined here.");
                ok = false;
            }
            None => {
                seen.insert(m.name(), m);
            }
        }
    }
    Ok(ok)
}

/// Either every method has an explicit id or none does. Explicit ids must
/// be unique and in range; otherwise ids are handed out from 0 in
/// declaration order.
pub fn check_and_assign_method_ids(
    file: &str,
    methods: &mut [Method],
    reporter: &mut Reporter,
) -> bool {
    let mut used = BTreeSet::new();
    let mut has_unassigned = false;
    let mut has_assigned = false;
    for m in methods.iter() {
        match m.id().filter(|_| m.has_id()) {
            Some(id) => {
                has_assigned = true;
                if !used.insert(id) {
                    reporter.error(
                        m.location(),
                        format!("Found duplicate method id ({}) for method {}", id, m.name()),
                    );
                    return false;
                }
                if !(MIN_USER_SET_METHOD_ID..=MAX_USER_SET_METHOD_ID).contains(&id) {
                    reporter.error(
                        m.location(),
                        format!(
                            "Found out of bounds id ({}) for method {}. Value for id must be between {} and {} inclusive.",
                            id,
                            m.name(),
                            MIN_USER_SET_METHOD_ID,
                            MAX_USER_SET_METHOD_ID
                        ),
                    );
                    return false;
                }
            }
            None => has_unassigned = true,
        }
        if has_assigned && has_unassigned {
            reporter.error(
                file,
                "You must either assign id's to all methods or to none of them.",
            );
            return false;
        }
    }

    if has_unassigned {
        for (id, m) in (0..).zip(methods.iter_mut()) {
            m.set_id(id);
        }
    }
    true
}

/// Constant names are unique within an interface and every constant is
/// well typed.
pub fn validate_constants(interface: &Interface, reporter: &mut Reporter) -> Result<bool, Fatal> {
    let mut ok = true;
    let mut names = BTreeSet::new();
    for c in interface.constants() {
        if !names.insert(c.name()) {
            reporter.error(
                c.location(),
                format!("Found duplicate constant name '{}'", c.name()),
            );
            ok = false;
        }
        ok &= c.check_valid(reporter)?;
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Context, Driver};
    use crate::source::InMemoryProvider;
    use std::path::Path;

    /// Parse and resolve one interface file, returning its type.
    fn resolved(src: &str) -> (DefinedType, Context) {
        let mut p = InMemoryProvider::default();
        p.insert("IFoo.aidl", src);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        d.parse_file(Path::new("IFoo.aidl"), &mut ctx).unwrap();
        d.resolve(&mut ctx).unwrap();
        let t = d.take_document().unwrap().release_defined_type().unwrap();
        (t, ctx)
    }

    fn methods(t: &mut DefinedType) -> &mut [Method] {
        t.as_interface_mut().unwrap().methods_mut()
    }

    #[test]
    fn well_formed_interface_passes() {
        let (t, mut ctx) = resolved(
            "parcelable P {}\n",
        );
        assert!(check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());

        let (t, mut ctx) = resolved(
            "interface IFoo { void a(in int x, out int[] y, inout List<String> z); int b(); }",
        );
        assert!(check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
        assert_eq!(ctx.reporter.error_count(), 0);
    }

    #[test]
    fn oneway_rules() {
        let (t, mut ctx) = resolved(
            "oneway interface IFoo { int a(); void b(out int[] x); }",
        );
        assert!(!check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
        let msgs: Vec<&str> = ctx
            .reporter
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            msgs,
            vec![
                "oneway method 'a' cannot return a value",
                "oneway method 'b' cannot have out parameters",
            ]
        );
    }

    #[test]
    fn direction_rules() {
        let (t, mut ctx) = resolved("interface IFoo { void a(int[] x); void b(out String s); }");
        assert!(!check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
        let d = ctx.reporter.diagnostics();
        assert_eq!(d.len(), 2);
        assert!(d[0]
            .message
            .contains("can be an out type, so you must declare it as in, out, or inout"));
        assert!(d[1].message.contains("can only be an in parameter"));
    }

    #[test]
    fn reserved_argument_names() {
        let (t, mut ctx) = resolved("interface IFoo { void a(in int _aidl_x, in int final); }");
        assert!(!check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
        assert_eq!(ctx.reporter.error_count(), 2);
    }

    #[test]
    fn both_utf8_annotations_conflict() {
        let (t, mut ctx) = resolved("@utf8 @utf8InCpp interface IFoo { }");
        assert!(!check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
    }

    #[test]
    fn redefined_method_reports_both_sites() {
        let (t, mut ctx) = resolved("interface IFoo { void a(); void a(in int x); }");
        assert!(!check_types(&t, &ctx.typenames, &mut ctx.reporter).unwrap());
        let d = ctx.reporter.diagnostics();
        assert_eq!(d[0].message, "attempt to redefine method a:");
        assert_eq!(d[1].message, "previously defined here.");
    }

    #[test]
    fn ids_assigned_densely_when_absent() {
        let (mut t, mut ctx) = resolved("interface IFoo { void a(); void b(); void c(); }");
        assert!(check_and_assign_method_ids("IFoo.aidl", methods(&mut t), &mut ctx.reporter));
        let ids: Vec<Option<i32>> = methods(&mut t).iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn explicit_ids_kept() {
        let (mut t, mut ctx) = resolved("interface IFoo { void a() = 10; void b() = 3; }");
        assert!(check_and_assign_method_ids("IFoo.aidl", methods(&mut t), &mut ctx.reporter));
        let ids: Vec<Option<i32>> = methods(&mut t).iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![Some(10), Some(3)]);
    }

    #[test]
    fn mixed_duplicate_and_out_of_range_ids_rejected() {
        for src in [
            "interface IFoo { void a() = 1; void b(); }",
            "interface IFoo { void a() = 1; void b() = 1; }",
            "interface IFoo { void a() = 16777215; }",
            "interface IFoo { void a() = -1; }",
        ] {
            let (mut t, mut ctx) = resolved(src);
            assert!(
                !check_and_assign_method_ids("IFoo.aidl", methods(&mut t), &mut ctx.reporter),
                "{}",
                src
            );
            assert_eq!(ctx.reporter.error_count(), 1);
        }
    }

    #[test]
    fn constants_checked() {
        let (t, mut ctx) = resolved(
            "interface IFoo { const int A = 1; const int A = 2; const String S = 3; }",
        );
        let i = t.as_interface().unwrap();
        assert!(!validate_constants(i, &mut ctx.reporter).unwrap());
        assert_eq!(ctx.reporter.error_count(), 2);
        assert!(ctx.reporter.diagnostics()[0]
            .message
            .contains("duplicate constant name 'A'"));
    }
}
