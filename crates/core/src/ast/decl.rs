use super::{ConstantType, ConstantValue, TypeSpecifier};
use crate::diagnostics::{Locatable, Location, Reporter};
use crate::error::Fatal;
use crate::typenames::TypeNames;
use std::fmt;

/// Names that cannot be used for arguments: they clash with keywords of the
/// generated Java code or of this language.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null",
];

pub(crate) fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

// ──────────────────────────────────────────────
// Variable declarations
// ──────────────────────────────────────────────

/// `type name [= default]`, used for parcelable fields and as the base of
/// [`Argument`].
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub(crate) location: Location,
    pub(crate) type_: TypeSpecifier,
    pub(crate) name: String,
    pub(crate) default_value: Option<ConstantValue>,
}

impl VariableDeclaration {
    pub fn new(
        location: Location,
        type_: TypeSpecifier,
        name: impl Into<String>,
        default_value: Option<ConstantValue>,
    ) -> Self {
        VariableDeclaration {
            location,
            type_,
            name: name.into(),
            default_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_spec(&self) -> &TypeSpecifier {
        &self.type_
    }

    pub fn type_spec_mut(&mut self) -> &mut TypeSpecifier {
        &mut self.type_
    }

    pub fn default_value(&self) -> Option<&ConstantValue> {
        self.default_value.as_ref()
    }

    pub fn check_valid(&self, reporter: &mut Reporter) -> Result<bool, Fatal> {
        self.type_.check_valid(reporter)
    }

    pub fn signature(&self) -> String {
        format!("{} {}", self.type_.signature(), self.name)
    }
}

impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_, self.name)?;
        if let Some(v) = &self.default_value {
            write!(f, " = {}", v)?;
        }
        Ok(())
    }
}

impl Locatable for VariableDeclaration {
    fn location(&self) -> &Location {
        &self.location
    }
}

// ──────────────────────────────────────────────
// Arguments
// ──────────────────────────────────────────────

/// Data flow of an argument. The discriminants are bit flags:
/// `InOut == In | Out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In = 1,
    Out = 2,
    InOut = 3,
}

impl Direction {
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn is_in(self) -> bool {
        self.bits() & Direction::In.bits() != 0
    }

    pub fn is_out(self) -> bool {
        self.bits() & Direction::Out.bits() != 0
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::InOut => "inout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub(crate) var: VariableDeclaration,
    direction: Direction,
    direction_specified: bool,
}

impl Argument {
    /// Argument with an explicit `in`/`out`/`inout` marker.
    pub fn new(
        location: Location,
        direction: Direction,
        type_: TypeSpecifier,
        name: impl Into<String>,
    ) -> Self {
        Argument {
            var: VariableDeclaration::new(location, type_, name, None),
            direction,
            direction_specified: true,
        }
    }

    /// Argument without a marker; treated as `in`.
    pub fn unmarked(location: Location, type_: TypeSpecifier, name: impl Into<String>) -> Self {
        Argument {
            var: VariableDeclaration::new(location, type_, name, None),
            direction: Direction::In,
            direction_specified: false,
        }
    }

    pub fn name(&self) -> &str {
        self.var.name()
    }

    pub fn type_spec(&self) -> &TypeSpecifier {
        self.var.type_spec()
    }

    pub fn type_spec_mut(&mut self) -> &mut TypeSpecifier {
        self.var.type_spec_mut()
    }

    pub fn as_variable(&self) -> &VariableDeclaration {
        &self.var
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_in(&self) -> bool {
        self.direction.is_in()
    }

    pub fn is_out(&self) -> bool {
        self.direction.is_out()
    }

    pub fn direction_was_specified(&self) -> bool {
        self.direction_specified
    }

    /// Type validity plus direction and naming rules. `index` is 1-based
    /// and only used in messages.
    pub fn check_valid(
        &self,
        typenames: &TypeNames,
        index: usize,
        reporter: &mut Reporter,
    ) -> Result<bool, Fatal> {
        if !self.var.check_valid(reporter)? {
            return Ok(false);
        }
        let prefix = format!("parameter {} (argument {}): ", self.name(), index);
        let can_be_out = typenames.can_be_out_parameter(self.type_spec());
        if !self.direction_specified && can_be_out {
            reporter.error(
                &self.var.location,
                format!(
                    "{}'{}' can be an out type, so you must declare it as in, out, or inout.",
                    prefix,
                    self.type_spec()
                ),
            );
            return Ok(false);
        }
        if self.direction != Direction::In && !can_be_out {
            reporter.error(
                &self.var.location,
                format!("{}'{}' can only be an in parameter.", prefix, self),
            );
            return Ok(false);
        }
        if is_reserved_word(self.name()) {
            reporter.error(
                &self.var.location,
                format!("{}Argument name is a Java or aidl keyword", prefix),
            );
            return Ok(false);
        }
        if self.name().starts_with("_aidl") {
            reporter.error(
                &self.var.location,
                format!("{}Argument name cannot begin with '_aidl'", prefix),
            );
            return Ok(false);
        }
        Ok(true)
    }

    pub fn signature(&self) -> String {
        self.var.signature()
    }
}

/// `[direction ]type name`, the direction only when it was written.
impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction_specified {
            write!(f, "{} ", self.direction.keyword())?;
        }
        write!(f, "{} {}", self.var.type_, self.var.name)
    }
}

impl Locatable for Argument {
    fn location(&self) -> &Location {
        &self.var.location
    }
}

// ──────────────────────────────────────────────
// Methods
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Method {
    pub(crate) location: Location,
    oneway: bool,
    comments: String,
    pub(crate) type_: TypeSpecifier,
    name: String,
    pub(crate) arguments: Vec<Argument>,
    /// Indices into `arguments`; an `inout` argument is in both lists.
    in_arguments: Vec<usize>,
    out_arguments: Vec<usize>,
    has_id: bool,
    id: Option<i32>,
}

impl Method {
    pub fn new(
        location: Location,
        oneway: bool,
        type_: TypeSpecifier,
        name: impl Into<String>,
        arguments: Vec<Argument>,
        comments: impl Into<String>,
        id: Option<i32>,
    ) -> Self {
        let mut in_arguments = Vec::new();
        let mut out_arguments = Vec::new();
        for (i, a) in arguments.iter().enumerate() {
            if a.is_in() {
                in_arguments.push(i);
            }
            if a.is_out() {
                out_arguments.push(i);
            }
        }
        Method {
            location,
            oneway,
            comments: comments.into(),
            type_,
            name: name.into(),
            arguments,
            in_arguments,
            out_arguments,
            has_id: id.is_some(),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn type_spec(&self) -> &TypeSpecifier {
        &self.type_
    }

    pub fn type_spec_mut(&mut self) -> &mut TypeSpecifier {
        &mut self.type_
    }

    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    /// Methods of a oneway interface are oneway themselves.
    pub(crate) fn apply_interface_oneway(&mut self, oneway: bool) {
        self.oneway |= oneway;
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut [Argument] {
        &mut self.arguments
    }

    /// Arguments whose direction includes `in`, in declaration order.
    pub fn in_arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.in_arguments.iter().map(move |&i| &self.arguments[i])
    }

    /// Arguments whose direction includes `out`, in declaration order.
    pub fn out_arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.out_arguments.iter().map(move |&i| &self.arguments[i])
    }

    pub fn in_argument_indices(&self) -> &[usize] {
        &self.in_arguments
    }

    pub fn out_argument_indices(&self) -> &[usize] {
        &self.out_arguments
    }

    /// Whether the id was written in source.
    pub fn has_id(&self) -> bool {
        self.has_id
    }

    /// Explicit id, or the one assigned by the id pass.
    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    /// `name(type, type, ...)`, used to identify overloads.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|a| a.type_spec().to_string())
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

/// The method as it would be declared, without the trailing `;`.
impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.oneway {
            f.write_str("oneway ")?;
        }
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        write!(
            f,
            "{} {}({})",
            self.type_.signature(),
            self.name,
            args.join(", ")
        )?;
        if self.has_id {
            if let Some(id) = self.id {
                write!(f, " = {}", id)?;
            }
        }
        Ok(())
    }
}

impl Locatable for Method {
    fn location(&self) -> &Location {
        &self.location
    }
}

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

/// `const type NAME = value;` inside an interface.
#[derive(Debug, Clone)]
pub struct ConstantDeclaration {
    pub(crate) location: Location,
    pub(crate) type_: TypeSpecifier,
    name: String,
    value: ConstantValue,
}

impl ConstantDeclaration {
    pub fn new(
        location: Location,
        type_: TypeSpecifier,
        name: impl Into<String>,
        value: ConstantValue,
    ) -> Self {
        ConstantDeclaration {
            location,
            type_,
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_spec(&self) -> &TypeSpecifier {
        &self.type_
    }

    pub fn value(&self) -> &ConstantValue {
        &self.value
    }

    /// Only `int` and `String` constants are supported, and the value must
    /// have the declared type.
    pub fn check_valid(&self, reporter: &mut Reporter) -> Result<bool, Fatal> {
        if !self.type_.check_valid(reporter)? {
            return Ok(false);
        }
        let value_type = self.value.value_type();
        if value_type == ConstantType::Error {
            // already reported when the literal was parsed
            return Ok(false);
        }
        let expected = match self.type_.to_string().as_str() {
            "int" => ConstantType::Integer,
            "String" => ConstantType::String,
            other => {
                reporter.error(
                    &self.location,
                    format!("Constant '{}' has unsupported type '{}'", self.name, other),
                );
                return Ok(false);
            }
        };
        if value_type != expected {
            reporter.error(
                &self.location,
                format!(
                    "Constant '{}' is declared as {} but its value is of type {}",
                    self.name, self.type_, value_type
                ),
            );
            return Ok(false);
        }
        Ok(true)
    }
}

impl fmt::Display for ConstantDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "const {} {} = {}",
            self.type_.signature(),
            self.name,
            self.value
        )
    }
}

impl Locatable for ConstantDeclaration {
    fn location(&self) -> &Location {
        &self.location
    }
}

// ──────────────────────────────────────────────
// Members
// ──────────────────────────────────────────────

/// An interface member. The set of member kinds is closed.
#[derive(Debug, Clone)]
pub enum Member {
    Method(Method),
    Constant(ConstantDeclaration),
}

impl Member {
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Member::Method(m) => Some(m),
            Member::Constant(_) => None,
        }
    }

    pub fn as_constant_declaration(&self) -> Option<&ConstantDeclaration> {
        match self {
            Member::Method(_) => None,
            Member::Constant(c) => Some(c),
        }
    }
}

impl Locatable for Member {
    fn location(&self) -> &Location {
        match self {
            Member::Method(m) => m.location(),
            Member::Constant(c) => c.location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeSpecifier {
        TypeSpecifier::new(Location::nowhere(), name, false, None, "")
    }

    fn arg(dir: Direction, name: &str) -> Argument {
        Argument::new(Location::nowhere(), dir, ty("int"), name)
    }

    fn bar() -> Method {
        Method::new(
            Location::nowhere(),
            false,
            ty("void"),
            "bar",
            vec![
                arg(Direction::In, "x"),
                arg(Direction::Out, "y"),
                arg(Direction::InOut, "z"),
            ],
            "",
            None,
        )
    }

    #[test]
    fn direction_bits_combine() {
        assert_eq!(Direction::InOut.bits(), Direction::In.bits() | Direction::Out.bits());
        assert!(Direction::InOut.is_in() && Direction::InOut.is_out());
        assert!(!Direction::Out.is_in());
    }

    #[test]
    fn inout_argument_appears_in_both_partitions() {
        let m = bar();
        let ins: Vec<&str> = m.in_arguments().map(|a| a.name()).collect();
        let outs: Vec<&str> = m.out_arguments().map(|a| a.name()).collect();
        assert_eq!(ins, vec!["x", "z"]);
        assert_eq!(outs, vec!["y", "z"]);
        // owned exactly once
        assert_eq!(m.arguments().len(), 3);
        assert_eq!(m.arguments().iter().filter(|a| a.name() == "z").count(), 1);
        assert_eq!(m.in_argument_indices(), &[0, 2]);
        assert_eq!(m.out_argument_indices(), &[1, 2]);
    }

    #[test]
    fn method_id_presence_is_recorded() {
        let mut m = bar();
        assert!(!m.has_id());
        assert_eq!(m.id(), None);
        m.set_id(4);
        assert!(!m.has_id());
        assert_eq!(m.id(), Some(4));

        let explicit = Method::new(Location::nowhere(), true, ty("void"), "f", vec![], "", Some(9));
        assert!(explicit.has_id());
        assert_eq!(explicit.to_string(), "oneway void f() = 9");
    }

    #[test]
    fn method_text_forms() {
        let m = bar();
        assert_eq!(m.signature(), "bar(int, int, int)");
        assert_eq!(m.to_string(), "void bar(in int x, out int y, inout int z)");
    }

    #[test]
    fn unmarked_argument_is_in() {
        let a = Argument::unmarked(Location::nowhere(), ty("int"), "x");
        assert!(a.is_in());
        assert!(!a.direction_was_specified());
        assert_eq!(a.to_string(), "int x");
    }

    #[test]
    fn constant_must_match_declared_type() {
        let names = TypeNames::new();
        let mut r = Reporter::silent();
        let mut t = ty("int");
        assert!(t.resolve(&names));
        let good = ConstantDeclaration::new(
            Location::nowhere(),
            t.clone(),
            "A",
            ConstantValue::literal_int(Location::nowhere(), 3),
        );
        assert!(good.check_valid(&mut r).unwrap());
        assert_eq!(good.to_string(), "const int A = 3");

        let bad = ConstantDeclaration::new(
            Location::nowhere(),
            t,
            "B",
            ConstantValue::parse_string(Location::nowhere(), "\"x\"", &mut r),
        );
        assert!(!bad.check_valid(&mut r).unwrap());
        assert_eq!(r.error_count(), 1);
    }

    #[test]
    fn member_probes_are_exclusive() {
        let m = Member::Method(bar());
        assert!(m.as_method().is_some());
        assert!(m.as_constant_declaration().is_none());
    }
}
