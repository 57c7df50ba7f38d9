use crate::diagnostics::{Locatable, Location, Reporter};
use std::fmt;

/// The kind of a [`ConstantValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantType {
    Error,
    Integer,
    String,
}

impl fmt::Display for ConstantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstantType::Error => "error",
            ConstantType::Integer => "int",
            ConstantType::String => "String",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Error,
    Integer(i32),
    /// Literal text including the surrounding quotes.
    String(String),
}

/// A typed literal used as a default value or an interface constant.
///
/// Literal parse failures produce an error-typed value instead of aborting,
/// so the enclosing declaration can be rejected later by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantValue {
    location: Location,
    value: Value,
}

impl ConstantValue {
    pub fn literal_int(location: Location, value: i32) -> Self {
        ConstantValue {
            location,
            value: Value::Integer(value),
        }
    }

    /// Decimal integer, e.g. `"42"` or `"-7"`.
    pub fn parse_int(location: Location, text: &str, reporter: &mut Reporter) -> Self {
        match text.parse::<i32>() {
            Ok(n) => ConstantValue::literal_int(location, n),
            Err(_) => {
                reporter.error(&location, format!("Found invalid int value '{}'", text));
                ConstantValue::error(location)
            }
        }
    }

    /// Hex integer, e.g. `"0x4f"`. Any 32-bit pattern is accepted and
    /// reinterpreted as signed, so `0xffffffff` is -1.
    pub fn parse_hex(location: Location, text: &str, reporter: &mut Reporter) -> Self {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or("");
        match u32::from_str_radix(digits, 16) {
            Ok(n) if !digits.is_empty() => ConstantValue::literal_int(location, n as i32),
            _ => {
                reporter.error(&location, format!("Found invalid int value '{}'", text));
                ConstantValue::error(location)
            }
        }
    }

    /// Quoted string literal, e.g. `"\"asdf\""`. Control characters,
    /// non-ASCII characters and backslashes are rejected.
    pub fn parse_string(location: Location, text: &str, reporter: &mut Reporter) -> Self {
        for (i, c) in text.chars().enumerate() {
            if (c as u32) <= 0x1f || (c as u32) >= 0x7f || c == '\\' {
                reporter.error(
                    &location,
                    format!(
                        "Found invalid character at index {} in string constant '{}'",
                        i, text
                    ),
                );
                return ConstantValue::error(location);
            }
        }
        ConstantValue {
            location,
            value: Value::String(text.to_owned()),
        }
    }

    fn error(location: Location) -> Self {
        ConstantValue {
            location,
            value: Value::Error,
        }
    }

    pub fn value_type(&self) -> ConstantType {
        match self.value {
            Value::Error => ConstantType::Error,
            Value::Integer(_) => ConstantType::Integer,
            Value::String(_) => ConstantType::String,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self.value {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// String contents without the quotes.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s.trim_start_matches('"').trim_end_matches('"')),
            _ => None,
        }
    }
}

/// Renders the literal as it would appear in source. Error values render
/// as an empty string; callers check [`value_type`](ConstantValue::value_type)
/// before emitting one.
impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Error => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Locatable for ConstantValue {
    fn location(&self) -> &Location {
        &self.location
    }
}
