#![allow(clippy::result_large_err)]
//! aidl-core: front end for AIDL interface definition files.
//!
//! Turns `.aidl` source into a resolved, validated model that code
//! generators consume.
//!
//! # Public API
//!
//! - [`load_and_validate()`] -- load one input file with its import closure
//!   and run every check, producing a [`LoadedUnit`]
//! - [`Driver`] / [`Context`] -- per-file parsing and resolution against a
//!   shared [`TypeNames`] registry
//! - [`Reporter`] -- collects user-facing diagnostics
//! - [`serialize_unit()`] -- JSON export of a loaded unit
//! - [`dump_api()`] / [`preprocess()`] -- multi-file outputs

pub mod ast;
pub mod code_writer;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod import_resolver;
pub mod lexer;
pub mod load;
pub mod options;
pub mod parser;
pub mod preprocessed;
pub mod serialize;
pub mod source;
pub mod typenames;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{DefinedType, Document, Import, TypeSpecifier};
pub use diagnostics::{Diagnostic, Location, Reporter};
pub use driver::{Context, Driver};
pub use error::{Fatal, LoadError, ParseFailure};
pub use options::Options;
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use typenames::TypeNames;

// ── Convenience re-exports: entry points ─────────────────────────────

pub use load::{dump_api, load_and_validate, preprocess, LoadedUnit};
pub use serialize::serialize_unit;
