use serde::Deserialize;
use std::path::PathBuf;

/// Settings of one compiler invocation.
///
/// Deserializable so front ends can read it from a config file; command
/// line values are layered on top with [`merge`](Options::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Roots searched, in order, for imported declaration files.
    pub import_paths: Vec<PathBuf>,
    /// Files listing types by name only.
    pub preprocessed_files: Vec<PathBuf>,
    pub input_files: Vec<PathBuf>,
    /// Reject units that reference unstructured parcelables.
    pub structured: bool,
    /// Treat a file that only declares unstructured parcelables as an
    /// error instead of skipping it.
    pub fail_on_parcelable: bool,
}

impl Options {
    /// Append `other`'s lists after ours; flags are or-ed.
    pub fn merge(&mut self, other: Options) {
        self.import_paths.extend(other.import_paths);
        self.preprocessed_files.extend(other.preprocessed_files);
        self.input_files.extend(other.input_files);
        self.structured |= other.structured;
        self.fail_on_parcelable |= other.fail_on_parcelable;
    }
}
