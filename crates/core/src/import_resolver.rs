use crate::source::SourceProvider;
use std::path::{Path, PathBuf};

/// Maps an imported class name to the file that declares it.
pub struct ImportResolver<'p> {
    provider: &'p dyn SourceProvider,
    import_paths: Vec<PathBuf>,
    input_files: Vec<PathBuf>,
}

impl<'p> ImportResolver<'p> {
    pub fn new(
        provider: &'p dyn SourceProvider,
        import_paths: &[PathBuf],
        input_files: &[PathBuf],
    ) -> Self {
        ImportResolver {
            provider,
            import_paths: import_paths.to_vec(),
            input_files: input_files.to_vec(),
        }
    }

    /// `a.b.C` is looked for as `a/b/C.aidl` under each import path in
    /// order, then among the input files by path suffix.
    pub fn find_import_file(&self, canonical_name: &str) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for term in canonical_name.split('.') {
            relative.push(term);
        }
        relative.set_extension("aidl");

        for root in &self.import_paths {
            let candidate = root.join(&relative);
            if self.provider.exists(&candidate) {
                tracing::trace!(class = canonical_name, path = %candidate.display(), "import found");
                return Some(candidate);
            }
        }
        self.input_files
            .iter()
            .find(|f| Path::new(f).ends_with(&relative))
            .cloned()
    }
}
