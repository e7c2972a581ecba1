/// Entry discovered during recursive retrieval and emitted on the caller's
/// channel. Directories are emitted before their contents are explored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    name: String,
    relative_dir: String,
    is_file: bool,
}

impl RemoteEntry {
    pub(crate) fn new(name: String, relative_dir: String, is_file: bool) -> Self {
        Self {
            name,
            relative_dir,
            is_file,
        }
    }

    /// Base name of the entry, without any path separators.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the containing directory relative to the traversal root.
    /// Empty for entries found at the root level, no leading separator.
    #[must_use]
    pub fn relative_dir(&self) -> &str {
        &self.relative_dir
    }

    /// Returns `true` for a regular file, `false` for a directory.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.is_file
    }
}
