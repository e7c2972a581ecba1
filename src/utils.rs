use std::io;
use std::path::Path;

/// Resolves the full remote path of a directory or file. An empty boot
/// directory means relative paths are already remote-absolute.
pub fn remote_full_path(boot_dir: &str, relative_path: &str) -> String {
    if boot_dir.is_empty() {
        relative_path.to_owned()
    } else {
        format!("{}/{}", boot_dir, relative_path)
    }
}

/// Resolves the local path mirroring a discovered remote directory. With an
/// empty boot directory the path is made working-directory relative by
/// trimming any leading separators.
pub fn local_dir_path(boot_dir: &str, relative_dir: &str, name: &str) -> String {
    if boot_dir.is_empty() {
        format!("{}/{}", relative_dir, name)
            .trim_start_matches('/')
            .to_owned()
    } else {
        format!("{}/{}/{}", boot_dir, relative_dir, name)
    }
}

/// Relative path of a child directory, accumulated across recursive calls.
/// Leading separators are trimmed so a traversal rooted at "" never produces
/// "/name" or "//" components.
pub fn child_relative_path(relative_dir: &str, name: &str) -> String {
    format!("{}/{}", relative_dir, name)
        .trim_start_matches('/')
        .to_owned()
}

/// Suffix match against the configured extension allow-list, case-sensitive.
pub fn matches_extension(file_name: &str, extends: &[String]) -> bool {
    extends
        .iter()
        .any(|ext| file_name.ends_with(&format!(".{}", ext)))
}

/// Creates the local directory tree if absent. Succeeds when it already
/// exists.
pub async fn ensure_dir(dir_path: &str) -> io::Result<()> {
    if !Path::new(dir_path).exists() {
        tokio::fs::create_dir_all(dir_path).await?;
    }
    Ok(())
}


#[cfg(test)]
mod test_extensions {
    use super::matches_extension;

    fn extends(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_matching_suffix() {
        assert!(matches_extension("report.txt", &extends(&["log", "txt"])));
    }

    #[test]
    fn test_non_matching_suffix() {
        assert!(!matches_extension("report.txt", &extends(&["log"])));
        assert!(!matches_extension("txt", &extends(&["txt"])));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(!matches_extension("report.TXT", &extends(&["txt"])));
    }

    #[test]
    fn test_dot_is_required() {
        assert!(!matches_extension("reporttxt", &extends(&["txt"])));
    }
}

#[cfg(test)]
mod test_ensure_dir {
    use super::ensure_dir;

    #[tokio::test]
    async fn test_creates_nested_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b/c");
        let dir = dir.to_str().unwrap();

        ensure_dir(dir).await.unwrap();
        assert!(std::path::Path::new(dir).is_dir());
        ensure_dir(dir).await.unwrap();
    }
}
