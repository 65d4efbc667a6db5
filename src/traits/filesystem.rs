use anyhow::{Context, Result};
use std::path::Path;

/// Filesystem access used by the export, kept behind a trait so runs can be tested in memory
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write a file, creating missing parent directories
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    fn remove_file(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dir_all(parent)?;
        }

        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
pub use mock::MockFileSystem;

#[cfg(test)]
mod mock {
    use super::FileSystem;
    use anyhow::{Context, Result};
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::{Path, PathBuf};
    use std::sync::RwLock;

    #[derive(Default)]
    struct Tree {
        files: BTreeMap<PathBuf, String>,
        directories: BTreeSet<PathBuf>,
    }

    /// In-memory filesystem that records every file written
    #[derive(Default)]
    pub struct MockFileSystem {
        tree: RwLock<Tree>,
    }

    impl MockFileSystem {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_file_contents(&self, path: &Path) -> Option<String> {
            self.tree.read().unwrap().files.get(path).cloned()
        }

        pub fn has_file(&self, path: &Path) -> bool {
            self.tree.read().unwrap().files.contains_key(path)
        }

        /// Written files in path order
        pub fn list_files(&self) -> Vec<PathBuf> {
            self.tree.read().unwrap().files.keys().cloned().collect()
        }
    }

    impl FileSystem for MockFileSystem {
        fn read_to_string(&self, path: &Path) -> Result<String> {
            self.get_file_contents(path)
                .with_context(|| format!("Failed to read file: {:?}", path))
        }

        fn write(&self, path: &Path, contents: &str) -> Result<()> {
            if let Some(parent) = path.parent() {
                self.create_dir_all(parent)?;
            }

            self.tree
                .write()
                .unwrap()
                .files
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }

        fn create_dir_all(&self, path: &Path) -> Result<()> {
            let mut tree = self.tree.write().unwrap();
            tree.directories
                .extend(path.ancestors().map(Path::to_path_buf));
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> Result<()> {
            self.tree
                .write()
                .unwrap()
                .files
                .remove(path)
                .map(|_| ())
                .with_context(|| format!("Failed to remove file: {:?}", path))
        }

        fn exists(&self, path: &Path) -> bool {
            let tree = self.tree.read().unwrap();
            tree.files.contains_key(path) || tree.directories.contains(path)
        }
    }

    mod tests {
        use super::*;

        #[test]
        fn test_write_creates_parents() {
            let fs = MockFileSystem::new();
            fs.write(Path::new("/work/modules/network/main.tf"), "# network")
                .unwrap();

            assert!(fs.exists(Path::new("/work/modules")));
            assert!(fs.exists(Path::new("/work/modules/network/main.tf")));
            assert_eq!(
                fs.read_to_string(Path::new("/work/modules/network/main.tf")).unwrap(),
                "# network"
            );
        }

        #[test]
        fn test_remove_missing_file_fails() {
            let fs = MockFileSystem::new();

            assert!(fs.remove_file(Path::new("/work/module_imports.tf")).is_err());
        }
    }
}
