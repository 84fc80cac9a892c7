//! Directory-backed [`ResultStore`], for aggregating straight off the /fsx mount

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ObjectSummary, ResultStore};
use crate::error::Result;

/// Treats files under `root` as objects keyed by their `/`-separated relative path
#[derive(Debug, Clone)]
pub struct LocalResultStore {
    root: PathBuf,
}

impl LocalResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collect(&self, dir: &Path, objects: &mut Vec<ObjectSummary>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect(&path, objects)?;
            } else if file_type.is_file() {
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                objects.push(ObjectSummary::new(key, entry.metadata()?.len()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for LocalResultStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        if self.root.is_dir() {
            self.collect(&self.root, &mut objects)?;
        }
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn read_object(&self, key: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(key))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{aggregate_results, ParseMode};
    use approx::assert_relative_eq;

    #[tokio::test]
    async fn test_local_store_lists_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("output/batch-2")).unwrap();
        fs::write(dir.path().join("output/a.txt"), "120.5").unwrap();
        fs::write(dir.path().join("output/batch-2/b.txt"), "79.5").unwrap();
        fs::write(dir.path().join("output/c.csv"), "999").unwrap();
        fs::write(dir.path().join("output/d.txt"), "").unwrap();

        let store = LocalResultStore::new(dir.path());
        let listed = store.list_objects("output/").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["output/a.txt", "output/batch-2/b.txt", "output/c.csv", "output/d.txt"]
        );

        let total = aggregate_results(&store, "output/", ".txt", ParseMode::Strict)
            .await
            .unwrap();
        assert_relative_eq!(total.total, 200.0);
    }

    #[tokio::test]
    async fn test_missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalResultStore::new(dir.path().join("not-there"));
        assert!(store.list_objects("").await.unwrap().is_empty());
    }
}
