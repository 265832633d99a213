use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, ErrorKind, Seek, Write},
    ops::DerefMut,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::fs_std::FileExt;
use serde_json::Value;
use tracing::{debug, warn};

/// Interface for abstracting the durable key-value facility of the host. Values are plain JSON
/// values so that the store doesn't need to know what is stored in it.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stages a value. Nothing is durable until [KeyValueStore::commit] is called.
    fn set(&mut self, key: &str, value: Value);

    /// Makes all staged values durable.
    fn commit(&mut self) -> Result<()>;
}

impl<T> KeyValueStore for T
where
    T: DerefMut + Send,
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        (**self).set(key, value)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Keeps values in memory only. Useful for hosts that persist elsewhere and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The main realization of [KeyValueStore]. All values of a namespace live in a single JSON
/// object stored in `<dir>/<namespace>.json`.
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FilePreferences {
    /// Opens the preferences of `namespace`. A missing file means empty preferences.
    pub fn open(dir: &Path, namespace: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{namespace}.json"));
        let values = Self::read_values(&path)?;
        debug!("Opened preferences {path:?} with {} values", values.len());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_values(path: &Path) -> Result<BTreeMap<String, Value>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => Err(e)?,
        };

        FileExt::lock_shared(&file)?;
        let parsed = serde_json::from_reader::<_, BTreeMap<String, Value>>(BufReader::new(&file));
        FileExt::unlock(&file)?;

        match parsed {
            Ok(values) => Ok(values),
            Err(e) => {
                // A torn write leaves an unreadable file. Starting over is the only sane option
                // for advisory data like this.
                warn!("Preferences at {path:?} are corrupted, starting empty: {e}");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_values(&self) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        FileExt::lock_exclusive(&file)?;
        let result = Self::write_with_file(&mut file, &self.values);
        FileExt::unlock(&file)?;
        result
    }

    fn write_with_file(file: &mut File, values: &BTreeMap<String, Value>) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(values)?;
        file.set_len(0)?;
        file.rewind()?;
        file.write_all(&buffer)?;
        file.sync_all()?;
        Ok(())
    }
}

impl KeyValueStore for FilePreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn commit(&mut self) -> Result<()> {
        self.write_values()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{FilePreferences, KeyValueStore, MemoryPreferences};

    #[test]
    fn test_memory_preferences() {
        let mut prefs = MemoryPreferences::new();
        assert_eq!(prefs.get("a"), None);
        prefs.set("a", json!(5));
        prefs.set("a", json!(6));
        assert_eq!(prefs.get("a"), Some(json!(6)));
    }

    #[test]
    fn test_file_preferences_survive_reopen() -> Result<()> {
        let dir = tempdir()?;
        let mut prefs = FilePreferences::open(dir.path(), "ns")?;
        prefs.set("count", json!(3));
        prefs.set("flag", json!(true));
        prefs.commit()?;

        let reopened = FilePreferences::open(dir.path(), "ns")?;
        assert_eq!(reopened.get("count"), Some(json!(3)));
        assert_eq!(reopened.get("flag"), Some(json!(true)));
        assert_eq!(reopened.path(), dir.path().join("ns.json"));
        Ok(())
    }

    #[test]
    fn test_file_preferences_uncommitted_values_are_lost() -> Result<()> {
        let dir = tempdir()?;
        let mut prefs = FilePreferences::open(dir.path(), "ns")?;
        prefs.set("count", json!(3));
        drop(prefs);

        let reopened = FilePreferences::open(dir.path(), "ns")?;
        assert_eq!(reopened.get("count"), None);
        Ok(())
    }

    #[test]
    fn test_file_preferences_shrinking_rewrite() -> Result<()> {
        let dir = tempdir()?;
        let mut prefs = FilePreferences::open(dir.path(), "ns")?;
        prefs.set("long", json!("a very long value that takes up space in the file"));
        prefs.commit()?;
        prefs.set("long", json!("short"));
        prefs.commit()?;

        let reopened = FilePreferences::open(dir.path(), "ns")?;
        assert_eq!(reopened.get("long"), Some(json!("short")));
        Ok(())
    }

    #[test]
    fn test_file_preferences_corrupted_file_starts_empty() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("ns.json"), "{\"count\": 3")?;

        let prefs = FilePreferences::open(dir.path(), "ns")?;
        assert_eq!(prefs.get("count"), None);
        Ok(())
    }

    #[test]
    fn test_namespaces_do_not_collide() -> Result<()> {
        let dir = tempdir()?;
        let mut first = FilePreferences::open(dir.path(), "first")?;
        first.set("key", json!(1));
        first.commit()?;

        let second = FilePreferences::open(dir.path(), "second")?;
        assert_eq!(second.get("key"), None);
        Ok(())
    }
}
