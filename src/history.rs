use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::MvdlError;

#[derive(Debug)]
pub struct History {
    path: Utf8PathBuf,
    entries: BTreeMap<String, String>,
}

impl History {
    pub fn load(path: &Utf8Path) -> Result<Self, MvdlError> {
        let entries = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|err| MvdlError::HistoryCorrupt {
                    path: path.to_string(),
                    reason: err.to_string(),
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(MvdlError::Filesystem(format!("read history {path}: {err}")));
            }
        };
        Ok(Self {
            path: path.to_owned(),
            entries,
        })
    }

    pub fn exists(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn record(&mut self, id: &str, description: &str) {
        self.entries.insert(id.to_string(), description.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flush(&self) -> Result<(), MvdlError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent.as_std_path())
                    .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
            }
        }
        let content = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), self.path.as_std_path())
            .map_err(|err| MvdlError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;

    fn temp_history_path(temp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().join("history.json")).unwrap()
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let temp = tempfile::tempdir().unwrap();
        let history = History::load(&temp_history_path(&temp)).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn flush_and_reload_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp_history_path(&temp);

        let mut history = History::load(&path).unwrap();
        history.record("abc", "Show A");
        history.record("def", "Show B");
        history.flush().unwrap();

        let reloaded = History::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.exists("abc"));
        assert!(reloaded.exists("def"));
        assert!(!reloaded.exists("ghi"));
    }

    #[test]
    fn flush_writes_pretty_json_object() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp_history_path(&temp);

        let mut history = History::load(&path).unwrap();
        history.record("abc", "Show A");
        history.flush().unwrap();

        let content = std::fs::read_to_string(path.as_std_path()).unwrap();
        assert_eq!(content, "{\n  \"abc\": \"Show A\"\n}");
    }

    #[test]
    fn record_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let mut history = History::load(&temp_history_path(&temp)).unwrap();
        history.record("abc", "old title");
        history.record("abc", "new title");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp_history_path(&temp);
        std::fs::write(path.as_std_path(), "{not json").unwrap();

        let err = History::load(&path).unwrap_err();
        assert_matches!(err, MvdlError::HistoryCorrupt { .. });
    }
}
