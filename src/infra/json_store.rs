use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::repository::KeyValueStore;

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSONファイルによるKeyValueStore実装。
/// 1ストア = 1 JSONファイル（キー → 文字列値のオブジェクト）。
///
/// 書き込みは即座にファイルへ反映する。反映に失敗した変更はメモリ上に残り、
/// 次の書き込みか `flush` で再度書き出される。
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl JsonFileStore {
    /// ファイルを読み込んで開く。ファイルが無い・読めない・壊れている場合は空として開く。
    ///
    /// 読めなかったファイルへの書き込みエラーは `set` / `flush` が返す。
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "store file is not a valid key-value document, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "store file is unreadable, starting empty"
                );
                BTreeMap::new()
            }
        };
        tracing::info!(path = %path.display(), keys = entries.len(), "opened store");
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&mut self) -> Result<(), JsonStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.dirty = false;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    type Error = JsonStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        self.persist()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }
}
