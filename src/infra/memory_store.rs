use std::collections::HashMap;
use std::convert::Infallible;

use crate::domain::repository::KeyValueStore;

/// ファイルI/O不要のインメモリKVストア。テストやストア無しの起動に使う。
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期値を入れた状態で作る（壊れた保存値の再現など）。
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for InMemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
