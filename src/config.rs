use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = "elibrary-store.json";
pub const DEFAULT_LOG_FILTER: &str = "elibrary_mcp=info";

/// 起動設定。優先順位: コマンドライン引数 > 環境変数 > 既定値。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// KVストアのJSONファイル
    pub store_path: PathBuf,
    /// カタログのJSONファイル（Noneなら同梱カタログ）
    pub catalog_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::resolve(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// `arg` は第1引数（ストアパス）、`env` は環境変数の参照。
    pub fn resolve(arg: Option<String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let store_path = arg
            .or_else(|| non_empty("ELIBRARY_STORE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        Self {
            store_path,
            catalog_path: non_empty("ELIBRARY_CATALOG").map(PathBuf::from),
            log_filter: non_empty("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(None, env_of(&[]));
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert!(config.catalog_path.is_none());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn argument_overrides_env() {
        let config = Config::resolve(
            Some("/tmp/arg.json".into()),
            env_of(&[("ELIBRARY_STORE", "/tmp/env.json")]),
        );
        assert_eq!(config.store_path, PathBuf::from("/tmp/arg.json"));
    }

    #[test]
    fn env_values_used_and_blank_ignored() {
        let config = Config::resolve(
            None,
            env_of(&[
                ("ELIBRARY_STORE", "/data/store.json"),
                ("ELIBRARY_CATALOG", "  "),
                ("RUST_LOG", "debug"),
            ]),
        );
        assert_eq!(config.store_path, PathBuf::from("/data/store.json"));
        assert!(config.catalog_path.is_none());
        assert_eq!(config.log_filter, "debug");
    }
}
