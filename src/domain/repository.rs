/// 永続化の抽象。文字列キー → 文字列値のKVストア。Infra層が実装する。
///
/// アプリ起動時に開き、終了時に `flush` する。
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error>;

    /// 未書き込みの変更を永続化する。書き込み即反映の実装では何もしない。
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
