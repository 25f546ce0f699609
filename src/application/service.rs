use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::catalog::Catalog;
use crate::domain::model::book::Book;
use crate::domain::model::bookmark::{Bookmark, NewBookmark};
use crate::domain::model::id::{BookId, BookmarkId};
use crate::domain::model::progress::ReadingProgress;
use crate::domain::repository::KeyValueStore;

use super::error::AppError;

pub const FAVORITES_KEY: &str = "elibrary_favorites";
pub const PROGRESS_KEY: &str = "elibrary_progress";
pub const BOOKMARKS_KEY: &str = "elibrary_bookmarks";

type ProgressMap = BTreeMap<BookId, ReadingProgress>;

/// お気に入り・読書進捗・ブックマークの永続化層。
/// 各操作は read → mutate → write で完結する。
///
/// ストアが使えない場合や保存値が壊れている場合は、空として扱い警告ログのみ出す。
/// 読み書きとも失敗を呼び出し側に返さない。
pub struct LibraryService<S: KeyValueStore> {
    store: S,
    catalog: Arc<Catalog>,
}

impl<S: KeyValueStore> LibraryService<S> {
    pub fn new(store: S, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- catalog ---

    pub fn list_books(&self) -> &[Book] {
        self.catalog.list_books()
    }

    pub fn find_book(&self, id: &BookId) -> Option<&Book> {
        self.catalog.find_book(id)
    }

    // --- favorites ---

    pub fn list_favorite_ids(&self) -> Vec<BookId> {
        self.read_or_default(FAVORITES_KEY)
    }

    /// お気に入りを反転し、反転後の状態を返す。
    pub fn toggle_favorite(&mut self, book_id: &BookId) -> bool {
        let mut favorites = self.list_favorite_ids();
        let now_favorite = if favorites.contains(book_id) {
            favorites.retain(|id| id != book_id);
            false
        } else {
            favorites.push(book_id.clone());
            true
        };
        self.write(FAVORITES_KEY, &favorites);
        tracing::debug!(book_id = %book_id, favorite = now_favorite, "toggled favorite");
        now_favorite
    }

    pub fn is_favorite(&self, book_id: &BookId) -> bool {
        self.list_favorite_ids().contains(book_id)
    }

    /// お気に入り登録された書籍をカタログ順で返す（登録順ではない）。
    pub fn list_favorite_books(&self) -> Vec<&Book> {
        let favorites = self.list_favorite_ids();
        self.catalog
            .list_books()
            .iter()
            .filter(|book| favorites.contains(&book.id))
            .collect()
    }

    // --- progress ---

    pub fn get_progress(&self, book_id: &BookId) -> Option<ReadingProgress> {
        let mut all: ProgressMap = self.read_or_default(PROGRESS_KEY);
        all.remove(book_id)
    }

    /// 同じ書籍の既存レコードは上書きされる。範囲検証は行わない。
    pub fn save_progress(&mut self, record: ReadingProgress) {
        let mut all: ProgressMap = self.read_or_default(PROGRESS_KEY);
        tracing::debug!(
            book_id = %record.book_id,
            page = record.current_page,
            "saving progress"
        );
        all.insert(record.book_id.clone(), record);
        self.write(PROGRESS_KEY, &all);
    }

    /// 全進捗を最終閲覧が新しい順で返す。
    pub fn list_progress(&self) -> Vec<ReadingProgress> {
        let all: ProgressMap = self.read_or_default(PROGRESS_KEY);
        let mut records: Vec<ReadingProgress> = all.into_values().collect();
        records.sort_by(|a, b| b.last_read.cmp(&a.last_read));
        records
    }

    // --- bookmarks ---

    /// 指定書籍のブックマークを追加順で返す。
    pub fn list_bookmarks(&self, book_id: &BookId) -> Vec<Bookmark> {
        self.list_all_bookmarks()
            .into_iter()
            .filter(|b| &b.book_id == book_id)
            .collect()
    }

    pub fn list_all_bookmarks(&self) -> Vec<Bookmark> {
        self.read_or_default(BOOKMARKS_KEY)
    }

    /// IDと作成時刻を付与して末尾に追加し、保存したレコードを返す。
    pub fn add_bookmark(&mut self, new: NewBookmark) -> Bookmark {
        let mut all = self.list_all_bookmarks();
        let bookmark = new.into_bookmark(BookmarkId::generate(), chrono::Utc::now());
        all.push(bookmark.clone());
        self.write(BOOKMARKS_KEY, &all);
        tracing::debug!(bookmark_id = %bookmark.id, book_id = %bookmark.book_id, "added bookmark");
        bookmark
    }

    /// 一致するブックマークを削除する。存在しなければ何もしない。
    /// 削除したかどうかを返す。
    pub fn delete_bookmark(&mut self, id: &BookmarkId) -> bool {
        let mut all = self.list_all_bookmarks();
        let before = all.len();
        all.retain(|b| &b.id != id);
        if all.len() == before {
            return false;
        }
        self.write(BOOKMARKS_KEY, &all);
        tracing::debug!(bookmark_id = %id, "deleted bookmark");
        true
    }

    // --- lifecycle ---

    pub fn flush(&mut self) -> Result<(), AppError> {
        self.store
            .flush()
            .map_err(|e| AppError::Storage(Box::new(e)))
    }

    /// ストアをflushして返す。
    pub fn close(mut self) -> Result<S, AppError> {
        self.flush()?;
        Ok(self.store)
    }

    // --- private ---

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "store unavailable, reading as empty");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "discarding undecodable stored value");
            T::default()
        })
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode value, write skipped");
                return;
            }
        };
        if let Err(e) = self.store.set(key, raw) {
            tracing::warn!(key, error = %e, "store unavailable, write dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn service() -> LibraryService<InMemoryStore> {
        LibraryService::new(InMemoryStore::new(), Arc::new(Catalog::builtin()))
    }

    #[test]
    fn favorites_start_empty() {
        let svc = service();
        assert!(svc.list_favorite_ids().is_empty());
        assert!(!svc.is_favorite(&BookId::new("1")));
    }

    #[test]
    fn toggle_returns_new_membership() {
        let mut svc = service();
        let id = BookId::new("1");
        assert!(svc.toggle_favorite(&id));
        assert!(svc.is_favorite(&id));
        assert!(!svc.toggle_favorite(&id));
        assert!(!svc.is_favorite(&id));
    }

    #[test]
    fn favorite_ids_keep_insertion_order() {
        let mut svc = service();
        svc.toggle_favorite(&BookId::new("3"));
        svc.toggle_favorite(&BookId::new("1"));
        assert_eq!(
            svc.list_favorite_ids(),
            vec![BookId::new("3"), BookId::new("1")]
        );
    }

    #[test]
    fn favorite_books_follow_catalog_order_and_skip_unknown_ids() {
        let mut svc = service();
        svc.toggle_favorite(&BookId::new("4"));
        svc.toggle_favorite(&BookId::new("not-in-catalog"));
        svc.toggle_favorite(&BookId::new("2"));

        let ids: Vec<&str> = svc
            .list_favorite_books()
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn toggle_removes_duplicated_entries() {
        let store = InMemoryStore::new().with_entry(FAVORITES_KEY, r#"["1","2","1"]"#);
        let mut svc = LibraryService::new(store, Arc::new(Catalog::builtin()));
        assert!(!svc.toggle_favorite(&BookId::new("1")));
        assert_eq!(svc.list_favorite_ids(), vec![BookId::new("2")]);
    }

    #[test]
    fn progress_upsert_overwrites() {
        let mut svc = service();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        svc.save_progress(ReadingProgress::new(BookId::new("1"), 3, 10, at));
        svc.save_progress(ReadingProgress::new(BookId::new("1"), 7, 10, at));

        let got = svc.get_progress(&BookId::new("1")).unwrap();
        assert_eq!(got.current_page, 7);
        assert_eq!(got.progress, 70);
        assert_eq!(svc.list_progress().len(), 1);
    }

    #[test]
    fn missing_progress_is_none() {
        assert!(service().get_progress(&BookId::new("1")).is_none());
    }

    #[test]
    fn list_progress_most_recent_first() {
        let mut svc = service();
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        svc.save_progress(ReadingProgress::new(BookId::new("1"), 1, 10, late));
        svc.save_progress(ReadingProgress::new(BookId::new("2"), 1, 10, early));

        let order: Vec<String> = svc
            .list_progress()
            .iter()
            .map(|p| p.book_id.to_string())
            .collect();
        assert_eq!(order, vec!["1", "2"]);
    }

    #[test]
    fn bookmarks_filtered_by_book() {
        let mut svc = service();
        svc.add_bookmark(NewBookmark {
            book_id: BookId::new("1"),
            page: 3,
            note: "intro".into(),
        });
        svc.add_bookmark(NewBookmark {
            book_id: BookId::new("2"),
            page: 9,
            note: String::new(),
        });
        svc.add_bookmark(NewBookmark {
            book_id: BookId::new("1"),
            page: 12,
            note: "later".into(),
        });

        let pages: Vec<u32> = svc
            .list_bookmarks(&BookId::new("1"))
            .iter()
            .map(|b| b.page)
            .collect();
        assert_eq!(pages, vec![3, 12]);
        assert_eq!(svc.list_all_bookmarks().len(), 3);
    }

    #[test]
    fn delete_bookmark_missing_is_noop() {
        let mut svc = service();
        let kept = svc.add_bookmark(NewBookmark {
            book_id: BookId::new("1"),
            page: 1,
            note: "keep".into(),
        });
        assert!(!svc.delete_bookmark(&BookmarkId::new("bookmark_0_none")));
        assert_eq!(svc.list_bookmarks(&BookId::new("1")), vec![kept]);
    }

    #[test]
    fn corrupt_values_read_as_empty() {
        let store = InMemoryStore::new()
            .with_entry(FAVORITES_KEY, "{not json")
            .with_entry(PROGRESS_KEY, "[]")
            .with_entry(BOOKMARKS_KEY, "42");
        let svc = LibraryService::new(store, Arc::new(Catalog::builtin()));

        assert!(svc.list_favorite_ids().is_empty());
        assert!(svc.get_progress(&BookId::new("1")).is_none());
        assert!(svc.list_all_bookmarks().is_empty());
    }

    #[test]
    fn close_returns_store_with_data() {
        let mut svc = service();
        svc.toggle_favorite(&BookId::new("1"));
        let store = svc.close().unwrap();
        assert_eq!(store.get(FAVORITES_KEY).unwrap().as_deref(), Some(r#"["1"]"#));
    }
}
