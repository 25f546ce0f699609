use crate::domain::error::DomainError;
use crate::domain::model::book::Book;
use crate::domain::model::bookmark::{Bookmark, NewBookmark};
use crate::domain::model::id::{BookId, BookmarkId};
use crate::domain::model::progress::{completion_percent, ReadingProgress};
use crate::domain::repository::KeyValueStore;

use super::error::AppError;
use super::service::LibraryService;

pub const MIN_ZOOM: u16 = 50;
pub const MAX_ZOOM: u16 = 200;
pub const ZOOM_STEP: u16 = 10;
pub const DEFAULT_ZOOM: u16 = 100;

/// リーダー画面の状態。開いている書籍・現在ページ・倍率を持つ。
///
/// ページが変わるたびに進捗を保存する。入力値の範囲検証はここで行う。
#[derive(Debug, Clone)]
pub struct ReaderSession {
    book: Book,
    current_page: u32,
    zoom: u16,
}

impl ReaderSession {
    /// 書籍を開く。保存済みの進捗があればそのページから再開する。
    pub fn open<S: KeyValueStore>(
        library: &mut LibraryService<S>,
        book_id: &BookId,
    ) -> Result<Self, AppError> {
        let book = library
            .find_book(book_id)
            .cloned()
            .ok_or_else(|| DomainError::BookNotFound(book_id.clone()))?;

        // カタログ側のページ数が変わっていても範囲内に収める
        let current_page = library
            .get_progress(book_id)
            .map(|p| p.current_page.clamp(1, book.pages))
            .unwrap_or(1);

        let session = Self {
            book,
            current_page,
            zoom: DEFAULT_ZOOM,
        };
        session.record_progress(library);
        tracing::info!(book_id = %book_id, page = current_page, "opened book");
        Ok(session)
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.book.pages
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn progress_percent(&self) -> u8 {
        completion_percent(self.current_page, self.book.pages)
    }

    /// 次ページへ。最終ページなら何もせず false を返す。
    pub fn next_page<S: KeyValueStore>(&mut self, library: &mut LibraryService<S>) -> bool {
        if self.current_page >= self.book.pages {
            return false;
        }
        self.current_page += 1;
        self.record_progress(library);
        true
    }

    /// 前ページへ。先頭ページなら何もせず false を返す。
    pub fn previous_page<S: KeyValueStore>(&mut self, library: &mut LibraryService<S>) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.current_page -= 1;
        self.record_progress(library);
        true
    }

    pub fn go_to_page<S: KeyValueStore>(
        &mut self,
        library: &mut LibraryService<S>,
        page: u32,
    ) -> Result<(), AppError> {
        if !(1..=self.book.pages).contains(&page) {
            return Err(DomainError::PageOutOfRange {
                page,
                total: self.book.pages,
            }
            .into());
        }
        if page != self.current_page {
            self.current_page = page;
            self.record_progress(library);
        }
        Ok(())
    }

    pub fn zoom_in(&mut self) -> bool {
        if self.zoom >= MAX_ZOOM {
            return false;
        }
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
        true
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.zoom <= MIN_ZOOM {
            return false;
        }
        self.zoom = self.zoom.saturating_sub(ZOOM_STEP).max(MIN_ZOOM);
        true
    }

    /// 現在ページにメモ付きブックマークを追加する。空白のみのメモは拒否。
    pub fn add_bookmark<S: KeyValueStore>(
        &self,
        library: &mut LibraryService<S>,
        note: &str,
    ) -> Result<Bookmark, AppError> {
        if note.trim().is_empty() {
            return Err(DomainError::EmptyNote.into());
        }
        Ok(library.add_bookmark(NewBookmark {
            book_id: self.book.id.clone(),
            page: self.current_page,
            note: note.to_string(),
        }))
    }

    pub fn bookmarks<S: KeyValueStore>(&self, library: &LibraryService<S>) -> Vec<Bookmark> {
        library.list_bookmarks(&self.book.id)
    }

    /// この書籍のブックマークのページへ移動する。
    pub fn jump_to_bookmark<S: KeyValueStore>(
        &mut self,
        library: &mut LibraryService<S>,
        id: &BookmarkId,
    ) -> Result<u32, AppError> {
        let page = self
            .bookmarks(library)
            .into_iter()
            .find(|b| &b.id == id)
            .map(|b| b.page)
            .ok_or_else(|| DomainError::BookmarkNotFound(id.clone()))?;
        self.go_to_page(library, page)?;
        Ok(page)
    }

    pub fn toggle_favorite<S: KeyValueStore>(&self, library: &mut LibraryService<S>) -> bool {
        library.toggle_favorite(&self.book.id)
    }

    fn record_progress<S: KeyValueStore>(&self, library: &mut LibraryService<S>) {
        library.save_progress(ReadingProgress::new(
            self.book.id.clone(),
            self.current_page,
            self.book.pages,
            chrono::Utc::now(),
        ));
    }
}
