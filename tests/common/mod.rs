//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use elibrary_mcp::application::service::LibraryService;
use elibrary_mcp::domain::catalog::Catalog;
use elibrary_mcp::domain::model::book::Book;
use elibrary_mcp::domain::model::id::BookId;
use elibrary_mcp::domain::repository::KeyValueStore;
use elibrary_mcp::infra::memory_store::InMemoryStore;

// =============================================================================
// UnavailableStore — ストアが使えない環境の再現
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("durable store unavailable")]
pub struct Unavailable;

/// 全操作が失敗するストア。
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    type Error = Unavailable;

    fn get(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Err(Unavailable)
    }

    fn set(&mut self, _key: &str, _value: String) -> Result<(), Self::Error> {
        Err(Unavailable)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Err(Unavailable)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// テスト用の小さなカタログ:
/// ```text
/// b1  Dune        (20 pages)
/// b2  Emma        (10 pages)
/// b3  Ulysses     (40 pages)
/// ```
pub fn small_catalog() -> Catalog {
    Catalog::from_books(vec![
        book("b1", "Dune", 20),
        book("b2", "Emma", 10),
        book("b3", "Ulysses", 40),
    ])
    .unwrap()
}

pub fn book(id: &str, title: &str, pages: u32) -> Book {
    Book {
        id: BookId::new(id),
        title: title.to_string(),
        author: "Author".to_string(),
        category: "Fiction".to_string(),
        description: format!("About {title}."),
        cover_url: format!("/covers/{id}.jpg"),
        document_url: format!("/books/{id}.pdf"),
        rating: 4.0,
        pages,
    }
}

/// 空のインメモリストア + 小カタログのサービス。
pub fn library() -> LibraryService<InMemoryStore> {
    LibraryService::new(InMemoryStore::new(), Arc::new(small_catalog()))
}

pub fn library_with(store: InMemoryStore) -> LibraryService<InMemoryStore> {
    LibraryService::new(store, Arc::new(small_catalog()))
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
}
