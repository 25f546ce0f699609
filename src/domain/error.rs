use super::model::id::{BookId, BookmarkId};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    #[error("bookmark not found: {0}")]
    BookmarkNotFound(BookmarkId),

    #[error("page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("bookmark note must not be empty")]
    EmptyNote,

    #[error("duplicate book id in catalog: {0}")]
    DuplicateBookId(BookId),

    #[error("book {0} has no pages")]
    InvalidPageCount(BookId),
}
