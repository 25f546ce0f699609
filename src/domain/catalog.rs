use std::collections::HashSet;

use super::error::DomainError;
use super::model::book::Book;
use super::model::id::BookId;

/// 読み取り専用の書籍カタログ。
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    /// 外部から供給されたフィクスチャを検証してカタログを作る。
    /// IDの重複とページ数0を拒否する。
    pub fn from_books(books: Vec<Book>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for book in &books {
            if !seen.insert(&book.id) {
                return Err(DomainError::DuplicateBookId(book.id.clone()));
            }
            if book.pages == 0 {
                return Err(DomainError::InvalidPageCount(book.id.clone()));
            }
        }
        Ok(Self { books })
    }

    /// 同梱のフィクスチャ。
    pub fn builtin() -> Self {
        Self {
            books: vec![
                entry(
                    "1",
                    "The Pragmatic Programmer",
                    "David Thomas, Andrew Hunt",
                    "Technology",
                    "Practical advice on the craft of software development, from personal responsibility to architectural techniques.",
                    4.8,
                    352,
                ),
                entry(
                    "2",
                    "Clean Code",
                    "Robert C. Martin",
                    "Technology",
                    "A handbook of agile software craftsmanship with case studies in cleaning up code.",
                    4.6,
                    464,
                ),
                entry(
                    "3",
                    "Sapiens",
                    "Yuval Noah Harari",
                    "History",
                    "A brief history of humankind, from the cognitive revolution to the present day.",
                    4.7,
                    443,
                ),
                entry(
                    "4",
                    "Atomic Habits",
                    "James Clear",
                    "Self-Help",
                    "An easy and proven way to build good habits and break bad ones.",
                    4.8,
                    320,
                ),
                entry(
                    "5",
                    "Dune",
                    "Frank Herbert",
                    "Science Fiction",
                    "Politics, religion and ecology on the desert planet Arrakis.",
                    4.7,
                    688,
                ),
                entry(
                    "6",
                    "Thinking, Fast and Slow",
                    "Daniel Kahneman",
                    "Psychology",
                    "The two systems that drive the way we think and the biases they produce.",
                    4.5,
                    499,
                ),
                entry(
                    "7",
                    "The Design of Everyday Things",
                    "Don Norman",
                    "Design",
                    "Why some products satisfy users while others frustrate them.",
                    4.4,
                    368,
                ),
                entry(
                    "8",
                    "A Brief History of Time",
                    "Stephen Hawking",
                    "Science",
                    "From the big bang to black holes, cosmology for the general reader.",
                    4.6,
                    256,
                ),
            ],
        }
    }

    /// 全書籍。毎回同じスライスを返す。
    pub fn list_books(&self) -> &[Book] {
        &self.books
    }

    /// IDで線形探索する。
    pub fn find_book(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn entry(
    id: &str,
    title: &str,
    author: &str,
    category: &str,
    description: &str,
    rating: f32,
    pages: u32,
) -> Book {
    Book {
        id: BookId::new(id),
        title: title.to_string(),
        author: author.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        cover_url: format!("/covers/{id}.jpg"),
        document_url: format!("/books/{id}.pdf"),
        rating,
        pages,
    }
}
