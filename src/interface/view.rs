//! Text views for the catalog, favorites and reader screens.
//!
//! Pure functions over already-fetched data; callers re-fetch after each
//! mutation and re-render.

use crate::application::reader::ReaderSession;
use crate::domain::model::book::Book;
use crate::domain::model::bookmark::Bookmark;
use crate::domain::model::id::BookId;
use crate::domain::model::progress::ReadingProgress;

/// カタログ一覧。お気に入りは ♥、読書中は既読率を付ける。
pub fn render_catalog(
    books: &[Book],
    favorites: &[BookId],
    progress: &[ReadingProgress],
) -> String {
    if books.is_empty() {
        return "Catalog is empty.".to_string();
    }
    let mut output = format!("# Catalog ({} books)\n\n", books.len());
    for book in books {
        output.push_str(&book_line(book));
        if let Some(p) = progress.iter().find(|p| p.book_id == book.id) {
            output.push_str(&format!(" · {}% read", p.progress));
        }
        if favorites.contains(&book.id) {
            output.push_str(" ♥");
        }
        output.push('\n');
    }
    output
}

pub fn render_book(book: &Book, favorite: bool, progress: Option<&ReadingProgress>) -> String {
    let mut output = format!(
        "# {}\n\nAuthor: {}\nCategory: {}\nRating: {:.1}\nPages: {}\nFavorite: {}\n",
        book.title,
        book.author,
        book.category,
        book.rating,
        book.pages,
        if favorite { "yes" } else { "no" }
    );
    match progress {
        Some(p) => output.push_str(&format!(
            "Progress: page {} of {} ({}%), last read {}\n",
            p.current_page,
            p.total_pages,
            p.progress,
            p.last_read.format("%Y-%m-%d %H:%M UTC")
        )),
        None => output.push_str("Progress: not started\n"),
    }
    output.push_str(&format!("\n{}\n", book.description));
    output
}

pub fn render_favorites(books: &[&Book]) -> String {
    if books.is_empty() {
        return "No favorites yet. Use `toggle_favorite` to add a book.".to_string();
    }
    let mut output = format!("# Favorites ({} books)\n\n", books.len());
    for book in books {
        output.push_str(&book_line(book));
        output.push('\n');
    }
    output
}

/// 読書進捗一覧（最近読んだ順で渡される前提）。
pub fn render_progress(records: &[ReadingProgress], books: &[Book]) -> String {
    if records.is_empty() {
        return "No reading progress yet. Use `open_book` to start reading.".to_string();
    }
    let mut output = String::from("# Continue reading\n\n");
    for p in records {
        let title = books
            .iter()
            .find(|b| b.id == p.book_id)
            .map(|b| b.title.as_str())
            .unwrap_or("(unknown book)");
        output.push_str(&format!(
            "- [{}] {}: page {}/{} ({}%)\n",
            p.book_id, title, p.current_page, p.total_pages, p.progress
        ));
    }
    output
}

/// リーダー画面。ページ位置・既読率・倍率・模擬ページ本文・ブックマーク。
pub fn render_reader(session: &ReaderSession, favorite: bool, bookmarks: &[Bookmark]) -> String {
    let book = session.book();
    let mut output = format!(
        "# {}{}\n{}\n\nPage {} of {} · {}% complete · zoom {}%\n\n",
        book.title,
        if favorite { " ♥" } else { "" },
        book.author,
        session.current_page(),
        session.total_pages(),
        session.progress_percent(),
        session.zoom()
    );
    output.push_str(&format!(
        "> Simulated document view of {} (page {}).\n",
        book.document_url,
        session.current_page()
    ));
    output.push('\n');
    output.push_str(&render_bookmarks(bookmarks));
    output
}

pub fn render_bookmarks(bookmarks: &[Bookmark]) -> String {
    if bookmarks.is_empty() {
        return "Bookmarks: none\n".to_string();
    }
    let mut output = format!("Bookmarks ({}):\n", bookmarks.len());
    for b in bookmarks {
        output.push_str(&format!("- p.{} {} [{}]\n", b.page, b.note, b.id));
    }
    output
}

fn book_line(book: &Book) -> String {
    format!(
        "[{}] {} by {} ({}) ★{:.1}, {} pages",
        book.id, book.title, book.author, book.category, book.rating, book.pages
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Catalog;
    use chrono::{TimeZone, Utc};

    #[test]
    fn catalog_marks_favorites_and_progress() {
        let catalog = Catalog::builtin();
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let progress = vec![ReadingProgress::new(BookId::new("2"), 116, 464, at)];
        let out = render_catalog(catalog.list_books(), &[BookId::new("1")], &progress);

        assert!(out.starts_with("# Catalog (8 books)"));
        assert!(out.contains("[1] The Pragmatic Programmer by David Thomas, Andrew Hunt (Technology) ★4.8, 352 pages ♥\n"));
        assert!(out.contains("[2] Clean Code by Robert C. Martin (Technology) ★4.6, 464 pages · 25% read\n"));
    }

    #[test]
    fn empty_views_explain_next_step() {
        assert!(render_favorites(&[]).contains("toggle_favorite"));
        assert!(render_progress(&[], &[]).contains("open_book"));
        assert_eq!(render_bookmarks(&[]), "Bookmarks: none\n");
    }

    #[test]
    fn book_detail_without_progress() {
        let catalog = Catalog::builtin();
        let book = catalog.find_book(&BookId::new("5")).unwrap();
        let out = render_book(book, true, None);
        assert!(out.contains("Favorite: yes"));
        assert!(out.contains("Progress: not started"));
        assert!(out.contains("Arrakis"));
    }

    #[test]
    fn progress_for_unknown_book() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let records = vec![ReadingProgress::new(BookId::new("gone"), 1, 2, at)];
        let out = render_progress(&records, Catalog::builtin().list_books());
        assert!(out.contains("- [gone] (unknown book): page 1/2 (50%)"));
    }
}
