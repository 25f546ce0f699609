use std::path::Path;

use crate::application::error::AppError;
use crate::domain::catalog::Catalog;
use crate::domain::model::book::Book;

/// JSON配列（Bookレコード）からカタログを読み込む。
pub fn load_catalog(path: &Path) -> Result<Catalog, AppError> {
    let content = std::fs::read_to_string(path).map_err(AppError::CatalogIo)?;
    let books: Vec<Book> = serde_json::from_str(&content).map_err(AppError::CatalogFormat)?;
    let catalog = Catalog::from_books(books)?;
    tracing::info!(path = %path.display(), books = catalog.len(), "loaded catalog");
    Ok(catalog)
}
