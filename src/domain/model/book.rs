use serde::{Deserialize, Serialize};

use super::id::BookId;

/// カタログの書籍レコード。外部から供給され、実行中に変更されない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub cover_url: String,
    /// 文書本体への参照（実際のレンダリングは行わない）
    #[serde(rename = "pdfUrl")]
    pub document_url: String,
    pub rating: f32,
    pub pages: u32,
}
