use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::BookId;

/// 書籍ごとの読書進捗。1冊につき最大1件で、保存のたびに上書きされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub book_id: BookId,
    pub current_page: u32,
    pub total_pages: u32,
    pub last_read: DateTime<Utc>,
    /// 完読率（0〜100）
    pub progress: u8,
}

impl ReadingProgress {
    /// 完読率を計算して進捗レコードを作る。
    pub fn new(
        book_id: BookId,
        current_page: u32,
        total_pages: u32,
        last_read: DateTime<Utc>,
    ) -> Self {
        Self {
            book_id,
            current_page,
            total_pages,
            last_read,
            progress: completion_percent(current_page, total_pages),
        }
    }
}

/// round(current / total × 100)。total が 0 なら 0。
pub fn completion_percent(current_page: u32, total_pages: u32) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let ratio = f64::from(current_page) / f64::from(total_pages);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
