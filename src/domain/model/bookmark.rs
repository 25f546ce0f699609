use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BookId, BookmarkId};

/// ページへのブックマーク。作成後は削除以外で変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    /// 参照先の書籍（カタログ上の存在は検証しない）
    pub book_id: BookId,
    pub page: u32,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// ブックマーク追加リクエスト（id と作成時刻は保存時に付与）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub book_id: BookId,
    pub page: u32,
    pub note: String,
}

impl NewBookmark {
    pub(crate) fn into_bookmark(self, id: BookmarkId, created_at: DateTime<Utc>) -> Bookmark {
        Bookmark {
            id,
            book_id: self.book_id,
            page: self.page,
            note: self.note,
            created_at,
        }
    }
}
