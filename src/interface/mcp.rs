//! MCP Server for elibrary-mcp
//!
//! MCP Protocol (stdio) <-> application::LibraryService / ReaderSession
//!
//! Catalog view: catalog, book, toggle_favorite, progress
//! Favorites view: favorites
//! Reader view: open_book, turn_page, zoom, bookmark_add, bookmark_list,
//! bookmark_delete, bookmark_jump

use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::error::AppError;
use crate::application::reader::ReaderSession;
use crate::application::service::LibraryService;
use crate::config::Config;
use crate::domain::catalog::Catalog;
use crate::domain::model::id::{BookId, BookmarkId};
use crate::infra::catalog_file::load_catalog;
use crate::infra::json_store::JsonFileStore;
use crate::interface::view;

type Library = LibraryService<JsonFileStore>;

// =============================================================================
// Public entry point
// =============================================================================

/// ストアとカタログを開いてMCP Serverを起動する。終了時にストアをflushする。
pub async fn run(config: Config) -> anyhow::Result<()> {
    let catalog = match &config.catalog_path {
        Some(path) => load_catalog(path)?,
        None => Catalog::builtin(),
    };
    let store = JsonFileStore::open(&config.store_path);
    let server = ElibraryMcpServer::new(LibraryService::new(store, Arc::new(catalog)));
    let library = Arc::clone(&server.library);

    tracing::info!(store = %config.store_path.display(), "serving on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    library
        .lock()
        .map_err(|_| anyhow::anyhow!("library lock poisoned"))?
        .flush()?;
    tracing::info!("store flushed, shutting down");
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct ElibraryMcpServer {
    library: Arc<Mutex<Library>>,
    /// リーダー画面で開いている書籍
    session: Arc<Mutex<Option<ReaderSession>>>,
    tool_router: ToolRouter<Self>,
}

impl ElibraryMcpServer {
    fn new(library: Library) -> Self {
        Self {
            library: Arc::new(Mutex::new(library)),
            session: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    // ロック順序は常に library → session
    fn library(&self) -> Result<MutexGuard<'_, Library>, McpError> {
        self.library
            .lock()
            .map_err(|_| McpError::internal_error("Lock poisoned", None))
    }

    fn session(&self) -> Result<MutexGuard<'_, Option<ReaderSession>>, McpError> {
        self.session
            .lock()
            .map_err(|_| McpError::internal_error("Lock poisoned", None))
    }

    fn to_mcp_error(e: AppError) -> McpError {
        match e {
            AppError::Domain(d) => McpError::invalid_params(format!("{d}"), None),
            other => McpError::internal_error(format!("{other}"), None),
        }
    }
}

fn no_open_book() -> McpError {
    McpError::invalid_params("No book open. Use `open_book` first.", None)
}

/// リーダー画面を最新の保存状態で描画する。
fn render_reader_view(library: &Library, session: &ReaderSession) -> String {
    let favorite = library.is_favorite(&session.book().id);
    let bookmarks = session.bookmarks(library);
    view::render_reader(session, favorite, &bookmarks)
}

/// お気に入りを反転して結果メッセージを返す。book_id 省略時は開いている書籍が対象。
fn toggle_favorite_text(
    library: &mut Library,
    session: Option<&ReaderSession>,
    book_id: Option<BookId>,
) -> Result<String, McpError> {
    let (book_id, title, now_favorite) = match (book_id, session) {
        (Some(book_id), _) => {
            let title = library
                .find_book(&book_id)
                .map(|b| b.title.clone())
                .ok_or_else(|| {
                    McpError::invalid_params(
                        format!("Book '{book_id}' not found. Use `catalog` to list books."),
                        None,
                    )
                })?;
            let now_favorite = library.toggle_favorite(&book_id);
            (book_id, title, now_favorite)
        }
        (None, Some(session)) => {
            let now_favorite = session.toggle_favorite(library);
            (session.book().id.clone(), session.book().title.clone(), now_favorite)
        }
        (None, None) => return Err(no_open_book()),
    };
    Ok(if now_favorite {
        format!("Added to favorites: [{book_id}] {title}")
    } else {
        format!("Removed from favorites: [{book_id}] {title}")
    })
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for ElibraryMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "elibrary-mcp".to_string(),
                title: Some("E-Library: catalog, favorites and reader".to_string()),
                description: Some(
                    "Browse a book catalog, keep favorites, read with saved progress \
                     and page bookmarks."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Browse with `catalog` and `book`, keep a short list with `toggle_favorite` \
                 and `favorites`.\n\
                 \n\
                 Reading: `open_book` resumes at the last page read. Move with `turn_page`, \
                 mark pages with `bookmark_add`, return to them with `bookmark_jump`. \
                 `progress` lists books in progress, most recent first."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

fn parse_book_id(s: &str) -> Result<BookId, McpError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("book_id must not be empty", None));
    }
    Ok(BookId::new(trimmed))
}

fn parse_bookmark_id(s: &str) -> Result<BookmarkId, McpError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params(
            "bookmark_id must not be empty",
            None,
        ));
    }
    Ok(BookmarkId::new(trimmed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageAction {
    Next,
    Previous,
    GoTo(u32),
}

fn parse_page_action(action: &str, page: Option<u32>) -> Result<PageAction, McpError> {
    match (action, page) {
        ("next", _) => Ok(PageAction::Next),
        ("prev" | "previous", _) => Ok(PageAction::Previous),
        ("goto", Some(page)) => Ok(PageAction::GoTo(page)),
        ("goto", None) => Err(McpError::invalid_params(
            "Action 'goto' requires `page`",
            None,
        )),
        (other, _) => Err(McpError::invalid_params(
            format!("Unknown action: '{other}'. Use: next, prev, goto"),
            None,
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoomDirection {
    In,
    Out,
}

fn parse_zoom_direction(s: &str) -> Result<ZoomDirection, McpError> {
    match s {
        "in" => Ok(ZoomDirection::In),
        "out" => Ok(ZoomDirection::Out),
        other => Err(McpError::invalid_params(
            format!("Unknown direction: '{other}'. Use: in, out"),
            None,
        )),
    }
}

/// MCP経由のテキストに含まれるリテラル `\n` を実際の改行に変換する。
fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n")
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpCatalogRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFavoritesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpProgressRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookRequest {
    #[schemars(description = "Book ID from `catalog` output (e.g. '3')")]
    pub book_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpToggleFavoriteRequest {
    #[schemars(description = "Book ID from `catalog` output. Omit to use the open book.")]
    pub book_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpTurnPageRequest {
    #[schemars(description = "Action: 'next', 'prev', or 'goto'")]
    pub action: String,
    #[schemars(description = "Target page (1-based). Required for 'goto'.")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpZoomRequest {
    #[schemars(description = "Direction: 'in' or 'out' (10% steps, 50%-200%)")]
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookmarkAddRequest {
    #[schemars(description = "Note for the bookmark on the current page (required)")]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookmarkListRequest {
    #[schemars(description = "Book ID. Omit to list bookmarks of the open book.")]
    pub book_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookmarkRefRequest {
    #[schemars(description = "Bookmark ID from `bookmark_list` output")]
    pub bookmark_id: String,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl ElibraryMcpServer {
    #[tool(
        name = "catalog",
        description = "List all books with ID, author, category, rating and page count. Favorites are marked ♥ and books in progress show their read percentage.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn catalog(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpCatalogRequest>,
    ) -> Result<CallToolResult, McpError> {
        let library = self.library()?;
        let output = view::render_catalog(
            library.list_books(),
            &library.list_favorite_ids(),
            &library.list_progress(),
        );
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "book",
        description = "Show details of one book: description, favorite status and reading progress.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn book(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let book_id = parse_book_id(&req.book_id)?;
        let library = self.library()?;
        let book = library.find_book(&book_id).ok_or_else(|| {
            McpError::invalid_params(
                format!("Book '{book_id}' not found. Use `catalog` to list books."),
                None,
            )
        })?;
        let output = view::render_book(
            book,
            library.is_favorite(&book_id),
            library.get_progress(&book_id).as_ref(),
        );
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "favorites",
        description = "List favorite books in catalog order.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn favorites(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpFavoritesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let library = self.library()?;
        let output = view::render_favorites(&library.list_favorite_books());
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "toggle_favorite",
        description = "Add a book to favorites, or remove it if it is already a favorite. Omit book_id to toggle the open book.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn toggle_favorite(
        &self,
        Parameters(req): Parameters<McpToggleFavoriteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let book_id = req.book_id.as_deref().map(parse_book_id).transpose()?;
        let mut library = self.library()?;
        let session = self.session()?;
        let text = toggle_favorite_text(&mut library, session.as_ref(), book_id)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "progress",
        description = "List books with saved reading progress, most recently read first.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn progress(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpProgressRequest>,
    ) -> Result<CallToolResult, McpError> {
        let library = self.library()?;
        let output = view::render_progress(&library.list_progress(), library.list_books());
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "open_book",
        description = "Open a book in the reader. Resumes at the last page read. All reader tools (turn_page, zoom, bookmark_*) act on the open book.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn open_book(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let book_id = parse_book_id(&req.book_id)?;
        let mut library = self.library()?;
        let session = ReaderSession::open(&mut *library, &book_id).map_err(Self::to_mcp_error)?;
        let output = render_reader_view(&library, &session);

        *self.session()? = Some(session);
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "turn_page",
        description = "Move within the open book: 'next', 'prev', or 'goto' with a page number. Progress is saved on every page change.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn turn_page(
        &self,
        Parameters(req): Parameters<McpTurnPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        let action = parse_page_action(&req.action, req.page)?;
        let mut library = self.library()?;
        let mut guard = self.session()?;
        let session = guard.as_mut().ok_or_else(no_open_book)?;

        match action {
            PageAction::Next => {
                session.next_page(&mut *library);
            }
            PageAction::Previous => {
                session.previous_page(&mut *library);
            }
            PageAction::GoTo(page) => session
                .go_to_page(&mut *library, page)
                .map_err(Self::to_mcp_error)?,
        }

        let output = render_reader_view(&library, session);
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "zoom",
        description = "Zoom the open book 'in' or 'out' in 10% steps between 50% and 200%.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn zoom(
        &self,
        Parameters(req): Parameters<McpZoomRequest>,
    ) -> Result<CallToolResult, McpError> {
        let direction = parse_zoom_direction(&req.direction)?;
        let mut guard = self.session()?;
        let session = guard.as_mut().ok_or_else(no_open_book)?;

        let changed = match direction {
            ZoomDirection::In => session.zoom_in(),
            ZoomDirection::Out => session.zoom_out(),
        };
        let text = if changed {
            format!("Zoom: {}%", session.zoom())
        } else {
            format!("Zoom: {}% (limit reached)", session.zoom())
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "bookmark_add",
        description = "Bookmark the current page of the open book with a note.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn bookmark_add(
        &self,
        Parameters(req): Parameters<McpBookmarkAddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut library = self.library()?;
        let guard = self.session()?;
        let session = guard.as_ref().ok_or_else(no_open_book)?;

        let bookmark = session
            .add_bookmark(&mut *library, &unescape_newlines(&req.note))
            .map_err(Self::to_mcp_error)?;

        let output = format!(
            "Bookmarked page {} [{}]\n\n{}",
            bookmark.page,
            bookmark.id,
            view::render_bookmarks(&session.bookmarks(&*library))
        );
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "bookmark_list",
        description = "List bookmarks of a book in the order they were added. Omit book_id for the open book.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn bookmark_list(
        &self,
        Parameters(req): Parameters<McpBookmarkListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let library = self.library()?;
        let book_id = match req.book_id.as_deref() {
            Some(s) => parse_book_id(s)?,
            None => self
                .session()?
                .as_ref()
                .map(|s| s.book().id.clone())
                .ok_or_else(no_open_book)?,
        };
        let output = view::render_bookmarks(&library.list_bookmarks(&book_id));
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "bookmark_delete",
        description = "Delete a bookmark by ID. Deleting an unknown ID does nothing.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn bookmark_delete(
        &self,
        Parameters(req): Parameters<McpBookmarkRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let bookmark_id = parse_bookmark_id(&req.bookmark_id)?;
        let mut library = self.library()?;
        let text = if library.delete_bookmark(&bookmark_id) {
            format!("Deleted bookmark [{bookmark_id}]")
        } else {
            format!("No bookmark [{bookmark_id}], nothing deleted")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "bookmark_jump",
        description = "Go to the page of one of the open book's bookmarks.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn bookmark_jump(
        &self,
        Parameters(req): Parameters<McpBookmarkRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let bookmark_id = parse_bookmark_id(&req.bookmark_id)?;
        let mut library = self.library()?;
        let mut guard = self.session()?;
        let session = guard.as_mut().ok_or_else(no_open_book)?;

        session
            .jump_to_bookmark(&mut *library, &bookmark_id)
            .map_err(Self::to_mcp_error)?;

        let output = render_reader_view(&library, session);
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

// =============================================================================
// Tests
// =============================================================================
