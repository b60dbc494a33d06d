use crate::errors::{AppError, AppResult};
use crate::http::ApiClient;
use crate::models::{CreateNoteDto, FetchNotesParams, Note, NotesPage};
use futures::future::BoxFuture;

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 500;

/// Remote note operations the query layer depends on.
pub trait NoteApi: Send + Sync {
    fn fetch_notes(&self, params: FetchNotesParams) -> BoxFuture<'_, AppResult<NotesPage>>;
    fn create_note(&self, dto: CreateNoteDto) -> BoxFuture<'_, AppResult<Note>>;
    fn delete_note(&self, id: String) -> BoxFuture<'_, AppResult<Note>>;
}

pub fn validate_fetch_params(params: &FetchNotesParams) -> AppResult<()> {
    if params.page < 1 {
        return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    if params.per_page < 1 {
        return Err(AppError::Validation("perPage must be at least 1".to_string()));
    }
    Ok(())
}

/// Trims the draft and enforces the title/content limits. Returns the
/// payload that goes on the wire.
pub fn validate_create(dto: CreateNoteDto) -> AppResult<CreateNoteDto> {
    let title = dto.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    let content = dto
        .content
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty());
    if let Some(content) = &content {
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "Content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
    }
    Ok(CreateNoteDto {
        title,
        content,
        tag: dto.tag,
    })
}

#[derive(Clone)]
pub struct NoteService {
    api: ApiClient,
}

impl NoteService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch_notes(&self, params: FetchNotesParams) -> AppResult<NotesPage> {
        validate_fetch_params(&params)?;
        let requested_page = params.page;
        self.api
            .get::<NotesPage, _>(&["notes"], &params)
            .await
            .map(|page| page.normalized(requested_page))
            .map_err(|error| report("fetch notes", error))
    }

    pub async fn create_note(&self, dto: CreateNoteDto) -> AppResult<Note> {
        let dto = validate_create(dto)?;
        self.api
            .post::<Note, _>(&["notes"], &dto)
            .await
            .map_err(|error| report("create note", error))
    }

    pub async fn delete_note(&self, id: &str) -> AppResult<Note> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("note id is required".to_string()));
        }
        self.api
            .delete::<Note>(&["notes", id])
            .await
            .map_err(|error| report("delete note", error))
    }
}

impl NoteApi for NoteService {
    fn fetch_notes(&self, params: FetchNotesParams) -> BoxFuture<'_, AppResult<NotesPage>> {
        Box::pin(NoteService::fetch_notes(self, params))
    }

    fn create_note(&self, dto: CreateNoteDto) -> BoxFuture<'_, AppResult<Note>> {
        Box::pin(NoteService::create_note(self, dto))
    }

    fn delete_note(&self, id: String) -> BoxFuture<'_, AppResult<Note>> {
        Box::pin(async move { NoteService::delete_note(self, &id).await })
    }
}

fn report(operation: &'static str, error: AppError) -> AppError {
    match &error {
        AppError::Unauthorized(_) => {
            tracing::error!(operation, error = %error, "401 Unauthorized. Please check the NOTEHUB_TOKEN credential.");
        }
        _ => {
            tracing::error!(operation, kind = error.kind(), error = %error, "note service call failed");
        }
    }
    error
}
