use crate::errors::{AppError, AppResult};
use crate::models::{CreateNoteDto, FetchNotesParams, Note, NoteTag, NotesPage};
use crate::service::NoteApi;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory stand-in for the NoteHub API. Newest notes come first.
#[derive(Default)]
pub struct FakeNoteApi {
    notes: Mutex<Vec<Note>>,
    failure: Mutex<Option<AppError>>,
    fetched: Mutex<Vec<FetchNotesParams>>,
    fetch_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
    next_id: AtomicUsize,
    delay: Option<Duration>,
    queued_delays: Mutex<VecDeque<Duration>>,
}

impl FakeNoteApi {
    pub fn with_notes(count: usize) -> Self {
        let now = Utc::now();
        let notes = (1..=count)
            .rev()
            .map(|index| {
                let stamp = now - ChronoDuration::minutes((count - index) as i64);
                Note {
                    id: format!("note-{}", index),
                    title: format!("Note {}", index),
                    content: format!("Body of note {}", index),
                    tag: NoteTag::ALL[index % NoteTag::ALL.len()],
                    created_at: stamp,
                    updated_at: stamp,
                }
            })
            .collect();
        Self {
            notes: Mutex::new(notes),
            next_id: AtomicUsize::new(count + 1),
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays the next fetches by these durations, one per call, before the
    /// fixed delay applies again.
    pub fn queue_delays<I>(&self, delays: I)
    where
        I: IntoIterator<Item = Duration>,
    {
        self.queued_delays.lock().expect("delay lock").extend(delays);
    }

    pub fn fail_with(&self, error: Option<AppError>) {
        *self.failure.lock().expect("failure lock") = error;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_params(&self) -> Vec<FetchNotesParams> {
        self.fetched.lock().expect("fetched lock").clone()
    }

    async fn pause_and_check(&self) -> AppResult<()> {
        self.pause(self.delay).await;
        self.check()
    }

    async fn pause(&self, delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self) -> AppResult<()> {
        match self.failure.lock().expect("failure lock").clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Answers from the notes as they are when the request is issued, like a
    /// server that has already read its rows before a slow response.
    fn page_at_issue(&self, params: &FetchNotesParams) -> NotesPage {
        let needle = params.search.as_deref().unwrap_or("").to_lowercase();
        let notes = self.notes.lock().expect("notes lock");
        let matching = notes
            .iter()
            .filter(|note| {
                needle.is_empty()
                    || note.title.to_lowercase().contains(&needle)
                    || note.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect::<Vec<_>>();
        let per_page = params.per_page.max(1) as usize;
        let total_results = matching.len();
        let total_pages = total_results.div_ceil(per_page);
        let results = matching
            .into_iter()
            .skip((params.page.max(1) as usize - 1) * per_page)
            .take(per_page)
            .collect();
        NotesPage {
            results,
            page: params.page,
            total_pages: total_pages as u32,
            total_results: total_results as u32,
        }
    }
}

impl NoteApi for FakeNoteApi {
    fn fetch_notes(&self, params: FetchNotesParams) -> BoxFuture<'_, AppResult<NotesPage>> {
        Box::pin(async move {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetched.lock().expect("fetched lock").push(params.clone());
            let page = self.page_at_issue(&params);
            let queued = self.queued_delays.lock().expect("delay lock").pop_front();
            self.pause(queued.or(self.delay)).await;
            self.check()?;
            Ok(page)
        })
    }

    fn create_note(&self, dto: CreateNoteDto) -> BoxFuture<'_, AppResult<Note>> {
        Box::pin(async move {
            self.mutation_calls.fetch_add(1, Ordering::SeqCst);
            self.pause_and_check().await?;
            let now = Utc::now();
            let note = Note {
                id: format!("note-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
                title: dto.title,
                content: dto.content.unwrap_or_default(),
                tag: dto.tag,
                created_at: now,
                updated_at: now,
            };
            self.notes.lock().expect("notes lock").insert(0, note.clone());
            Ok(note)
        })
    }

    fn delete_note(&self, id: String) -> BoxFuture<'_, AppResult<Note>> {
        Box::pin(async move {
            self.mutation_calls.fetch_add(1, Ordering::SeqCst);
            self.pause_and_check().await?;
            let mut notes = self.notes.lock().expect("notes lock");
            let Some(index) = notes.iter().position(|note| note.id == id) else {
                return Err(AppError::NotFound(format!("404 Not Found: note {} does not exist", id)));
            };
            Ok(notes.remove(index))
        })
    }
}
