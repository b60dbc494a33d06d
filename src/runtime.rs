use crate::debounce::Debouncer;
use crate::errors::AppResult;
use crate::models::{Note, NotesPage, QueryKey};
use crate::query::NotesQuery;
use crate::redaction::Redactor;
use crate::ui::{App, Command, Effect};
use tokio::sync::mpsc;
use tokio::time::Duration;

#[derive(Debug)]
pub enum AppEvent {
    Input(String),
    InputClosed,
    SearchSettled(String),
    Loaded(QueryKey, AppResult<NotesPage>),
    Deleted(String, AppResult<Note>),
    Created(AppResult<Note>),
}

/// Connects the pure `App` to the query layer. Search text flows through
/// the debounce stage first; settled values and finished requests come back
/// as `AppEvent`s in completion order.
pub struct Runtime {
    app: App,
    query: NotesQuery,
    debouncer: Debouncer<String>,
    events: mpsc::UnboundedSender<AppEvent>,
    redactor: Redactor,
}

impl Runtime {
    pub fn new(query: NotesQuery, debounce_window: Duration, redactor: Redactor) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (debouncer, mut settled) = Debouncer::spawn(debounce_window);

        let forward = events.clone();
        tokio::spawn(async move {
            while let Some(term) = settled.recv().await {
                if forward.send(AppEvent::SearchSettled(term)).is_err() {
                    break;
                }
            }
        });

        let runtime = Self {
            app: App::new(),
            query,
            debouncer,
            events,
            redactor,
        };
        (runtime, events_rx)
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn events(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.events.clone()
    }

    pub async fn start(&mut self) {
        let effects = self.app.start();
        self.dispatch(effects).await;
    }

    /// Applies one event. Returns false once the app asked to quit.
    pub async fn handle_event(&mut self, event: AppEvent) -> bool {
        let effects = match event {
            AppEvent::Input(line) => match Command::parse(&line).and_then(|command| self.app.handle(command)) {
                Ok(effects) => effects,
                Err(error) => {
                    self.app.notify(self.redactor.scrub(&error.to_string()));
                    Vec::new()
                }
            },
            AppEvent::InputClosed => vec![Effect::Quit],
            AppEvent::SearchSettled(term) => self.app.on_search_settled(&term),
            AppEvent::Loaded(key, result) => {
                let result = result.map_err(|error| {
                    tracing::warn!(key = %key, error = %self.redactor.scrub(&error.to_string()), "notes load failed");
                    error
                });
                tracing::debug!(key = %key, cached = self.query.cached_entries(), "notes load finished");
                self.app.on_loaded(&key, result).unwrap_or_else(|| {
                    tracing::debug!(key = %key, "discarded result for superseded key");
                    Vec::new()
                })
            }
            AppEvent::Deleted(note_id, result) => self.app.on_deleted(&note_id, result),
            AppEvent::Created(result) => self.app.on_created(result),
        };
        self.dispatch(effects).await
    }

    async fn dispatch(&mut self, effects: Vec<Effect>) -> bool {
        for effect in effects {
            match effect {
                Effect::Debounce(text) => {
                    if !self.debouncer.push(text).await {
                        tracing::warn!("search debounce stage is gone");
                    }
                }
                Effect::Load(key) => {
                    self.query.set_current_key(key.clone());
                    let query = self.query.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        let result = query.ensure(key.clone()).await;
                        let _ = events.send(AppEvent::Loaded(key, result));
                    });
                }
                Effect::Refetch(key) => {
                    self.query.set_current_key(key.clone());
                    let query = self.query.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        let result = query.fetch(key.clone()).await;
                        let _ = events.send(AppEvent::Loaded(key, result));
                    });
                }
                Effect::Delete(note_id) => {
                    let query = self.query.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        let result = query.delete_note(&note_id).await;
                        let _ = events.send(AppEvent::Deleted(note_id, result));
                    });
                }
                Effect::Create(dto) => {
                    let query = self.query.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        // A successful create always lands on the unfiltered first page.
                        let result = query.create_note(dto, QueryKey::first_page()).await;
                        let _ = events.send(AppEvent::Created(result));
                    });
                }
                Effect::Quit => return false,
            }
        }
        true
    }
}
