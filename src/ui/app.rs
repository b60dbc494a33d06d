use crate::errors::{AppError, AppResult};
use crate::models::{CreateNoteDto, Note, NotesPage, QueryKey};
use crate::ui::command::{Command, HELP};
use crate::ui::modal::Modal;
use crate::ui::note_form::NoteForm;
use crate::ui::note_list::NoteList;
use crate::ui::pagination::Pagination;
use crate::ui::search_box::SearchBox;

/// Side effects the app asks its runtime to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Debounce(String),
    Load(QueryKey),
    Refetch(QueryKey),
    Delete(String),
    Create(CreateNoteDto),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Top-level screen state. Pure: every input returns the effects to run and
/// results come back through the `on_*` methods.
#[derive(Debug)]
pub struct App {
    search: SearchBox,
    settled_search: String,
    page: u32,
    modal: Modal,
    list: NoteList,
    displayed: Option<NotesPage>,
    displayed_key: Option<QueryKey>,
    load: LoadState,
    notices: Vec<String>,
    show_help: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            search: SearchBox::default(),
            settled_search: String::new(),
            page: 1,
            modal: Modal::default(),
            list: NoteList::new(),
            displayed: None,
            displayed_key: None,
            load: LoadState::Idle,
            notices: Vec::new(),
            show_help: false,
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_key(&self) -> QueryKey {
        QueryKey::new(self.page, &self.settled_search)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search_text(&self) -> &str {
        self.search.value()
    }

    pub fn settled_search(&self) -> &str {
        &self.settled_search
    }

    pub fn displayed(&self) -> Option<&NotesPage> {
        self.displayed.as_ref()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn list(&self) -> &NoteList {
        &self.list
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.displayed
            .as_ref()
            .and_then(|page| Pagination::for_page(page, self.page))
    }

    /// True while the list still shows the previous key's rows.
    pub fn is_placeholder(&self) -> bool {
        self.displayed.is_some() && self.displayed_key.as_ref() != Some(&self.current_key())
    }

    pub fn start(&mut self) -> Vec<Effect> {
        self.begin_load()
    }

    pub fn handle(&mut self, command: Command) -> AppResult<Vec<Effect>> {
        self.notices.clear();
        self.show_help = false;
        match command {
            Command::Search(text) => {
                let value = self.search.input(&text);
                Ok(vec![Effect::Debounce(value)])
            }
            Command::Page(page) => self.go_to_page(page),
            Command::Next => {
                let Some(next) = self.pagination().and_then(|pagination| pagination.next()) else {
                    return Err(AppError::Validation("Already on the last page".to_string()));
                };
                self.go_to_page(next)
            }
            Command::Previous => {
                let Some(previous) = self.pagination().and_then(|pagination| pagination.previous()) else {
                    return Err(AppError::Validation("Already on the first page".to_string()));
                };
                self.go_to_page(previous)
            }
            Command::New => {
                self.modal.open();
                Ok(Vec::new())
            }
            Command::Field(field, value) => {
                let form = self.open_form()?;
                form.set(field, &value);
                Ok(Vec::new())
            }
            Command::Submit => {
                let form = self.open_form()?;
                if form.is_submitting() {
                    return Err(AppError::Validation("Note is already being created".to_string()));
                }
                match form.validate() {
                    Ok(dto) => {
                        form.set_submitting(true);
                        Ok(vec![Effect::Create(dto)])
                    }
                    Err(errors) => Err(AppError::Validation(
                        errors
                            .iter()
                            .map(|(field, message)| format!("{}: {}", field.as_str(), message))
                            .collect::<Vec<_>>()
                            .join("; "),
                    )),
                }
            }
            Command::Cancel => {
                self.modal.close();
                Ok(Vec::new())
            }
            Command::Delete(note_id) => {
                self.list.mark_deleting(&note_id);
                Ok(vec![Effect::Delete(note_id)])
            }
            Command::Refresh => {
                self.load = LoadState::Loading;
                Ok(vec![Effect::Refetch(self.current_key())])
            }
            Command::Help => {
                self.show_help = true;
                Ok(Vec::new())
            }
            Command::Quit => Ok(vec![Effect::Quit]),
        }
    }

    pub fn on_search_settled(&mut self, term: &str) -> Vec<Effect> {
        let term = term.trim();
        if term == self.settled_search {
            return Vec::new();
        }
        self.settled_search = term.to_string();
        self.page = 1;
        self.begin_load()
    }

    /// Applies a finished load. Results for a key that is no longer current
    /// are ignored and yield `None`. A page past the last one, left behind
    /// when a mutation shrank the list, moves the view to the last page.
    pub fn on_loaded(&mut self, key: &QueryKey, result: AppResult<NotesPage>) -> Option<Vec<Effect>> {
        if *key != self.current_key() {
            return None;
        }
        match result {
            Ok(page) => {
                let last_page = page.total_pages;
                self.displayed = Some(page);
                self.displayed_key = Some(key.clone());
                self.load = LoadState::Ready;
                if last_page > 0 && self.page > last_page {
                    self.page = last_page;
                    return Some(self.begin_load());
                }
            }
            Err(error) => {
                self.load = LoadState::Failed(error.to_string());
            }
        }
        Some(Vec::new())
    }

    pub fn on_deleted(&mut self, note_id: &str, result: AppResult<Note>) -> Vec<Effect> {
        match result {
            Ok(_) => {
                self.list.clear(note_id);
                vec![Effect::Load(self.current_key())]
            }
            Err(error) => {
                self.list.mark_failed(note_id, error.to_string());
                self.notices.push("Error deleting note.".to_string());
                Vec::new()
            }
        }
    }

    pub fn on_created(&mut self, result: AppResult<Note>) -> Vec<Effect> {
        match result {
            Ok(note) => {
                self.modal.close();
                self.search.clear();
                self.settled_search.clear();
                self.page = 1;
                self.notices.push(format!("Created note \"{}\".", note.title));
                self.begin_load()
            }
            Err(error) => {
                if let Some(form) = self.modal.form_mut() {
                    form.set_submitting(false);
                }
                self.notices.push(format!("Failed to create note: {}", error));
                Vec::new()
            }
        }
    }

    pub fn notify(&mut self, message: String) {
        self.notices.push(message);
    }

    fn go_to_page(&mut self, page: u32) -> AppResult<Vec<Effect>> {
        let page = match self.pagination() {
            Some(pagination) => pagination.select(page)?,
            None if page == 1 => 1,
            None => return Err(AppError::Validation("There is only one page".to_string())),
        };
        if page == self.page {
            return Ok(Vec::new());
        }
        self.page = page;
        Ok(self.begin_load())
    }

    fn begin_load(&mut self) -> Vec<Effect> {
        self.load = LoadState::Loading;
        vec![Effect::Load(self.current_key())]
    }

    fn open_form(&mut self) -> AppResult<&mut NoteForm> {
        self.modal
            .form_mut()
            .ok_or_else(|| AppError::Validation("No form is open, use 'new' first".to_string()))
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![self.search.render()];
        if let Some(pagination) = self.pagination() {
            lines.push(pagination.render());
        }
        lines.push("[ Create note + ]".to_string());
        lines.push(String::new());

        match &self.load {
            LoadState::Loading if self.displayed.is_none() => lines.push("Loading notes...".to_string()),
            LoadState::Loading if self.is_placeholder() => lines.push("Updating...".to_string()),
            LoadState::Loading => lines.push("Refreshing...".to_string()),
            LoadState::Failed(_) => lines.push("Something went wrong loading notes.".to_string()),
            LoadState::Idle | LoadState::Ready => {}
        }
        if self.list.is_deleting() {
            lines.push("Deleting note...".to_string());
        }

        match &self.displayed {
            Some(page) if !page.results.is_empty() => lines.extend(self.list.render(&page.results)),
            _ if self.load == LoadState::Ready => lines.push("No notes found.".to_string()),
            _ => {}
        }
        lines.extend(self.notices.iter().cloned());
        lines.extend(self.modal.render());
        if self.show_help {
            lines.extend(HELP.iter().map(|line| line.to_string()));
        }
        lines
    }
}
