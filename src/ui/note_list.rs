use crate::models::Note;
use std::collections::HashMap;

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Deleting,
    Failed(String),
}

/// Note rows plus per-row delete state.
#[derive(Debug, Default)]
pub struct NoteList {
    rows: HashMap<String, RowState>,
}

impl NoteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_deleting(&mut self, note_id: &str) {
        self.rows.insert(note_id.to_string(), RowState::Deleting);
    }

    pub fn mark_failed(&mut self, note_id: &str, message: String) {
        self.rows.insert(note_id.to_string(), RowState::Failed(message));
    }

    pub fn clear(&mut self, note_id: &str) {
        self.rows.remove(note_id);
    }

    pub fn row_state(&self, note_id: &str) -> Option<&RowState> {
        self.rows.get(note_id)
    }

    pub fn is_deleting(&self) -> bool {
        self.rows.values().any(|state| *state == RowState::Deleting)
    }

    pub fn render(&self, notes: &[Note]) -> Vec<String> {
        notes.iter().map(|note| self.render_row(note)).collect()
    }

    fn render_row(&self, note: &Note) -> String {
        let mut line = format!("[{}] {} ({})", note.tag, note.title, note.id);
        let preview = preview(&note.content);
        if !preview.is_empty() {
            line.push_str(": ");
            line.push_str(&preview);
        }
        match self.rows.get(&note.id) {
            Some(RowState::Deleting) => line.push_str("  (deleting...)"),
            Some(RowState::Failed(message)) => {
                line.push_str("  (delete failed: ");
                line.push_str(message);
                line.push(')');
            }
            None => {}
        }
        line
    }
}

fn preview(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= PREVIEW_CHARS {
        return flattened;
    }
    let mut cut: String = flattened.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
