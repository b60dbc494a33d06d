use crate::ui::note_form::NoteForm;

/// Overlay hosting the note form. Closing discards the draft.
#[derive(Debug, Default)]
pub struct Modal {
    form: Option<NoteForm>,
}

impl Modal {
    pub fn open(&mut self) {
        if self.form.is_none() {
            self.form = Some(NoteForm::new());
        }
    }

    pub fn close(&mut self) {
        self.form = None;
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn form_mut(&mut self) -> Option<&mut NoteForm> {
        self.form.as_mut()
    }

    pub fn render(&self) -> Vec<String> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        let mut lines = vec!["+----------------------------------------".to_string()];
        lines.extend(form.render().into_iter().map(|line| format!("| {}", line)));
        lines.push("+----------------------------------------".to_string());
        lines
    }
}
