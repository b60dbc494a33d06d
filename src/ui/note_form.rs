use crate::models::{CreateNoteDto, NoteTag};
use crate::service::{MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    Title,
    Content,
    Tag,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Tag => "tag",
        }
    }
}

/// Draft of a new note. Values are kept as typed so a rejected draft can be
/// corrected in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteForm {
    title: String,
    content: String,
    tag: String,
    errors: BTreeMap<FormField, String>,
    submitting: bool,
}

impl Default for NoteForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            tag: NoteTag::Todo.as_str().to_string(),
            errors: BTreeMap::new(),
            submitting: false,
        }
    }
}

impl NoteForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: FormField, value: &str) {
        let slot = match field {
            FormField::Title => &mut self.title,
            FormField::Content => &mut self.content,
            FormField::Tag => &mut self.tag,
        };
        *slot = value.to_string();
        self.errors.remove(&field);
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Field-level validation. On success returns the payload to send and
    /// clears any previous errors.
    pub fn validate(&mut self) -> Result<CreateNoteDto, BTreeMap<FormField, String>> {
        let mut errors = BTreeMap::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.insert(FormField::Title, "Title is required".to_string());
        } else if title.chars().count() > MAX_TITLE_CHARS {
            errors.insert(
                FormField::Title,
                format!("Title must be at most {} characters", MAX_TITLE_CHARS),
            );
        }

        let content = self.content.trim();
        if content.chars().count() > MAX_CONTENT_CHARS {
            errors.insert(
                FormField::Content,
                format!("Content must be at most {} characters", MAX_CONTENT_CHARS),
            );
        }

        let tag = match self.tag.parse::<NoteTag>() {
            Ok(tag) => Some(tag),
            Err(_) => {
                errors.insert(FormField::Tag, "Tag must be one of Todo, Work, Personal, Meeting, Shopping".to_string());
                None
            }
        };

        self.errors = errors.clone();
        match tag {
            Some(tag) if errors.is_empty() => Ok(CreateNoteDto {
                title: title.to_string(),
                content: (!content.is_empty()).then(|| content.to_string()),
                tag,
            }),
            _ => Err(errors),
        }
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            "Create note".to_string(),
            format!("  Title:   {}", self.title),
            format!("  Content: {}", self.content),
            format!("  Tag:     {}", self.tag),
        ];
        for (field, message) in &self.errors {
            lines.push(format!("  ! {}: {}", field.as_str(), message));
        }
        lines.push(if self.submitting {
            "  Creating note...".to_string()
        } else {
            "  submit | cancel".to_string()
        });
        lines
    }
}
