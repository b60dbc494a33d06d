use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteTag {
    #[default]
    Todo,
    Work,
    Personal,
    Meeting,
    Shopping,
}

impl NoteTag {
    pub const ALL: [NoteTag; 5] = [
        Self::Todo,
        Self::Work,
        Self::Personal,
        Self::Meeting,
        Self::Shopping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Meeting => "Meeting",
            Self::Shopping => "Shopping",
        }
    }
}

impl fmt::Display for NoteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteTag {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown tag '{}': expected one of {}",
                    trimmed,
                    Self::ALL.map(NoteTag::as_str).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    #[serde(alias = "notes")]
    pub results: Vec<Note>,
    #[serde(default)]
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl NotesPage {
    /// Fills fields the list endpoint may omit: `page` falls back to the
    /// requested page and `totalResults` to at least the number of rows.
    pub fn normalized(mut self, requested_page: u32) -> Self {
        if self.page == 0 {
            self.page = requested_page.max(1);
        }
        let row_count = u32::try_from(self.results.len()).unwrap_or(u32::MAX);
        if self.total_results < row_count {
            self.total_results = row_count;
        }
        self
    }

    pub fn contains(&self, note_id: &str) -> bool {
        self.results.iter().any(|note| note.id == note_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchNotesParams {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FetchNotesParams {
    pub fn new(page: u32, per_page: u32, search: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self {
            page,
            per_page,
            search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteDto {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub tag: NoteTag,
}

/// Addresses one cached page of notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub page: u32,
    pub search: String,
}

impl QueryKey {
    pub fn new(page: u32, search: &str) -> Self {
        Self {
            page: page.max(1),
            search: search.trim().to_string(),
        }
    }

    pub fn first_page() -> Self {
        Self::new(1, "")
    }

    pub fn params(&self, per_page: u32) -> FetchNotesParams {
        FetchNotesParams::new(self.page, per_page, Some(&self.search))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notes[page={}, search={:?}]", self.page, self.search)
    }
}
