use crate::errors::{AppError, AppResult};
use crate::ui::note_form::FormField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Page(u32),
    Next,
    Previous,
    New,
    Field(FormField, String),
    Submit,
    Cancel,
    Delete(String),
    Refresh,
    Help,
    Quit,
}

pub const HELP: &[&str] = &[
    "search <text>     filter notes (empty clears)",
    "page <n> | next | prev",
    "new               open the create-note form",
    "title <text> | content <text> | tag <Todo|Work|Personal|Meeting|Shopping>",
    "submit | cancel   create the note or close the form",
    "delete <id>       delete a note",
    "refresh           reload the current page",
    "quit",
];

impl Command {
    pub fn parse(line: &str) -> AppResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "search" | "s" => Self::Search(rest.to_string()),
            "page" | "p" => {
                let page = rest
                    .parse::<u32>()
                    .map_err(|_| AppError::Validation(format!("'{}' is not a page number", rest)))?;
                Self::Page(page)
            }
            "next" | "n" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "new" | "create" => Self::New,
            "title" => Self::Field(FormField::Title, rest.to_string()),
            "content" => Self::Field(FormField::Content, rest.to_string()),
            "tag" => Self::Field(FormField::Tag, rest.to_string()),
            "submit" => Self::Submit,
            "cancel" | "close" => Self::Cancel,
            "delete" | "rm" => {
                if rest.is_empty() {
                    return Err(AppError::Validation("delete needs a note id".to_string()));
                }
                Self::Delete(rest.to_string())
            }
            "refresh" | "r" => Self::Refresh,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            "" => return Err(AppError::Validation("type a command, or 'help'".to_string())),
            other => return Err(AppError::Validation(format!("unknown command '{}', try 'help'", other))),
        };
        Ok(command)
    }
}
