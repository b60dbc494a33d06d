pub mod app;
pub mod command;
pub mod modal;
pub mod note_form;
pub mod note_list;
pub mod pagination;
pub mod search_box;

pub use app::{App, Effect, LoadState};
pub use command::Command;
