//! Public types for the muninn API.

mod context;
mod suggestion;
mod typeahead;

pub use context::CursorContext;
pub use suggestion::{SuggestionGroup, SuggestionItem};
pub use typeahead::{RefreshKind, TypeaheadResult};
