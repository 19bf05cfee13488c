mod artifact;
mod selection;
mod view;

pub use artifact::{apply_accepted, ComparisonDocument};
pub use selection::{AcceptedSuggestion, SlotId, SuggestionPanel};
pub use view::{DocumentView, OriginalToken, ParagraphView, RevisedToken};
