//! Suggestion selection state of the comparison page
//!
//! Mirrors what the page does in the browser so the same rules can be
//! enforced when the selections are posted back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use super::view::{DocumentView, RevisedToken};

/// Position of a revised token offering a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct SlotId {
    /// Paragraph position within the artifact
    pub paragraph: usize,
    /// Token index within the paragraph
    pub index: usize,
}

impl SlotId {
    pub fn new(paragraph: usize, index: usize) -> Self {
        Self { paragraph, index }
    }
}

/// `<paragraph>-<index>`, as carried by the page's `data-slot` attribute
impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.paragraph, self.index)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("No suggestions to choose from at {0}")]
    UnknownSlot(SlotId),

    #[error("'{word}' is not a suggestion at {slot}")]
    UnknownOption { slot: SlotId, word: String },

    #[error("No suggestion has been selected")]
    NothingSelected,
}

/// A replacement the user accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AcceptedSuggestion {
    pub paragraph_id: Option<i64>,
    pub paragraph: usize,
    pub index: usize,
    pub word: String,
}

#[derive(Debug, Clone)]
struct Slot {
    options: Vec<String>,
    selected: usize,
}

/// Dropdown and accept-all state over a [`DocumentView`]
///
/// At most one dropdown is open at a time. Accept-all starts disabled, is
/// enabled by any selection, and disables itself once used.
#[derive(Debug, Clone)]
pub struct SuggestionPanel {
    view: DocumentView,
    slots: BTreeMap<SlotId, Slot>,
    open: Option<SlotId>,
    accept_all_enabled: bool,
}

impl SuggestionPanel {
    pub fn new(view: DocumentView) -> Self {
        let mut slots = BTreeMap::new();
        for paragraph in &view.paragraphs {
            for token in &paragraph.revised {
                if let RevisedToken::Choice { index, options } = token {
                    slots.insert(
                        SlotId::new(paragraph.position, *index),
                        Slot {
                            options: options.clone(),
                            selected: 0,
                        },
                    );
                }
            }
        }

        Self {
            view,
            slots,
            open: None,
            accept_all_enabled: false,
        }
    }

    pub fn view(&self) -> &DocumentView {
        &self.view
    }

    /// Open the slot's dropdown, closing any other; toggling an open dropdown closes it
    pub fn toggle(&mut self, slot: SlotId) -> Result<(), SelectionError> {
        if !self.slots.contains_key(&slot) {
            return Err(SelectionError::UnknownSlot(slot));
        }

        self.open = if self.open == Some(slot) {
            None
        } else {
            Some(slot)
        };
        Ok(())
    }

    /// A click anywhere outside the open dropdown
    pub fn click_outside(&mut self) {
        self.open = None;
    }

    pub fn is_open(&self, slot: SlotId) -> bool {
        self.open == Some(slot)
    }

    pub fn open_slot(&self) -> Option<SlotId> {
        self.open
    }

    /// Pick `word` for the slot; the dropdown closes and accept-all becomes available
    pub fn select(&mut self, slot: SlotId, word: &str) -> Result<(), SelectionError> {
        let entry = self
            .slots
            .get_mut(&slot)
            .ok_or(SelectionError::UnknownSlot(slot))?;

        let position = entry
            .options
            .iter()
            .position(|option| option == word)
            .ok_or_else(|| SelectionError::UnknownOption {
                slot,
                word: word.to_string(),
            })?;

        entry.selected = position;
        if self.open == Some(slot) {
            self.open = None;
        }
        self.accept_all_enabled = true;
        Ok(())
    }

    /// Word currently shown for a choice slot
    pub fn displayed(&self, slot: SlotId) -> Option<&str> {
        self.slots
            .get(&slot)
            .and_then(|s| s.options.get(s.selected))
            .map(String::as_str)
    }

    /// Index of the shown option within the slot's options
    pub fn selected_index(&self, slot: SlotId) -> Option<usize> {
        self.slots.get(&slot).map(|s| s.selected)
    }

    pub fn accept_all_enabled(&self) -> bool {
        self.accept_all_enabled
    }

    /// Accept the current word of every choice slot and disable accept-all
    pub fn accept_all(&mut self) -> Result<Vec<AcceptedSuggestion>, SelectionError> {
        if !self.accept_all_enabled {
            return Err(SelectionError::NothingSelected);
        }
        self.accept_all_enabled = false;
        self.open = None;

        let paragraph_ids: Vec<Option<i64>> =
            self.view.paragraphs.iter().map(|p| p.paragraph_id).collect();

        Ok(self
            .slots
            .iter()
            .map(|(slot, state)| AcceptedSuggestion {
                paragraph_id: paragraph_ids.get(slot.paragraph).copied().flatten(),
                paragraph: slot.paragraph,
                index: slot.index,
                word: state.options[state.selected].clone(),
            })
            .collect())
    }

    /// Revised text with the current selections, one paragraph per line
    pub fn revised_speech(&self) -> String {
        self.view
            .paragraphs
            .iter()
            .map(|paragraph| {
                paragraph
                    .revised
                    .iter()
                    .map(|token| match token {
                        RevisedToken::Choice { index, .. } => self
                            .displayed(SlotId::new(paragraph.position, *index))
                            .unwrap_or_else(|| token.default_text()),
                        _ => token.default_text(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
