//! Multiple-choice formatting for compacted snapshot trees.
//!
//! Turns a pruned tree's candidates into a lettered enumeration the
//! external prompt assembler embeds next to the compact tree text, plus
//! the inverse letter → index mapping the action-grounding step uses to
//! resolve the model's pick back to a backend identifier.

pub mod choices;
pub mod error;
pub mod letters;

pub use choices::{
    collect_choices, format_choices, format_extended_choices, ground_truth_letter, Choice,
    CHOICE_LABEL_TOKENS, EXTENDED_ACTIONS, NONE_OF_THE_ABOVE,
};
pub use error::{PromptError, Result};
pub use letters::{index_of, letter_of};
