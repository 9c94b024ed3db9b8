//! Interactive selection
//!
//! The pipeline only needs to present candidate lines and learn which ones
//! the user picked, or that they canceled. [`SelectionUi`] captures exactly
//! that; [`DialoguerUi`] and [`FzfUi`] are the two interactive backends.

mod dialoguer_ui;
mod fzf;

pub use dialoguer_ui::DialoguerUi;
pub use fzf::FzfUi;

use thiserror::Error;

/// Errors that can occur while asking the user to choose
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The built-in prompt failed (e.g. no terminal attached)
    #[error("Selection prompt failed: {0}")]
    Prompt(String),

    /// The external selector is not installed
    #[error("{0} not found. Please install it or use the builtin selector.")]
    ToolNotFound(String),

    /// The external selector failed
    #[error("Selector {tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// The selector returned something that is not one of the candidates
    #[error("Unexpected selector output: {0}")]
    InvalidOutput(String),
}

/// Which interactive backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorType {
    /// Built-in terminal prompts
    Builtin,
    /// The external `fzf` fuzzy finder
    Fzf,
}

/// What the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Indices into the candidate list, in the order the backend reported them
    Chosen(Vec<usize>),
    /// The user aborted the selection
    Canceled,
}

/// Presents candidates and returns the user's choice
pub trait SelectionUi {
    /// Lets the user choose one (`multi == false`) or several candidates
    fn choose(&self, candidates: &[String], header: &str, multi: bool)
    -> Result<Selection, SelectionError>;
}

impl<T: SelectionUi + ?Sized> SelectionUi for Box<T> {
    fn choose(
        &self,
        candidates: &[String],
        header: &str,
        multi: bool,
    ) -> Result<Selection, SelectionError> {
        (**self).choose(candidates, header, multi)
    }
}

/// Creates the selection backend of the given type
pub fn selector(selector_type: SelectorType) -> Box<dyn SelectionUi> {
    match selector_type {
        SelectorType::Builtin => Box::new(DialoguerUi::new()),
        SelectorType::Fzf => Box::new(FzfUi::new()),
    }
}
