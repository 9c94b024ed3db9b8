//! Built-in terminal selection prompts.

use super::{Selection, SelectionError, SelectionUi};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{FuzzySelect, MultiSelect};

/// [`SelectionUi`] using `dialoguer` prompts.
///
/// Single choices use a fuzzy-searchable list, multiple choices a checkbox
/// list toggled with space. Escape cancels.
pub struct DialoguerUi {
    theme: ColorfulTheme,
}

impl DialoguerUi {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerUi {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionUi for DialoguerUi {
    fn choose(
        &self,
        candidates: &[String],
        header: &str,
        multi: bool,
    ) -> Result<Selection, SelectionError> {
        if multi {
            let chosen = MultiSelect::with_theme(&self.theme)
                .with_prompt(header)
                .items(candidates)
                .interact_opt()
                .map_err(|e| SelectionError::Prompt(e.to_string()))?;

            return Ok(match chosen {
                Some(indices) if !indices.is_empty() => Selection::Chosen(indices),
                _ => Selection::Canceled,
            });
        }

        let chosen = FuzzySelect::with_theme(&self.theme)
            .with_prompt(header)
            .items(candidates)
            .default(0)
            .interact_opt()
            .map_err(|e| SelectionError::Prompt(e.to_string()))?;

        Ok(match chosen {
            Some(index) => Selection::Chosen(vec![index]),
            None => Selection::Canceled,
        })
    }
}
