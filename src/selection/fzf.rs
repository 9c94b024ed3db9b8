//! fzf-based selection
//!
//! Candidates are piped to `fzf` prefixed with their index and a tab; the
//! prefix is hidden from the user with `--with-nth` and parsed back from the
//! chosen lines.

use super::{Selection, SelectionError, SelectionUi};
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// fzf exits with 1 when nothing matched and 130 when interrupted (Esc, Ctrl-C)
const EXIT_NO_MATCH: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

/// [`SelectionUi`] spawning the external `fzf` binary
pub struct FzfUi {
    program: String,
}

impl FzfUi {
    /// Uses `fzf` from `PATH`
    pub fn new() -> Self {
        Self {
            program: "fzf".to_string(),
        }
    }

    /// Builds the stdin payload: one `<index>\t<candidate>` line per candidate
    fn input_lines(candidates: &[String]) -> String {
        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| format!("{}\t{}\n", index, candidate.replace('\n', " ")))
            .collect()
    }

    /// Parses the chosen lines back into candidate indices
    fn parse_output(stdout: &str, candidate_count: usize) -> Result<Vec<usize>, SelectionError> {
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.split_once('\t')
                    .and_then(|(index, _)| index.parse::<usize>().ok())
                    .filter(|index| *index < candidate_count)
                    .ok_or_else(|| SelectionError::InvalidOutput(line.to_string()))
            })
            .collect()
    }
}

impl Default for FzfUi {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionUi for FzfUi {
    fn choose(
        &self,
        candidates: &[String],
        header: &str,
        multi: bool,
    ) -> Result<Selection, SelectionError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--header-first")
            .arg(format!("--header={}", header))
            .arg("--cycle")
            .arg("--delimiter=\t")
            .arg("--with-nth=2..");
        if multi {
            command.arg("--multi");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => SelectionError::ToolNotFound(self.program.clone()),
                _ => SelectionError::ToolFailed {
                    tool: self.program.clone(),
                    message: format!("Failed to spawn: {}", e),
                },
            })?;

        // Closing stdin (end of scope) tells fzf the candidate list is complete
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(Self::input_lines(candidates).as_bytes())
                .map_err(|e| SelectionError::ToolFailed {
                    tool: self.program.clone(),
                    message: format!("Failed to write candidates: {}", e),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SelectionError::ToolFailed {
                tool: self.program.clone(),
                message: format!("Failed to read output: {}", e),
            })?;

        match output.status.code() {
            Some(0) => {}
            Some(EXIT_NO_MATCH) | Some(EXIT_INTERRUPTED) => return Ok(Selection::Canceled),
            code => {
                return Err(SelectionError::ToolFailed {
                    tool: self.program.clone(),
                    message: format!("exit code {:?}", code),
                });
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let indices = Self::parse_output(&stdout, candidates.len())?;
        if indices.is_empty() {
            return Ok(Selection::Canceled);
        }

        Ok(Selection::Chosen(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_lines() {
        let candidates = vec!["[2021] Dune".to_string(), "[2024] Dune: Prophecy".to_string()];
        assert_eq!(
            FzfUi::input_lines(&candidates),
            "0\t[2021] Dune\n1\t[2024] Dune: Prophecy\n"
        );
    }

    #[test]
    fn test_parse_output() {
        let indices = FzfUi::parse_output("2\t[S01E03] C\n0\t[S01E01] A\n", 3).unwrap();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_parse_output_rejects_unknown_lines() {
        assert!(matches!(
            FzfUi::parse_output("7\t[S01E08] H\n", 3),
            Err(SelectionError::InvalidOutput(_))
        ));
        assert!(FzfUi::parse_output("no tab here\n", 3).is_err());
    }

    #[test]
    fn test_parse_output_empty() {
        assert!(FzfUi::parse_output("\n", 3).unwrap().is_empty());
    }
}
