//! Parsing of the interactive file-selection string
//!
//! The selection prompt accepts `A` (all files), `Q` (quit), comma
//! separated 1-based indices (`1,3,5`), inclusive ranges (`1-3`) and any
//! mix of the two (`1-3,5`). Duplicates are collapsed and the result is
//! ordered by ascending index.

use crate::error::{GeomergeError, Result};

/// Outcome of parsing one selection string against `count` listed files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every listed file, in display order.
    All,
    /// User asked to quit; not an error.
    Quit,
    /// Chosen 0-based indices, ascending, duplicate-free.
    Indices(Vec<usize>),
}

pub fn parse_selection(input: &str, count: usize) -> Result<Selection> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(GeomergeError::InvalidSelection {
            input: input.to_string(),
            reason: "empty input".to_string(),
        });
    }
    if trimmed.eq_ignore_ascii_case("a") {
        return Ok(Selection::All);
    }
    if trimmed.eq_ignore_ascii_case("q") {
        return Ok(Selection::Quit);
    }

    let mut picked: Vec<usize> = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(GeomergeError::InvalidSelection {
                input: input.to_string(),
                reason: "empty entry in comma list".to_string(),
            });
        }

        if let Some((lo, hi)) = part.split_once('-') {
            let lo = parse_index(input, lo)?;
            let hi = parse_index(input, hi)?;
            if lo > hi {
                return Err(GeomergeError::InvalidSelection {
                    input: input.to_string(),
                    reason: format!("range {}-{} is inverted", lo, hi),
                });
            }
            picked.extend(lo..=hi);
        } else {
            picked.push(parse_index(input, part)?);
        }
    }

    for &index in &picked {
        if index < 1 || index > count {
            return Err(GeomergeError::IndexOutOfRange { index, count });
        }
    }

    // Every comma part contributed at least one index by now.
    picked.sort_unstable();
    picked.dedup();

    // 1-based display indices to 0-based positions
    Ok(Selection::Indices(picked.into_iter().map(|i| i - 1).collect()))
}

fn parse_index(input: &str, token: &str) -> Result<usize> {
    token.trim().parse::<usize>().map_err(|_| GeomergeError::InvalidSelection {
        input: input.to_string(),
        reason: format!("'{}' is not a number", token.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_and_quit_are_case_insensitive() {
        assert_eq!(parse_selection("A", 3).unwrap(), Selection::All);
        assert_eq!(parse_selection(" a ", 3).unwrap(), Selection::All);
        assert_eq!(parse_selection("Q", 3).unwrap(), Selection::Quit);
        assert_eq!(parse_selection("q", 3).unwrap(), Selection::Quit);
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(
            parse_selection("1,3,5", 5).unwrap(),
            Selection::Indices(vec![0, 2, 4])
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            parse_selection("1-3", 5).unwrap(),
            Selection::Indices(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_mixed_range_and_list() {
        assert_eq!(
            parse_selection("1-2,4", 5).unwrap(),
            Selection::Indices(vec![0, 1, 3])
        );
    }

    #[test]
    fn test_duplicates_collapse_ascending() {
        assert_eq!(
            parse_selection("3,1,2-3,1", 5).unwrap(),
            Selection::Indices(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = parse_selection("1,6", 5).unwrap_err();
        assert!(matches!(
            err,
            GeomergeError::IndexOutOfRange { index: 6, count: 5 }
        ));
        let err = parse_selection("0", 5).unwrap_err();
        assert!(matches!(
            err,
            GeomergeError::IndexOutOfRange { index: 0, count: 5 }
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(parse_selection("3-1", 5).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_selection("", 5).is_err());
        assert!(parse_selection("  ", 5).is_err());
        assert!(parse_selection("1,,2", 5).is_err());
        assert!(parse_selection("x", 5).is_err());
        assert!(parse_selection("1-x", 5).is_err());
        assert!(parse_selection("-3", 5).is_err());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(parse_selection("x", 5).unwrap_err().is_recoverable());
        assert!(parse_selection("9", 5).unwrap_err().is_recoverable());
    }
}
