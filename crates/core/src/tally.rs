//! Vote tallying.
//!
//! A poll stores its counts once, as the `votes` array. The per-option
//! `voteCount` view is derived from it on read, so the two can never drift.
//! Everything here is pure: reading and writing polls is the vote service's
//! job, and so is deciding whether a poll is still open.

use std::collections::BTreeSet;

use pollhub_common::{AppError, AppResult};
use pollhub_db::entities::poll::{self, PollType};
use serde::{Deserialize, Serialize};

/// Option indexes submitted with a vote: one index or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// A single option index.
    Single(usize),
    /// Several option indexes.
    Multiple(Vec<usize>),
}

impl Selection {
    /// Indexes as submitted, duplicates included.
    #[must_use]
    pub fn indexes(&self) -> &[usize] {
        match self {
            Self::Single(index) => std::slice::from_ref(index),
            Self::Multiple(indexes) => indexes,
        }
    }
}

impl From<usize> for Selection {
    fn from(index: usize) -> Self {
        Self::Single(index)
    }
}

impl From<Vec<usize>> for Selection {
    fn from(indexes: Vec<usize>) -> Self {
        Self::Multiple(indexes)
    }
}

/// One choice with its current count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    /// Choice text.
    pub text: String,
    /// Votes recorded for this choice.
    pub vote_count: u64,
}

/// A poll's choices and their counts, decoded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    choices: Vec<String>,
    votes: Vec<u64>,
}

impl Tally {
    /// Build a tally, rejecting mismatched lengths.
    pub fn new(choices: Vec<String>, votes: Vec<u64>) -> AppResult<Self> {
        if choices.len() != votes.len() {
            return Err(AppError::Internal(format!(
                "Poll has {} choices but {} vote counts",
                choices.len(),
                votes.len()
            )));
        }
        Ok(Self { choices, votes })
    }

    /// All-zero tally for freshly created choices.
    #[must_use]
    pub fn zeroed(choices: Vec<String>) -> Self {
        let votes = vec![0; choices.len()];
        Self { choices, votes }
    }

    /// Decode the JSON `choices` and `votes` columns of a poll row.
    pub fn from_model(model: &poll::Model) -> AppResult<Self> {
        let choices: Vec<String> = serde_json::from_value(model.choices.clone())
            .map_err(|e| AppError::Internal(format!("Invalid poll choices: {e}")))?;
        let votes: Vec<u64> = serde_json::from_value(model.votes.clone())
            .map_err(|e| AppError::Internal(format!("Invalid poll votes: {e}")))?;
        Self::new(choices, votes)
    }

    /// Choice texts in display order.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Counts, index-aligned with the choices.
    #[must_use]
    pub fn votes(&self) -> &[u64] {
        &self.votes
    }

    /// Choices paired with their counts.
    #[must_use]
    pub fn options(&self) -> Vec<PollOption> {
        self.choices
            .iter()
            .zip(&self.votes)
            .map(|(text, &vote_count)| PollOption {
                text: text.clone(),
                vote_count,
            })
            .collect()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.votes.iter().sum()
    }

    /// Validate `selection` and return the tally with one more vote on each
    /// distinct selected option. `self` is left untouched, so a rejected
    /// selection changes nothing.
    pub fn apply(&self, poll_type: PollType, selection: &Selection) -> AppResult<Self> {
        let indexes = validate_selection(self.choices.len(), poll_type, selection)?;
        let votes = increment(&self.votes, &indexes)?;
        Ok(Self {
            choices: self.choices.clone(),
            votes,
        })
    }
}

/// Check a selection against a poll's option count and type.
///
/// Returns the distinct indexes in ascending order. A selection that repeats
/// an index counts it once.
pub fn validate_selection(
    option_count: usize,
    poll_type: PollType,
    selection: &Selection,
) -> AppResult<Vec<usize>> {
    let indexes = selection.indexes();

    if indexes.is_empty() {
        return Err(AppError::InvalidSelection(
            "At least one option must be selected".to_string(),
        ));
    }

    if let Some(bad) = indexes.iter().find(|&&index| index >= option_count) {
        return Err(AppError::InvalidSelection(format!(
            "Option index {bad} is out of range for a poll with {option_count} options"
        )));
    }

    let distinct: Vec<usize> = indexes
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if poll_type == PollType::Single && distinct.len() != 1 {
        return Err(AppError::InvalidSelection(format!(
            "Single-choice poll accepts exactly one option, got {}",
            distinct.len()
        )));
    }

    Ok(distinct)
}

/// Add one vote to each of `indexes`.
pub fn increment(votes: &[u64], indexes: &[usize]) -> AppResult<Vec<u64>> {
    let mut updated = votes.to_vec();
    for &index in indexes {
        let count = updated.get_mut(index).ok_or_else(|| {
            AppError::InvalidSelection(format!("Option index {index} is out of range"))
        })?;
        *count = count
            .checked_add(1)
            .ok_or_else(|| AppError::Internal(format!("Vote count overflow on option {index}")))?;
    }
    Ok(updated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ab() -> Tally {
        Tally::zeroed(vec!["A".to_string(), "B".to_string()])
    }

    #[test]
    fn test_single_vote_then_out_of_range() {
        let tally = ab();

        let tally = tally.apply(PollType::Single, &Selection::from(vec![0])).unwrap();
        assert_eq!(tally.votes(), &[1, 0]);
        assert_eq!(tally.options()[0].vote_count, 1);

        let result = tally.apply(PollType::Single, &Selection::from(vec![5]));
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
        assert_eq!(tally.votes(), &[1, 0]);
    }

    #[test]
    fn test_mixed_valid_and_invalid_changes_nothing() {
        let tally = Tally::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![2, 4, 6],
        )
        .unwrap();

        let result = tally.apply(PollType::Multiple, &Selection::from(vec![1, 3]));

        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
        assert_eq!(tally.votes(), &[2, 4, 6]);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let result = ab().apply(PollType::Multiple, &Selection::Multiple(vec![]));
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_single_poll_rejects_two_options() {
        let result = ab().apply(PollType::Single, &Selection::from(vec![0, 1]));
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_single_poll_repeated_index_counts_once() {
        let tally = ab()
            .apply(PollType::Single, &Selection::from(vec![1, 1]))
            .unwrap();
        assert_eq!(tally.votes(), &[0, 1]);
    }

    #[test]
    fn test_multiple_poll_deduplicates() {
        let tally = Tally::zeroed(vec!["A".into(), "B".into(), "C".into()])
            .apply(PollType::Multiple, &Selection::from(vec![2, 0, 2]))
            .unwrap();
        assert_eq!(tally.votes(), &[1, 0, 1]);
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn test_validate_returns_sorted_distinct() {
        let indexes =
            validate_selection(4, PollType::Multiple, &Selection::from(vec![3, 1, 3, 0])).unwrap();
        assert_eq!(indexes, vec![0, 1, 3]);
    }

    #[test]
    fn test_options_view_matches_votes() {
        let tally = Tally::new(vec!["Yes".into(), "No".into()], vec![7, 3]).unwrap();

        for (option, &count) in tally.options().iter().zip(tally.votes()) {
            assert_eq!(option.vote_count, count);
        }
        assert_eq!(tally.options()[1].text, "No");
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = Tally::new(vec!["A".into(), "B".into()], vec![0]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_increment_overflow() {
        let result = increment(&[u64::MAX], &[0]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_selection_from_json() {
        let single: Selection = serde_json::from_str("2").unwrap();
        assert_eq!(single, Selection::Single(2));

        let multiple: Selection = serde_json::from_str("[0, 2]").unwrap();
        assert_eq!(multiple.indexes(), &[0, 2]);

        assert!(serde_json::from_str::<Selection>("-1").is_err());
        assert!(serde_json::from_str::<Selection>("\"0\"").is_err());
    }

    #[test]
    fn test_option_serializes_camel_case() {
        let value = serde_json::to_value(ab().options()).unwrap();
        assert_eq!(value[0]["text"], "A");
        assert_eq!(value[0]["voteCount"], 0);
    }
}
