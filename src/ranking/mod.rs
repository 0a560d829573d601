// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Top-K ranking of raw class scores into a human-readable result.

pub mod labels;

pub use labels::load_class_labels;

use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("score index {index} has no label (label table has {label_count} entries)")]
    IndexOutOfRange { index: usize, label_count: usize },
}

/// One ranked class with its probability in percent, two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    pub class_name: String,
    pub probability: f64,
}

/// Ranks the `k` highest-scoring classes.
///
/// Scores are paired with their indices and sorted descending, ties broken by
/// ascending index so the ranking is deterministic. The first `k` survive;
/// probabilities are `score * 100` rounded to two decimals, and entries not
/// strictly above zero are dropped. A surviving index with no corresponding
/// label is a fatal configuration mismatch between the model output width
/// and the label table.
pub fn top_k_classes(
    scores: &[f32],
    labels: &[String],
    k: usize,
) -> Result<Vec<ClassScore>, RankError> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    indexed.truncate(k);

    let mut ranked = Vec::with_capacity(indexed.len());
    for (index, score) in indexed {
        let probability = (f64::from(score) * 100.0 * 100.0).round() / 100.0;
        if probability <= 0.0 {
            continue;
        }
        let class_name = labels.get(index).ok_or(RankError::IndexOutOfRange {
            index,
            label_count: labels.len(),
        })?;
        ranked.push(ClassScore {
            class_name: class_name.clone(),
            probability,
        });
    }
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranks_all_positive_scores_descending() {
        let result = top_k_classes(&[0.01, 0.9, 0.09], &labels(&["cat", "dog", "bird"]), 5)
            .unwrap();
        assert_eq!(
            result,
            vec![
                ClassScore {
                    class_name: "dog".to_string(),
                    probability: 90.00
                },
                ClassScore {
                    class_name: "bird".to_string(),
                    probability: 9.00
                },
                ClassScore {
                    class_name: "cat".to_string(),
                    probability: 1.00
                },
            ]
        );
    }

    #[test]
    fn zero_scores_are_filtered_out() {
        let result =
            top_k_classes(&[1.0, 0.0, 0.0], &labels(&["cat", "dog", "bird"]), 5).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].class_name, "cat");
        assert_eq!(result[0].probability, 100.00);
    }

    #[test]
    fn returns_at_most_k_entries_sorted_non_increasing() {
        let scores = [0.1, 0.3, 0.05, 0.25, 0.2, 0.1];
        let table = labels(&["a", "b", "c", "d", "e", "f"]);
        for k in 1..=scores.len() {
            let result = top_k_classes(&scores, &table, k).unwrap();
            assert!(result.len() <= k);
            for pair in result.windows(2) {
                assert!(pair[0].probability >= pair[1].probability);
            }
            for entry in &result {
                assert!(entry.probability > 0.0 && entry.probability <= 100.0);
            }
        }
    }

    #[test]
    fn ties_break_by_lower_index_deterministically() {
        let scores = [0.4, 0.4, 0.2];
        let table = labels(&["first", "second", "third"]);
        let a = top_k_classes(&scores, &table, 3).unwrap();
        let b = top_k_classes(&scores, &table, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].class_name, "first");
        assert_eq!(a[1].class_name, "second");
    }

    #[test]
    fn missing_label_for_surviving_index_is_fatal() {
        let result = top_k_classes(&[0.1, 0.2, 0.7], &labels(&["cat", "dog"]), 5);
        assert!(matches!(
            result,
            Err(RankError::IndexOutOfRange {
                index: 2,
                label_count: 2
            })
        ));
    }

    #[test]
    fn short_label_table_is_fine_when_top_indices_are_covered() {
        // Index 2 scores zero and never survives, so its missing label is
        // never consulted.
        let result = top_k_classes(&[0.3, 0.7, 0.0], &labels(&["cat", "dog"]), 5).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn vector_shorter_than_k_yields_only_real_entries() {
        let result = top_k_classes(&[0.6, 0.4], &labels(&["cat", "dog"]), 10).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn probabilities_round_to_two_decimals() {
        let result = top_k_classes(&[0.123456], &labels(&["cat"]), 1).unwrap();
        assert_eq!(result[0].probability, 12.35);
    }

    #[test]
    fn negligible_scores_round_to_zero_and_drop() {
        let result = top_k_classes(&[0.9, 0.00004], &labels(&["cat", "dog"]), 5).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].class_name, "cat");
    }

    #[test]
    fn empty_vector_yields_empty_result() {
        let result = top_k_classes(&[], &labels(&["cat"]), 5).unwrap();
        assert!(result.is_empty());
    }
}
