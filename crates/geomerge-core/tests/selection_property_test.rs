//! Property tests for the selection parser
//!
//! Any valid string mixing ranges and single indices must produce
//! exactly the sorted, duplicate-free union of the named 1-based
//! indices.

use geomerge_core::selection::{parse_selection, Selection};
use proptest::prelude::*;

proptest! {
    #[test]
    fn mixed_selections_yield_sorted_deduped_union(
        parts in prop::collection::vec((1usize..=20, 1usize..=20), 1..6),
        count in 20usize..=30,
    ) {
        let mut tokens: Vec<String> = Vec::new();
        let mut expected: Vec<usize> = Vec::new();
        for &(a, b) in &parts {
            if a <= b {
                tokens.push(format!("{}-{}", a, b));
                expected.extend(a..=b);
            } else {
                tokens.push(a.to_string());
                expected.push(a);
            }
        }
        let input = tokens.join(",");
        expected.sort_unstable();
        expected.dedup();
        let expected: Vec<usize> = expected.into_iter().map(|i| i - 1).collect();

        prop_assert_eq!(
            parse_selection(&input, count).unwrap(),
            Selection::Indices(expected)
        );
    }

    #[test]
    fn parsing_is_deterministic(
        parts in prop::collection::vec(1usize..=10, 1..5),
    ) {
        let input = parts.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        let first = parse_selection(&input, 10).unwrap();
        let second = parse_selection(&input, 10).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_always_rejected(index in 31usize..100, count in 1usize..=30) {
        prop_assert!(parse_selection(&index.to_string(), count).is_err());
    }
}
