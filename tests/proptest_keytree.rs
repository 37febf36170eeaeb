//! Property-based tests for the key tree, the palette ranker and batch
//! deletion.
#![allow(clippy::unwrap_used)]

mod common;

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use common::FakeMemcached;
use memtui::tui::keytree::KeyTree;
use memtui::tui::overlay::fuzzy::rank;
use memtui_core::batch::batch_delete;
use memtui_core::{CancelToken, KeyRecord};

// ============================================================================
// Test Strategies
// ============================================================================

/// Keys with up to four `:`-separated segments drawn from a small alphabet,
/// so folders are shared often.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-c]{1,3}(:[a-c]{1,3}){0,3}"
}

fn keys_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(key_strategy(), 0..40)
}

fn tree_of(keys: &[String]) -> KeyTree {
    let mut tree = KeyTree::new(":");
    tree.set_records(keys.iter().map(|k| KeyRecord::bare(k.clone())).collect());
    tree
}

// ============================================================================
// Tree Properties
// ============================================================================

proptest! {
    /// Property: with every folder expanded, flattening visits each distinct
    /// key exactly once
    #[test]
    fn prop_every_key_is_one_leaf(keys in keys_strategy()) {
        let mut tree = tree_of(&keys);
        tree.expand_all();

        let mut seen: HashMap<String, usize> = HashMap::new();
        for entry in tree.flattened() {
            if let Some(record) = tree.record(entry.node) {
                *seen.entry(record.key.clone()).or_default() += 1;
            }
        }

        let distinct: BTreeSet<&String> = keys.iter().collect();
        prop_assert_eq!(seen.len(), distinct.len());
        prop_assert!(seen.values().all(|&n| n == 1));
        for key in distinct {
            prop_assert!(seen.contains_key(key));
        }
        prop_assert_eq!(tree.leaf_count(), seen.len());
    }

    /// Property: the filter never adds keys and every survivor contains it
    #[test]
    fn prop_filter_is_a_substring_subset(keys in keys_strategy(), pattern in "[a-c:]{0,3}") {
        let mut tree = tree_of(&keys);
        tree.set_filter(&pattern);

        let filtered = tree.filtered_keys();
        let distinct: BTreeSet<&String> = keys.iter().collect();
        prop_assert!(filtered.len() <= distinct.len());
        for key in filtered {
            prop_assert!(key.contains(pattern.as_str()));
        }
    }

    /// Property: Down N times then Up N times returns the cursor to 0
    #[test]
    fn prop_down_then_up_returns_home(keys in keys_strategy(), n in 0usize..60) {
        let mut tree = tree_of(&keys);
        tree.home();
        for _ in 0..n {
            tree.down();
        }
        prop_assert!(tree.cursor() < tree.visible_len().max(1));
        for _ in 0..n {
            tree.up();
        }
        prop_assert_eq!(tree.cursor(), 0);
    }

    /// Property: collapsing and expanding everything never loses a key
    #[test]
    fn prop_collapse_expand_keeps_leaves(keys in keys_strategy()) {
        let mut tree = tree_of(&keys);
        let before = tree.leaf_count();
        tree.collapse_all();
        prop_assert!(tree.flattened().iter().all(|entry| entry.depth == 0));
        tree.expand_all();
        prop_assert_eq!(tree.leaf_count(), before);
    }
}

// ============================================================================
// Palette Ranking Properties
// ============================================================================

proptest! {
    /// Property: with identical descriptions, a name starting with the query
    /// outranks a name containing it only further in
    #[test]
    fn prop_prefix_outranks_interior(
        query in "[a-z]{1,6}",
        lead in "[a-z]{1,4}",
        suffix in "[a-z]{0,6}",
        description in "[a-z ]{0,20}",
    ) {
        let prefixed = format!("{}{}", query, suffix);
        let interior = format!("{}{}{}", lead, query, suffix);
        prop_assume!(!interior.starts_with(&query));

        // the interior name comes first so input order cannot decide
        let ranked = rank(
            &query,
            [(interior.as_str(), description.as_str()), (prefixed.as_str(), description.as_str())],
        );
        prop_assert_eq!(ranked.len(), 2);
        prop_assert_eq!(ranked[0].0, 1);
        prop_assert!(ranked[0].1 > ranked[1].1);
    }
}

// ============================================================================
// Batch Delete Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: every key ends up in exactly one of deleted / failed
    #[test]
    fn prop_batch_delete_partitions_keys(
        keys in prop::collection::btree_set("[a-z]{1,6}", 0..12),
        present in prop::collection::vec(any::<bool>(), 12),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(async {
            let server = FakeMemcached::start().await;
            for (key, here) in keys.iter().zip(&present) {
                if *here {
                    server.insert(key, b"v");
                }
            }
            let client = server.client();
            batch_delete(Some(&client), &keys, &CancelToken::never()).await
        });

        prop_assert_eq!(result.total(), keys.len());
        for (key, here) in keys.iter().zip(&present) {
            let deleted = result.deleted.contains(key);
            let failed = result.failed.contains(key);
            prop_assert!(deleted ^ failed, "{} in both or neither", key);
            prop_assert_eq!(deleted, *here);
            prop_assert_eq!(failed, result.errors.contains_key(key));
        }
    }

    /// Property: without a connection every key fails and none is deleted
    #[test]
    fn prop_batch_delete_without_client(
        keys in prop::collection::vec("[a-z]{1,6}", 0..12),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(batch_delete(None, &keys, &CancelToken::never()));
        prop_assert!(result.deleted.is_empty());
        prop_assert_eq!(result.failed.len(), keys.len());
        prop_assert_eq!(result.total(), keys.len());
    }
}
