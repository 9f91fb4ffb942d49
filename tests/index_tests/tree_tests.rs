//! Tests for the Ordered Index
//!
//! These tests verify:
//! - Insert, find and duplicate rejection
//! - The first-character descent rule
//! - All four delete cases, including successor promotion
//! - Min/max, traversal and clear
//! - Traversal matches the live set after random insert/delete sequences

use std::collections::BTreeSet;

use phonebook::index::{KeyOrdering, OrderedIndex};
use phonebook::PhonebookError;

// =============================================================================
// Helper Functions
// =============================================================================

fn index_with(ordering: KeyOrdering, names: &[&str]) -> OrderedIndex<String> {
    let mut index = OrderedIndex::new(ordering);
    for (i, name) in names.iter().enumerate() {
        index.insert(*name, format!("{}", i), i as u64 * 10).unwrap();
    }
    index
}

fn traversal(index: &OrderedIndex<String>) -> Vec<String> {
    index.iter().map(|record| record.name.clone()).collect()
}

fn name_of(index: &OrderedIndex<String>, id: phonebook::index::NodeId) -> String {
    index.get(id).unwrap().name.clone()
}

/// Tiny deterministic generator so sequences are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// =============================================================================
// Insert / Find Tests
// =============================================================================

#[test]
fn test_new_index_is_empty() {
    let index: OrderedIndex<String> = OrderedIndex::new(KeyOrdering::FirstChar);
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert!(index.root().is_none());
    assert!(index.first().is_none());
    assert_eq!(index.iter().count(), 0);
}

#[test]
fn test_insert_and_find() {
    let index = index_with(KeyOrdering::FirstChar, &["Mario", "Anna", "Zoe"]);

    let id = index.find("Anna").unwrap();
    let record = index.get(id).unwrap();
    assert_eq!(record.name, "Anna");
    assert_eq!(record.value, "1");
    assert_eq!(record.offset, 10);
    assert!(index.find("Bruno").is_none());
    assert_eq!(index.len(), 3);
}

#[test]
fn test_insert_duplicate_is_rejected() {
    let mut index = index_with(KeyOrdering::FirstChar, &["Mario", "Anna"]);

    let result = index.insert("Anna", "other".to_string(), 99);
    assert!(matches!(result, Err(PhonebookError::DuplicateName)));
    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup("Anna").unwrap().value, "1");
    assert_eq!(index.lookup("Anna").unwrap().offset, 10);
}

#[test]
fn test_duplicate_detected_past_same_first_char() {
    // "Alex" is attached below "Anna"; re-inserting "Anna" meets it at the root
    let mut index = index_with(KeyOrdering::FirstChar, &["Anna", "Alex"]);
    assert!(index.insert("Anna", String::new(), 0).is_err());
    // and re-inserting "Alex" finds it on the left chain
    assert!(index.insert("Alex", String::new(), 0).is_err());
    assert_eq!(index.len(), 2);
}

#[test]
fn test_first_char_ties_descend_left() {
    let index = index_with(KeyOrdering::FirstChar, &["Mario", "Marco", "Mirko", "Nadia"]);

    let root = index.root().unwrap();
    assert_eq!(name_of(&index, root), "Mario");

    let left = index.left(root).unwrap();
    assert_eq!(name_of(&index, left), "Marco");
    let left_left = index.left(left).unwrap();
    assert_eq!(name_of(&index, left_left), "Mirko");
    assert_eq!(name_of(&index, index.right(root).unwrap()), "Nadia");

    assert_eq!(index.parent(left_left), Some(left));
    assert_eq!(index.parent(left), Some(root));
    assert_eq!(index.parent(root), None);
}

#[test]
fn test_lexicographic_ordering_sorts_traversal() {
    let index = index_with(KeyOrdering::Lexicographic, &["Mario", "Marco", "Mirko", "Anna", "Zoe"]);

    assert_eq!(traversal(&index), vec!["Anna", "Marco", "Mario", "Mirko", "Zoe"]);
    assert!(index.verify().is_ok());
}

#[test]
fn test_first_char_traversal_groups_by_first_byte() {
    let index = index_with(KeyOrdering::FirstChar, &["Mario", "Anna", "Mirko", "Zoe", "Bea"]);

    let first_bytes: Vec<u8> = traversal(&index).iter().map(|n| n.as_bytes()[0]).collect();
    let mut sorted = first_bytes.clone();
    sorted.sort();
    assert_eq!(first_bytes, sorted);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_leaf() {
    let mut index = index_with(KeyOrdering::FirstChar, &["Mario", "Anna", "Zoe"]);

    let removed = index.remove("Zoe").unwrap();
    assert_eq!(removed.name, "Zoe");
    assert_eq!(removed.offset, 20);
    assert!(index.find("Zoe").is_none());
    assert!(index.right(index.root().unwrap()).is_none());
    assert!(index.verify().is_ok());
}

#[test]
fn test_delete_only_node_clears_root() {
    let mut index = index_with(KeyOrdering::FirstChar, &["Solo"]);

    index.remove("Solo").unwrap();
    assert!(index.root().is_none());
    assert!(index.is_empty());
}

#[test]
fn test_delete_left_only_promotes_max_of_left() {
    let mut index = index_with(KeyOrdering::Lexicographic, &["M", "D", "B", "F"]);
    let root = index.root().unwrap();

    let removed = index.delete(root).unwrap();
    assert_eq!(removed.name, "M");
    // max of the left subtree ("F") now sits in the root slot
    assert_eq!(name_of(&index, index.root().unwrap()), "F");
    assert_eq!(index.lookup("F").unwrap().offset, 30);
    assert_eq!(traversal(&index), vec!["B", "D", "F"]);
    assert!(index.verify().is_ok());
}

#[test]
fn test_delete_right_only_promotes_min_of_right() {
    let mut index = index_with(KeyOrdering::Lexicographic, &["B", "F", "D", "H"]);
    let root = index.root().unwrap();

    index.delete(root).unwrap();
    assert_eq!(name_of(&index, index.root().unwrap()), "D");
    assert_eq!(traversal(&index), vec!["D", "F", "H"]);
    assert!(index.verify().is_ok());
}

#[test]
fn test_delete_two_children_promotes_successor() {
    let mut index = index_with(KeyOrdering::Lexicographic, &["M", "D", "T", "P", "W", "R"]);
    let root = index.root().unwrap();

    let removed = index.delete(root).unwrap();
    assert_eq!(removed.name, "M");
    // in-order successor is "P", whose right child "R" is promoted in turn
    assert_eq!(name_of(&index, index.root().unwrap()), "P");
    let t = index.right(index.root().unwrap()).unwrap();
    assert_eq!(name_of(&index, t), "T");
    assert_eq!(name_of(&index, index.left(t).unwrap()), "R");
    assert_eq!(index.lookup("P").unwrap().value, "3");
    assert_eq!(traversal(&index), vec!["D", "P", "R", "T", "W"]);
    assert!(index.verify().is_ok());
}

#[test]
fn test_delete_then_find_is_not_found() {
    let names = ["Mario", "Anna", "Zoe", "Marco", "Bea", "Ugo", "Carla"];
    for ordering in [KeyOrdering::FirstChar, KeyOrdering::Lexicographic] {
        for victim in names {
            let mut index = index_with(ordering, &names);
            index.remove(victim).unwrap();
            assert!(index.find(victim).is_none(), "{:?} still finds {}", ordering, victim);
            assert_eq!(index.len(), names.len() - 1);
        }
    }
}

#[test]
fn test_delete_stale_id_returns_none() {
    let mut index = index_with(KeyOrdering::FirstChar, &["Mario", "Anna"]);
    let anna = index.find("Anna").unwrap();

    index.delete(anna).unwrap();
    assert!(index.delete(anna).is_none());
    assert!(index.get(anna).is_none());
}

#[test]
fn test_first_char_tie_found_after_successor_promotion() {
    // "cow" sits left of "cat"; deleting "bob" promotes "cow" into the root
    // slot, leaving "cat" on its right with the same first byte
    let mut index = index_with(KeyOrdering::FirstChar, &["bob", "cat", "cow"]);
    index.remove("bob").unwrap();

    assert_eq!(name_of(&index, index.root().unwrap()), "cow");
    assert_eq!(name_of(&index, index.right(index.root().unwrap()).unwrap()), "cat");
    assert_eq!(index.lookup("cat").unwrap().value, "1");
    assert!(matches!(
        index.insert("cat", "9".to_string(), 99),
        Err(PhonebookError::DuplicateName)
    ));
    assert_eq!(traversal(&index).len(), 2);

    assert_eq!(index.remove("cat").unwrap().offset, 10);
    assert!(index.find("cat").is_none());
    assert!(index.verify().is_ok());
}

// =============================================================================
// Min / Max / Clear Tests
// =============================================================================

#[test]
fn test_min_max() {
    let index = index_with(KeyOrdering::Lexicographic, &["M", "D", "T", "B", "Z"]);
    let root = index.root().unwrap();

    assert_eq!(name_of(&index, index.min(root).unwrap()), "B");
    assert_eq!(name_of(&index, index.max(root).unwrap()), "Z");
    assert_eq!(index.first().unwrap().name, "B");
    assert_eq!(index.last().unwrap().name, "Z");

    let d = index.find("D").unwrap();
    assert_eq!(name_of(&index, index.min(d).unwrap()), "B");
    assert_eq!(name_of(&index, index.max(d).unwrap()), "D");
}

#[test]
fn test_clear_subtree() {
    let mut index = index_with(KeyOrdering::Lexicographic, &["M", "D", "T", "B", "F", "Z"]);
    let d = index.find("D").unwrap();

    assert_eq!(index.clear_subtree(d), 3);
    assert_eq!(index.len(), 3);
    assert_eq!(traversal(&index), vec!["M", "T", "Z"]);
    assert!(index.left(index.root().unwrap()).is_none());
    assert!(index.verify().is_ok());
}

#[test]
fn test_clear_deep_tree() {
    // Sorted inserts build a degenerate chain
    let mut index = OrderedIndex::new(KeyOrdering::Lexicographic);
    for i in 0..10_000u32 {
        index.insert(format!("{:08}", i), i, i as u64).unwrap();
    }
    assert_eq!(index.len(), 10_000);

    index.clear();
    assert!(index.is_empty());
    assert!(index.root().is_none());
    assert_eq!(index.iter().count(), 0);
}

// =============================================================================
// Property Tests
// =============================================================================

#[test]
fn test_random_sequences_keep_traversal_equal_to_live_set() {
    let alphabet: Vec<String> = (0..60)
        .map(|i| format!("{}{}", (b'A' + (i % 7) as u8) as char, i))
        .collect();

    for ordering in [KeyOrdering::FirstChar, KeyOrdering::Lexicographic] {
        let mut rng = Lcg(42);
        let mut index: OrderedIndex<String> = OrderedIndex::new(ordering);
        let mut live = BTreeSet::new();

        for step in 0..3000 {
            let name = &alphabet[(rng.next() % alphabet.len() as u64) as usize];
            if rng.next() % 3 == 0 {
                let victim = index.iter().nth((rng.next() % (live.len().max(1) as u64)) as usize);
                if let Some(victim) = victim.map(|r| r.name.clone()) {
                    let removed = index.remove(&victim).map(|record| record.name);
                    assert_eq!(removed.as_deref(), Some(victim.as_str()), "{:?} step {}", ordering, step);
                    live.remove(&victim);
                }
            } else if !live.contains(name) {
                index.insert(name.clone(), String::new(), step).unwrap();
                live.insert(name.clone());
            }

            let mut seen: Vec<String> = traversal(&index);
            seen.sort();
            let expected: Vec<String> = live.iter().cloned().collect();
            assert_eq!(seen, expected, "{:?} diverged at step {}", ordering, step);
            assert_eq!(index.len(), live.len());
            assert!(index.verify().is_ok(), "{:?} invariant broken at step {}", ordering, step);
        }
    }
}

#[test]
fn test_random_sequences_find_and_duplicates() {
    for ordering in [KeyOrdering::FirstChar, KeyOrdering::Lexicographic] {
        let mut rng = Lcg(7);
        let mut index: OrderedIndex<String> = OrderedIndex::new(ordering);
        let mut live = BTreeSet::new();

        for step in 0..3000u64 {
            // Few distinct first letters, so first-byte ties are common
            let n = rng.next() % 200;
            let name = format!("{}{}", (b'a' + (n % 5) as u8) as char, n);

            if rng.next() % 2 == 0 {
                let removed = index.remove(&name);
                assert_eq!(removed.is_some(), live.remove(&name), "{:?} step {}", ordering, step);
                assert!(index.find(&name).is_none());
            } else {
                let result = index.insert(name.clone(), String::new(), step);
                if live.insert(name.clone()) {
                    assert!(result.is_ok(), "{:?} step {}", ordering, step);
                } else {
                    assert!(
                        matches!(result, Err(PhonebookError::DuplicateName)),
                        "{:?} accepted duplicate {} at step {}",
                        ordering,
                        name,
                        step
                    );
                }
            }

            assert_eq!(index.len(), live.len());
            for name in &live {
                assert!(index.find(name).is_some(), "{:?} lost {} at step {}", ordering, name, step);
            }
        }
    }
}
