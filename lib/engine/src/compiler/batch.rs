use itertools::Itertools;
use std::collections::BTreeSet;

/// Splits `input` into batches of at most `size` identifiers.
///
/// An empty input yields a single empty batch, i.e., one unrestricted execution.
pub fn batches(input: &BTreeSet<String>, size: usize) -> Vec<Vec<String>> {
    if input.is_empty() {
        return vec![Vec::new()];
    }
    input
        .iter()
        .cloned()
        .chunks(size.max(1))
        .into_iter()
        .map(Iterator::collect)
        .collect()
}
