//! Column order persistence.
//!
//! Children of a group iterate lexicographically, so insertion order is
//! stored as a permutation: entry `i` is the lexicographic index of the
//! `i`-th inserted key.

/// Permutation reproducing `insertion` from its sorted order.
pub fn order_permutation(insertion: &[String]) -> Vec<i64> {
    let mut sorted: Vec<&String> = insertion.iter().collect();
    sorted.sort();
    insertion
        .iter()
        .map(|key| sorted.binary_search(&key).map_or(-1, |i| i as i64))
        .collect()
}

/// Apply a persisted permutation to lexicographically sorted keys.
///
/// Returns `None` unless `order` is a permutation of `0..sorted.len()`.
pub fn apply_order(sorted: &[String], order: &[i64]) -> Option<Vec<String>> {
    if order.len() != sorted.len() {
        return None;
    }
    let mut seen = vec![false; sorted.len()];
    let mut out = Vec::with_capacity(sorted.len());
    for &i in order {
        let i = usize::try_from(i).ok().filter(|i| *i < sorted.len())?;
        if std::mem::replace(&mut seen[i], true) {
            return None;
        }
        out.push(sorted[i].clone());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn permutation_restores_insertion_order() {
        let insertion = keys(&["b", "a", "c"]);
        let order = order_permutation(&insertion);
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(apply_order(&keys(&["a", "b", "c"]), &order), Some(insertion));
    }

    #[test]
    fn invalid_permutations_are_refused() {
        let sorted = keys(&["a", "b"]);
        assert_eq!(apply_order(&sorted, &[0]), None);
        assert_eq!(apply_order(&sorted, &[0, 0]), None);
        assert_eq!(apply_order(&sorted, &[0, 2]), None);
        assert_eq!(apply_order(&sorted, &[-1, 0]), None);
    }
}
