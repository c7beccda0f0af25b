use std::collections::HashMap;
use std::hash::Hash;

pub const DEFAULT_RRF_K: f64 = 60.0;

/// Reciprocal Rank Fusion: each item gains `1 / (k + rank + 1)` per list it
/// appears in (`rank` is 0-based). Sorted by total score, highest first;
/// equal totals keep the order in which items were first seen.
pub fn rrf_scores<T, L>(lists: &[L], k: f64) -> Vec<(T, f64)>
where
    T: Clone + Eq + Hash,
    L: AsRef<[T]>,
{
    let mut fused: Vec<(T, f64)> = Vec::new();
    let mut slot: HashMap<T, usize> = HashMap::new();
    for list in lists {
        for (rank, item) in list.as_ref().iter().enumerate() {
            let gain = 1.0 / (k + rank as f64 + 1.0);
            match slot.get(item) {
                Some(&i) => fused[i].1 += gain,
                None => {
                    slot.insert(item.clone(), fused.len());
                    fused.push((item.clone(), gain));
                }
            }
        }
    }
    fused.sort_by(|a, b| b.1.total_cmp(&a.1));
    fused
}

pub fn rrf_combine<T, L>(lists: &[L], k: f64) -> Vec<T>
where
    T: Clone + Eq + Hash,
    L: AsRef<[T]>,
{
    rrf_scores(lists, k).into_iter().map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_list_keeps_its_order() {
        let list = ids(&["c", "a", "b"]);
        assert_eq!(rrf_combine(&[list.clone()], DEFAULT_RRF_K), list);
    }

    #[test]
    fn fusion_is_symmetric() {
        let a = ids(&["x", "y", "z"]);
        let b = ids(&["z", "w", "x"]);
        let ab = rrf_scores(&[a.clone(), b.clone()], DEFAULT_RRF_K);
        let ba = rrf_scores(&[b, a], DEFAULT_RRF_K);
        let as_map = |v: Vec<(String, f64)>| v.into_iter().collect::<HashMap<_, _>>();
        assert_eq!(as_map(ab), as_map(ba));
    }

    #[test]
    fn items_in_both_lists_win() {
        let lexical = ids(&["a", "b", "c"]);
        let vector = ids(&["d", "c", "e"]);
        let fused = rrf_scores(&[lexical, vector], DEFAULT_RRF_K);
        assert_eq!(fused[0].0, "c");
        let expected = 1.0 / 63.0 + 1.0 / 62.0;
        assert!((fused[0].1 - expected).abs() < 1e-12);
        // a and d tie at 1/61; a was seen first
        assert_eq!(fused[1].0, "a");
        assert_eq!(fused[2].0, "d");
    }

    #[test]
    fn empty_input_fuses_to_nothing() {
        let lists: Vec<Vec<String>> = Vec::new();
        assert!(rrf_combine(&lists, DEFAULT_RRF_K).is_empty());
    }
}
