//! Deterministic top-K selection over a dense per-document score array.
//!
//! Order: score descending, then corpus index ascending. `-0.0` and `0.0`
//! compare equal so they fall through to the index tie-break.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::types::SearchHit;

fn canonical(score: f64) -> f64 {
    if score == 0.0 { 0.0 } else { score }
}

/// `Greater` means `a` ranks ahead of `b`.
fn rank_cmp(a: &SearchHit, b: &SearchHit) -> Ordering {
    canonical(a.score)
        .total_cmp(&canonical(b.score))
        .then_with(|| b.index.cmp(&a.index))
}

#[derive(Debug, Clone, Copy)]
struct Ranked(SearchHit);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        rank_cmp(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_cmp(&self.0, &other.0)
    }
}

/// Select the `min(k, scores.len())` best positions using a bounded min-heap.
pub fn select_top_k(scores: &[f64], k: usize) -> Vec<SearchHit> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k);
    for (index, &score) in scores.iter().enumerate() {
        let candidate = Ranked(SearchHit { index, score });
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if let Some(mut worst) = heap.peek_mut() {
            if candidate > worst.0 {
                *worst = Reverse(candidate);
            }
        }
    }
    let mut hits: Vec<SearchHit> = heap.into_iter().map(|Reverse(Ranked(hit))| hit).collect();
    hits.sort_unstable_by(|a, b| rank_cmp(b, a));
    hits
}

/// Full-sort reference with the same ordering contract as [`select_top_k`].
pub fn select_top_k_by_sort(scores: &[f64], k: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| SearchHit { index, score })
        .collect();
    hits.sort_by(|a, b| rank_cmp(b, a));
    hits.truncate(k);
    hits
}
