use std::cmp::Ordering;
use std::sync::Arc;

use super::tree::{ROOT_ID, Tree, TreeNode};

pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// How far from the start of a label a match may drift before the location
/// penalty alone reaches 1.0.
pub const DEFAULT_DISTANCE: usize = 100;

/// A ranked approximate string matcher. Lower scores are better; `None`
/// means "not a match".
pub trait Matcher {
    fn score(&self, pattern: &str, text: &str) -> Option<f64>;
}

/// Scores a pattern against the best-matching substring of the text:
/// `errors / pattern_len + start / distance`, case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceMatcher {
    pub threshold: f64,
    pub distance: usize,
}

impl Default for EditDistanceMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            distance: DEFAULT_DISTANCE,
        }
    }
}

impl EditDistanceMatcher {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

impl Matcher for EditDistanceMatcher {
    fn score(&self, pattern: &str, text: &str) -> Option<f64> {
        let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
        if pattern.is_empty() {
            return Some(0.0);
        }
        let text: Vec<char> = text.to_lowercase().chars().collect();
        let distance = self.distance.max(1) as f64;

        let score = alignments(&pattern, &text)
            .into_iter()
            .map(|(errors, start)| errors as f64 / pattern.len() as f64 + start as f64 / distance)
            .fold(f64::INFINITY, f64::min);
        (score <= self.threshold).then_some(score)
    }
}

/// For every end offset in `text`, the fewest edits turning `pattern` into a
/// substring ending there, with that substring's start. Ties prefer the
/// earlier start.
fn alignments(pattern: &[char], text: &[char]) -> Vec<(usize, usize)> {
    // Each cell holds (cost, start of the text substring being aligned).
    // Row 0 is free at every column so the match may begin anywhere.
    let mut prev: Vec<(usize, usize)> = (0..=text.len()).map(|j| (0, j)).collect();
    let mut curr = vec![(0, 0); text.len() + 1];

    for (i, &p) in pattern.iter().enumerate() {
        curr[0] = (i + 1, 0);
        for j in 1..=text.len() {
            let (sub_cost, sub_start) = prev[j - 1];
            let diagonal = (sub_cost + usize::from(p != text[j - 1]), sub_start);
            let skip_pattern = (prev[j].0 + 1, prev[j].1);
            let skip_text = (curr[j - 1].0 + 1, curr[j - 1].1);
            curr[j] = diagonal.min(skip_pattern).min(skip_text);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev
}

/// Filter `tree` down to the nodes whose label matches `query`.
///
/// An empty query hands back the same tree. Otherwise the result is a flat
/// tree: the root's children are the matches in rank order, and matched
/// folders are listed without their contents.
pub fn project(tree: &Arc<Tree>, query: &str) -> Arc<Tree> {
    project_with(tree, query, &EditDistanceMatcher::default())
}

pub fn project_with(tree: &Arc<Tree>, query: &str, matcher: &impl Matcher) -> Arc<Tree> {
    if query.is_empty() {
        return Arc::clone(tree);
    }

    let mut ranked: Vec<(f64, &TreeNode)> = tree
        .flatten()
        .into_iter()
        .filter_map(|node| matcher.score(query, &node.label).map(|s| (s, node)))
        .collect();
    // Stable sort keeps depth-first order among equal scores.
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut root = tree.root().clone();
    root.children.clear();
    let mut result = Tree::new(root);

    for (_, node) in ranked {
        let mut flat = node.clone();
        flat.children.clear();
        result.insert(ROOT_ID, flat);
    }

    log::debug!(
        "search {:?}: {} of {} items matched",
        query,
        result.root().children.len(),
        tree.len().saturating_sub(1)
    );
    Arc::new(result)
}
