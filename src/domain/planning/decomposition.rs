//! Splitting compound requests into ordered sub-goals.
//!
//! Despite the "graph of thought" naming used by product docs, the result
//! is a strictly linear pipeline: every step depends on the one before it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::PlanNodeId;

use super::action::ScoredAction;

/// Segments shorter than this (in characters) are discarded.
const MIN_SEGMENT_CHARS: usize = 5;

/// Conjunction-like words that separate clauses (pt, en, es).
static CONJUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "e", "and", "then", "depois", "também", "y", "luego", "além", "also",
    ]
    .into_iter()
    .collect()
});

/// Clause separators that are not words.
const PUNCTUATION_DELIMITERS: [char; 2] = [',', ';'];

/// Splits a message into clauses on commas, semicolons and conjunction
/// words, dropping fragments too short to act on.
pub fn split_compound_request(message: &str) -> Vec<String> {
    let mut segments = Vec::new();

    for part in message.split(|c| PUNCTUATION_DELIMITERS.contains(&c)) {
        let mut current: Vec<&str> = Vec::new();
        for word in part.split_whitespace() {
            if CONJUNCTIONS.contains(word.to_lowercase().as_str()) {
                push_segment(&mut segments, &current);
                current.clear();
            } else {
                current.push(word);
            }
        }
        push_segment(&mut segments, &current);
    }

    segments
}

fn push_segment(segments: &mut Vec<String>, words: &[&str]) {
    let segment = words.join(" ");
    let trimmed = segment.trim();
    if trimmed.chars().count() < MIN_SEGMENT_CHARS {
        return;
    }
    if CONJUNCTIONS.contains(trimmed.to_lowercase().as_str()) {
        return;
    }
    segments.push(trimmed.to_string());
}

/// True when the message holds more than one actionable clause.
pub fn is_multi_clause(message: &str) -> bool {
    split_compound_request(message).len() > 1
}

/// One step of a decomposed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGoal {
    /// 1-based position in the pipeline
    pub step: usize,
    pub segment: String,
    pub node_id: PlanNodeId,
    pub scored: ScoredAction,
    /// Steps that must complete first
    pub dependencies: Vec<usize>,
}

/// Ordered sub-goals of one compound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SubGoalPipeline {
    pub steps: Vec<SubGoal>,
}

impl SubGoalPipeline {
    /// Dependencies of the step at `step` (1-based) in a linear chain.
    pub fn linear_dependencies(step: usize) -> Vec<usize> {
        if step <= 1 {
            Vec::new()
        } else {
            vec![step - 1]
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
