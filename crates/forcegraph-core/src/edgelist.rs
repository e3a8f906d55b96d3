//! Plain-text edge-list ingestion.
//!
//! Each non-blank line holds `source target weight`, separated by whitespace.
//! Lines starting with `#` are comments. Pairs are undirected: `a b` and
//! `b a` name the same edge, and a later line overrides an earlier weight.
//! A weight of zero means "no edge" and the pair is dropped.
//!
//! Edge ids are `source-target` as first written. Two pairs that spell the
//! same id are rejected rather than merged.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::id::NodeId;
use crate::payload::{EdgeRecord, GraphPayload, NodeRecord};

/// Errors produced while reading an edge list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A line had fewer than three fields.
    #[error("line {line}: expected 'source target weight'")]
    MissingField { line: usize },

    /// The weight field was not a finite, non-negative number.
    #[error("line {line}: invalid weight '{value}'")]
    InvalidWeight { line: usize, value: String },

    /// Two distinct pairs produced the same `source-target` edge id, which
    /// happens when node ids contain `-`.
    #[error("line {line}: edge id '{id}' already names another pair")]
    DuplicateEdgeId { line: usize, id: String },
}

/// How raw weights are mapped before loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalize {
    /// Keep weights as written.
    #[default]
    None,
    /// Divide every weight by the largest one, so weights land in `(0, 1]`.
    ByMax,
}

/// Parses an edge list into a load payload.
pub fn parse_edge_list(text: &str, normalize: Normalize) -> Result<GraphPayload, ParseError> {
    let mut nodes: IndexSet<NodeId> = IndexSet::new();
    // Keyed by the unordered pair; the value keeps the first-seen orientation.
    let mut pairs: IndexMap<(NodeId, NodeId), EdgeRecord> = IndexMap::new();
    let mut ids: IndexSet<String> = IndexSet::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(source), Some(target), Some(weight)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ParseError::MissingField { line: number + 1 });
        };
        let weight = parse_weight(weight, number + 1)?;

        let source = NodeId::from(source);
        let target = NodeId::from(target);
        nodes.insert(source.clone());
        nodes.insert(target.clone());

        let key = if source <= target {
            (source.clone(), target.clone())
        } else {
            (target.clone(), source.clone())
        };
        match pairs.get_mut(&key) {
            Some(existing) => existing.weight = weight,
            None => {
                let id = format!("{}-{}", source, target);
                if !ids.insert(id.clone()) {
                    return Err(ParseError::DuplicateEdgeId {
                        line: number + 1,
                        id,
                    });
                }
                pairs.insert(key, EdgeRecord::new(id, source, target, weight));
            }
        }
    }

    let mut edges: Vec<EdgeRecord> = pairs.into_values().filter(|e| e.weight > 0.0).collect();

    if normalize == Normalize::ByMax {
        let max = edges.iter().map(|e| e.weight).fold(0.0_f64, f64::max);
        if max > 0.0 {
            for edge in &mut edges {
                edge.weight /= max;
            }
        }
    }

    Ok(GraphPayload::new(
        nodes.into_iter().map(NodeRecord::new).collect(),
        edges,
    ))
}

fn parse_weight(field: &str, line: usize) -> Result<f64, ParseError> {
    match field.parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(ParseError::InvalidWeight {
            line,
            value: field.to_string(),
        }),
    }
}
