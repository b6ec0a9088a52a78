//! Compiled query tree and its evaluation over a 2-bit code window
//! (`spec.md` §4.7).
//!
//! Evaluation returns the lowest matching base offset within the window
//! for every node, not just a boolean, so that a positional handle can
//! report a 1-based starting position even when the query mixes boolean
//! combinators with a literal (`spec.md`'s "default: allowed" policy for
//! `ALLOW_POSITIONAL_OPERATOR_MIX`).

use crate::search::grammar::{compile, Node};
use crate::error::Result;

/// A query compiled once, reused across many `eval` calls.
#[derive(Debug, Clone)]
pub struct Automaton {
    root: Node,
    positional: bool,
}

impl Automaton {
    pub fn compile(query: &str) -> Result<Self> {
        let root = compile(query)?;
        let positional = contains_positional(&root);
        Ok(Automaton { root, positional })
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Evaluates the tree against `codes` (2-bit base codes, one per
    /// byte, 0..=3). Returns the lowest matching base offset within the
    /// window, or `None` if nothing matched.
    pub fn eval(&self, codes: &[u8]) -> Option<usize> {
        eval_node(&self.root, codes)
    }
}

fn contains_positional(node: &Node) -> bool {
    match node {
        Node::Positional(_) => true,
        Node::AnchorStart(inner) | Node::AnchorEnd(inner) | Node::Not(inner) => contains_positional(inner),
        Node::And(a, b) | Node::Or(a, b) => contains_positional(a) || contains_positional(b),
        Node::Fasta(_) => false,
    }
}

fn eval_node(node: &Node, codes: &[u8]) -> Option<usize> {
    match node {
        Node::Fasta(pattern) => find_literal(codes, pattern),
        Node::Positional(inner) => eval_node(inner, codes),
        Node::AnchorStart(inner) => match find_literal_len(inner) {
            Some(len) if len <= codes.len() && matches_at(codes, inner, 0) => Some(0),
            _ => None,
        },
        Node::AnchorEnd(inner) => {
            let len = find_literal_len(inner)?;
            if len > codes.len() {
                return None;
            }
            let start = codes.len() - len;
            if matches_at(codes, inner, start) {
                Some(start)
            } else {
                None
            }
        }
        Node::Not(inner) => {
            if eval_node(inner, codes).is_none() {
                Some(0)
            } else {
                None
            }
        }
        Node::And(a, b) => {
            let pa = eval_node(a, codes)?;
            let pb = eval_node(b, codes)?;
            Some(pa.min(pb))
        }
        Node::Or(a, b) => {
            let pa = eval_node(a, codes);
            let pb = eval_node(b, codes);
            match (pa, pb) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            }
        }
    }
}

fn find_literal_len(node: &Node) -> Option<usize> {
    match node {
        Node::Fasta(pattern) => Some(pattern.len()),
        Node::Positional(inner) => find_literal_len(inner),
        _ => None,
    }
}

fn matches_at(codes: &[u8], node: &Node, start: usize) -> bool {
    match node {
        Node::Fasta(pattern) => {
            start + pattern.len() <= codes.len()
                && pattern
                    .iter()
                    .enumerate()
                    .all(|(i, &p)| p == 4 || codes[start + i] == p)
        }
        Node::Positional(inner) => matches_at(codes, inner, start),
        _ => false,
    }
}

/// Scans `codes` left to right for the first base offset where `pattern`
/// matches, with code `4` in the pattern acting as a wildcard.
fn find_literal(codes: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > codes.len() {
        return None;
    }
    (0..=codes.len() - pattern.len()).find(|&start| {
        pattern.iter().enumerate().all(|(i, &p)| p == 4 || codes[start + i] == p)
    })
}
