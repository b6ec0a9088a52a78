//! Compiled defline template (`spec.md` §4.4, compilation steps 1-4).
//!
//! Grounded on `var_fmt.c`'s `vfmt_append`/`vfmt_find_desc_and_add_if_found`:
//! scan the pattern left to right, and at every position check whether the
//! bytes scanned so far end in a descriptor name; if so, cut a literal
//! element for everything before the match and emit a typed slot element.

use crate::varfmt::descriptor::{find_suffix_match, SlotKind};

/// One compiled piece of a template: either fixed text or a reference
/// into the caller's argument arrays.
#[derive(Debug, Clone)]
pub enum Element {
    Literal(String),
    Str { index: u8, fallback: Option<u8> },
    Int { index: u8 },
}

/// A compiled template: an ordered list of [`Element`]s plus the fixed
/// length used to size the render scratch buffer.
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) elements: Vec<Element>,
    pub(crate) fixed_len: usize,
}

/// Upper bound on a decimal `u64`'s length, used as every integer slot's
/// contribution to the fixed length (`spec.md` §4.4 step 3).
const INT_SLOT_WIDTH: usize = 20;

impl Template {
    /// Compiles `pattern` against the fixed descriptor table. Never
    /// fails: any substring not matching a descriptor name is literal
    /// text, so every pattern string is a valid template.
    pub fn compile(pattern: &str) -> Template {
        let mut elements = Vec::new();
        let bytes = pattern.as_bytes();
        let mut scan_start = 0usize;
        let mut pos = 0usize;

        while pos < bytes.len() {
            let scanned = &pattern[scan_start..=pos];
            if let Some((desc, name_len)) = find_suffix_match(scanned) {
                let literal_end = pos + 1 - name_len;
                if literal_end > scan_start {
                    elements.push(Element::Literal(pattern[scan_start..literal_end].to_string()));
                }
                elements.push(match desc.kind {
                    SlotKind::Str => Element::Str { index: desc.index, fallback: desc.fallback },
                    SlotKind::Int => Element::Int { index: desc.index },
                });
                scan_start = pos + 1;
            }
            pos += 1;
        }
        if scan_start < bytes.len() {
            elements.push(Element::Literal(pattern[scan_start..].to_string()));
        }

        let fixed_len = elements
            .iter()
            .map(|e| match e {
                Element::Literal(s) => s.len(),
                Element::Int { .. } => INT_SLOT_WIDTH,
                Element::Str { .. } => 0,
            })
            .sum();

        Template { elements, fixed_len }
    }

    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }
}
