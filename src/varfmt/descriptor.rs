//! The fixed descriptor table for defline templates (`spec.md` §4.4).
//!
//! Grounded on `var_fmt.c`'s `vfmt_desc_list_t` / `vfmt_find_desc`: a flat
//! table of `(name, kind, index, fallback)` tuples, matched by longest
//! suffix during template compilation. Here it's simply a `const` slice
//! rather than a runtime-built `Vector`, since the source tool always
//! populates it with the same fixed set before compiling any template.

/// What a descriptor slot resolves to at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Str,
    Int,
}

/// One entry of the descriptor table: a `$name`, its kind, the primary
/// argument index, and an optional fallback integer index used when the
/// primary string argument is empty (`spec.md` §4.4 table).
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub name: &'static str,
    pub kind: SlotKind,
    pub index: u8,
    pub fallback: Option<u8>,
}

/// Exact descriptor set from `spec.md` §4.4, longest-name-first isn't
/// required here since matching is driven by suffix length comparison,
/// not table order.
pub const DESCRIPTORS: &[Descriptor] = &[
    Descriptor { name: "$ac", kind: SlotKind::Str, index: 0, fallback: None },
    Descriptor { name: "$sn", kind: SlotKind::Str, index: 1, fallback: Some(0) },
    Descriptor { name: "$sg", kind: SlotKind::Str, index: 2, fallback: None },
    Descriptor { name: "$RD1", kind: SlotKind::Str, index: 3, fallback: None },
    Descriptor { name: "$RD2", kind: SlotKind::Str, index: 4, fallback: None },
    Descriptor { name: "$QA", kind: SlotKind::Str, index: 5, fallback: None },
    Descriptor { name: "$si", kind: SlotKind::Int, index: 0, fallback: None },
    Descriptor { name: "$ri", kind: SlotKind::Int, index: 1, fallback: None },
    Descriptor { name: "$rl", kind: SlotKind::Int, index: 2, fallback: None },
];

/// Finds the descriptor matching the longest suffix of `scanned`, as
/// required by the compiler's "longest suffix match at each position"
/// rule. Returns the matched descriptor and its name length.
pub fn find_suffix_match(scanned: &str) -> Option<(&'static Descriptor, usize)> {
    DESCRIPTORS
        .iter()
        .filter(|d| scanned.len() >= d.name.len() && scanned.ends_with(d.name))
        .max_by_key(|d| d.name.len())
        .map(|d| (d, d.name.len()))
}
