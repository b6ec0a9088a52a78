//! 2na scan handle: compiled query plus a reusable packed-2bit scratch
//! buffer, and the `search(handle, window, start, count)` entry point
//! (`spec.md` §4.7).

use crate::error::{Error, Result};
use crate::search::automaton::Automaton;

/// Rounds the byte length required to hold `start_base_index + base_count`
/// packed 2-bit bases up to a 16-byte boundary, matching the contract's
/// `((start + count + 3) / 4 + 15) / 16 * 16` formula (16-byte aligned
/// tail overrun permitted by contract).
pub fn required_buffer_len(start_base_index: usize, base_count: usize) -> usize {
    let packed = (start_base_index + base_count + 3) / 4;
    (packed + 15) / 16 * 16
}

/// Reads the 2-bit code at `base_index` from a buffer packed the same
/// way as [`crate::lookup::pack::pack_bases`] (no length prefix: the
/// window is raw packed bytes starting at base index 0).
fn code_at(buf: &[u8], base_index: usize) -> u8 {
    let byte = buf[base_index / 4];
    let shift = 6 - 2 * (base_index % 4);
    (byte >> shift) & 0b11
}

/// A compiled 2na query plus a scratch buffer reused across calls so
/// that repeated searches over similarly sized windows avoid
/// reallocating.
pub struct Scan {
    automaton: Automaton,
    scratch: Vec<u8>,
}

impl Scan {
    /// Compiles `query` and pre-sizes the scratch buffer for windows up
    /// to `max_base_count` bases long.
    pub fn compile(query: &str, max_base_count: usize) -> Result<Self> {
        let automaton = Automaton::compile(query)?;
        let scratch = Vec::with_capacity(max_base_count);
        Ok(Scan { automaton, scratch })
    }

    pub fn is_positional(&self) -> bool {
        self.automaton.is_positional()
    }

    /// Searches `window` (packed 2-bit bases, base index 0 at the
    /// window's first byte) starting at `start_base_index` for
    /// `base_count` bases.
    ///
    /// Returns `0` for *not found*; otherwise, in positional mode, the
    /// 1-based starting base position (relative to `start_base_index`);
    /// otherwise a non-zero boolean-match indicator.
    ///
    /// [`required_buffer_len`] is the size a caller should *allocate* (it
    /// rounds up to a 16-byte boundary, the overrun the contract permits
    /// callers to rely on); `search` itself only requires enough bytes to
    /// actually hold the bases it reads, `ceil((start + count) / 4)`. A
    /// shorter buffer than that is a caller error (`invalid-argument`).
    pub fn search(&mut self, window: &[u8], start_base_index: usize, base_count: usize) -> Result<u64> {
        let needed = (start_base_index + base_count + 3) / 4;
        if window.len() < needed {
            return Err(Error::invalid_argument(format!(
                "window too short: need at least {needed} bytes, got {}",
                window.len()
            )));
        }

        self.scratch.clear();
        self.scratch.reserve(base_count);
        for i in 0..base_count {
            self.scratch.push(code_at(window, start_base_index + i));
        }

        match self.automaton.eval(&self.scratch) {
            None => Ok(0),
            Some(offset) => {
                if self.automaton.is_positional() {
                    Ok((offset + 1) as u64)
                } else {
                    Ok(1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::pack::pack_bases;

    /// Scenario 6 (`spec.md` §8): compile `"ACGT"`, buffer holds
    /// `"ACGTACGT"` at base positions [0..8), search(start=0, count=8)
    /// returns 1 (non-positional, boolean-match indicator).
    #[test]
    fn minimal_search_finds_literal() {
        let packed = pack_bases(b"ACGTACGT").unwrap();
        let window = &packed[2..]; // drop the length prefix, raw packed bytes
        let mut scan = Scan::compile("ACGT", 8).unwrap();
        let result = scan.search(window, 0, 8).unwrap();
        assert_eq!(result, 1);
    }

    #[test]
    fn positional_search_returns_one_based_offset() {
        let packed = pack_bases(b"TTACGTTT").unwrap();
        let window = &packed[2..];
        let mut scan = Scan::compile("@ACGT", 8).unwrap();
        let result = scan.search(window, 0, 8).unwrap();
        assert_eq!(result, 3); // match starts at base index 2 (0-based) -> 1-based 3
    }

    #[test]
    fn not_found_returns_zero() {
        let packed = pack_bases(b"TTTTTTTT").unwrap();
        let window = &packed[2..];
        let mut scan = Scan::compile("ACGT", 8).unwrap();
        let result = scan.search(window, 0, 8).unwrap();
        assert_eq!(result, 0);
    }

    #[test]
    fn rejects_undersized_window() {
        let mut scan = Scan::compile("ACGT", 8).unwrap();
        let short = [0u8; 1];
        assert!(scan.search(&short, 0, 8).is_err());
    }

    #[test]
    fn required_buffer_len_rounds_to_16_bytes() {
        assert_eq!(required_buffer_len(0, 8), 16);
        assert_eq!(required_buffer_len(0, 1), 16);
        assert_eq!(required_buffer_len(60, 4), 16);
    }
}
