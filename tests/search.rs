//! Scenario 6 from `spec.md` §8: compile a small IUPAC pattern and scan a
//! packed-2bit window produced by the lookup store's own packer.

use fasterq_core::lookup::pack_bases;
use fasterq_core::search::Scan;

#[test]
fn minimal_search_over_a_packed_window() {
    let packed = pack_bases(b"ACGTACGT").unwrap();
    let window = &packed[2..]; // drop the length prefix; search() takes a raw packed window

    let mut scan = Scan::compile("ACGT", 8).unwrap();
    assert_eq!(scan.search(window, 0, 8).unwrap(), 1);
}

#[test]
fn compound_query_over_a_longer_window() {
    let packed = pack_bases(b"TTTTACGTTTTTTTTTGGGG").unwrap();
    let window = &packed[2..];

    let mut scan = Scan::compile("@(ACGT | GGGG)", 20).unwrap();
    assert!(scan.is_positional());
    let hit = scan.search(window, 0, 20).unwrap();
    // "ACGT" starts at base index 4 (0-based) -> 1-based position 5.
    assert_eq!(hit, 5);
}

#[test]
fn anchored_pattern_that_does_not_match_returns_zero() {
    let packed = pack_bases(b"TTTTACGT").unwrap();
    let window = &packed[2..];

    let mut scan = Scan::compile("^ACGT", 8).unwrap();
    assert_eq!(scan.search(window, 0, 8).unwrap(), 0);
}

#[test]
fn invalid_query_fails_to_compile() {
    assert!(Scan::compile("(ACGT", 8).is_err());
    assert!(Scan::compile("", 8).is_err());
}
