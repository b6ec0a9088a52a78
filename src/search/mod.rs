//! 2na k-mer search: grammar compiler, automaton, and scan handle
//! (`spec.md` §4.7).

pub mod automaton;
pub mod grammar;
pub mod scan;

pub use automaton::Automaton;
pub use grammar::{base_code, compile, Node};
pub use scan::{required_buffer_len, Scan};
