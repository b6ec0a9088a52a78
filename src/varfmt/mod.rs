//! Variable-format defline printer (`spec.md` §4.4).

pub mod descriptor;
pub mod printer;
pub mod template;

pub use printer::{render, FilePrinter, RenderArgs, SharedPrinter};
pub use template::Template;
