//! INCAR text: rendering, re-parsing and the on-disk artifact.

pub mod format;
pub mod parser;
pub mod serialization;

pub use format::{format_line, render_document};
pub use parser::{IncarAssignment, parse_incar, tokenize_incar};
pub use serialization::write_incar_artifact;
