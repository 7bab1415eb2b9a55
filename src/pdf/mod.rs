pub mod document;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod outline_writer;
pub mod strings;
pub mod toc;

pub use document::{save_outline, save_outline_as, PdfDocument};
pub use outline_writer::WriteSummary;
