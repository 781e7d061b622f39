//! Document building: catalog entity to index document.

mod document_builder;
mod value;

pub use document_builder::DocumentBuilder;
