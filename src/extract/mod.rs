pub mod definition;
pub mod source;
pub mod taxonomy;

pub use definition::extract_from_definition;
pub use source::extract_from_source;
pub use taxonomy::CategoryTaxonomy;
