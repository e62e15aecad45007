//! `DocumentStore` implementations.
//!
//! Both adapters share the same in-memory engine; the file store adds a JSON
//! snapshot that is rewritten after every successful mutation.

mod json_file;
mod memory;
mod state;

pub use json_file::JsonFileStore;
pub use memory::InMemoryDocumentStore;
