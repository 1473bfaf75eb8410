// Records: the Candidate, Client and Requirement resources.
// Schema tables drive validation here and in the editor; every store applies
// records::validation before writing and records::filter semantics when listing.

pub mod filter;
pub mod handlers;
#[cfg(test)]
pub mod memory_store;
pub mod model;
pub mod pg_store;
pub mod schema;
pub mod store;
pub mod validation;

pub use store::RecordStore;
