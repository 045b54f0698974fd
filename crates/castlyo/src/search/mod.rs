//! Talent and job discovery backed by a document index.

pub mod document;
pub mod index;
pub mod router;
pub mod service;

pub use document::{SearchDocument, SearchHit, SearchKind, SearchQuery, SearchResults};
pub use index::{MemorySearchIndex, SearchError, SearchIndex};
pub use router::search_router;
pub use service::{SearchParams, SearchService};
