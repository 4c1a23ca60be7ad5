//! Vector memory for SportzVillage data.
//!
//! Brute-force cosine search over small collections, persisted as JSON.
//! Embeddings come from an [`Embedder`]: the OpenAI embeddings endpoint when
//! a key is configured, otherwise a deterministic local hashing embedder.

pub mod docs;
pub mod embeddings;
pub mod splitter;
pub mod store;
pub mod vector_index;

pub use docs::{DocType, SvDocumentManager};
pub use embeddings::{embedder_from_config, Embedder, HashingEmbedder, OpenAiEmbedder};
pub use splitter::TextSplitter;
pub use store::{Collection, ContextType, SearchHit, VectorStore, VectorStoreStats};
pub use vector_index::{cosine_similarity, IndexedDocument, Metadata, QueryHit, VectorIndex};
