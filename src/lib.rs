//! # geoff-rs: Geoff graph notation reader and loader
//!
//! Parses the Geoff text notation into in-memory subgraphs and merges them
//! into a property-graph store.
//!
//! ## Design Principles
//!
//! 1. **Parser owns nothing**: text → [`Subgraph`] is a pure function
//! 2. **Trait-first**: [`StorageBackend`] is the contract between loader and store
//! 3. **Hooks merge, names create**: hooked nodes match existing data by label
//!    and keys, everything else becomes a new node
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geoff::Loader;
//!
//! # async fn example() -> geoff::Result<()> {
//! let loader = Loader::open_memory();
//!
//! let results = loader.load_str(r#"
//!     (ingrid:Person {name:"Ingrid"})-[:KNOWS]->(bob:Person {name:"Bob"})
//!     :Person:name:=>(ingrid)
//! "#).await?;
//!
//! let ingrid = results[0].get("ingrid").expect("named node");
//! # Ok(())
//! # }
//! ```
//!
//! ## Notation
//!
//! | Statement | Example |
//! |-----------|---------|
//! | Node | `(a:Person {name:"Alice"})` |
//! | Path | `(a)-[:KNOWS {since:1999}]->(b)<-[:LIKES]-(c)` |
//! | Hook | `:Person:name:=>?(a)` |
//! | Comment | `/* text */` |
//! | Boundary | `~~~~` |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod geoff;
pub mod storage;
pub mod tx;
pub mod loader;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    AbstractNode, AbstractRelationship, Hook, Subgraph,
    Node, Relationship, Value, PropertyMap,
    NodeId, RelId,
};

// ============================================================================
// Re-exports: Notation, Storage, Loading
// ============================================================================

pub use geoff::{parse, parse_all, parse_reader, Reader};
pub use storage::{StorageBackend, MemoryBackend};
pub use tx::{Transaction, TxMode, TxId};
pub use loader::{LoadConfig, EndpointPolicy, LoadResult, LoadStats};

// ============================================================================
// Top-level Loader handle
// ============================================================================

/// The primary entry point. A `Loader` wraps a storage backend and merges
/// Geoff documents into it.
pub struct Loader<B: StorageBackend> {
    backend: B,
    config: LoadConfig,
}

impl<B: StorageBackend> Loader<B> {
    /// Create a Loader with the given backend and default settings.
    pub fn with_backend(backend: B) -> Self {
        Self::with_config(backend, LoadConfig::default())
    }

    pub fn with_config(backend: B, config: LoadConfig) -> Self {
        Self { backend, config }
    }

    /// Load one subgraph in its own read-write transaction. The transaction
    /// is rolled back if any step fails.
    pub async fn load(&self, subgraph: &Subgraph) -> Result<LoadResult> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        match loader::load(&self.backend, &mut tx, subgraph, &self.config).await {
            Ok(result) => {
                self.backend.commit_tx(tx).await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback) = self.backend.rollback_tx(tx).await {
                    tracing::warn!(error = %rollback, "rollback after failed load");
                }
                Err(e)
            }
        }
    }

    /// Load inside a transaction owned by the caller.
    pub async fn load_in(&self, tx: &mut B::Tx, subgraph: &Subgraph) -> Result<LoadResult> {
        loader::load(&self.backend, tx, subgraph, &self.config).await
    }

    /// Parse every document in `text` and load each in order, one
    /// transaction per document. Stops at the first failure.
    pub async fn load_str(&self, text: &str) -> Result<Vec<LoadResult>> {
        let documents = geoff::parse_all(text)?;
        let mut results = Vec::with_capacity(documents.len());
        for subgraph in &documents {
            results.push(self.load(subgraph).await?);
        }
        Ok(results)
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }
}

/// In-memory store for testing and embedding.
impl Loader<MemoryBackend> {
    pub fn open_memory() -> Self {
        Self::with_backend(MemoryBackend::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEndOfInput { position: usize },

    #[error("Unexpected character {found:?} at position {position}, expected {expected}")]
    UnexpectedCharacter { position: usize, found: char, expected: String },

    #[error("Invalid string literal at position {position}: {message}")]
    InvalidStringLiteral { position: usize, message: String },

    #[error("Invalid number literal {text:?} at position {position}")]
    InvalidNumberLiteral { position: usize, text: String },

    #[error("Invalid boolean literal at position {position}")]
    InvalidBooleanLiteral { position: usize },

    #[error("Mixed array at position {position}: expected {expected} element, found {found:?}")]
    MixedArrayType { position: usize, expected: &'static str, found: char },

    #[error("Undirected relationship at position {position}")]
    UndirectedRelationship { position: usize },

    /// A hook declaration naming no key, e.g. `:Person:=>(a)`. Such a hook
    /// could match every node carrying the label, so it is rejected even
    /// though the statement is otherwise well formed.
    #[error("Hook without keys at position {position}")]
    MissingHookKey { position: usize },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Relationship {relationship} has unresolved endpoint {node}")]
    UnresolvedEndpoint { relationship: String, node: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
