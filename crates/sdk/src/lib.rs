//! # Canopy SDK
//!
//! Rust client for the Canopy content backend: authentication, typed
//! mutation transactions and GraphQL queries against a branch-versioned
//! content tree.
//!
//! Every call is stateless. A caller authenticates its opaque MCP token on
//! each invocation and receives scoped read/write tokens plus the active
//! ref; nothing is cached between calls because the active ref can change
//! underneath us (via checkout).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canopy_core::{CreateEntry, BlockType, Operation, Transaction};
//! use canopy_sdk::{CanopyClient, CanopyResult};
//!
//! #[tokio::main]
//! async fn main() -> CanopyResult<()> {
//!     let client = CanopyClient::builder().build()?;
//!
//!     let auth = client.auth().authenticate("mcp_token_from_caller").await?;
//!
//!     let tx = Transaction::single(Operation::Create {
//!         parent_id: None,
//!         data: CreateEntry::new(BlockType::Text, serde_json::json!("Hello")),
//!     })?
//!     .with_author(auth.user_id.clone());
//!
//!     let record = client.transactions().submit(&tx, &auth).await?;
//!     println!("transaction {}", record.status);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod transport;

// Re-export main client
pub use client::{CanopyClient, CanopyClientBuilder};
pub use config::ClientConfig;
pub use error::{CanopyError, CanopyResult};

// Re-export core types for convenience
pub use canopy_core::{
    BlockType, ContentRequest, CreateEntry, Operation, OperationError, Ref, RefType, Transaction,
    TransactionRecord, TransactionStatus, UpdateEntry,
};
