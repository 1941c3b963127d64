// Core types for the Canopy content tree: refs, transactions, block kinds.

pub mod blocks;
pub mod refs;
pub mod transaction;

pub use blocks::{BlockType, BLOCK_TYPE_REFERENCE};
pub use refs::{Ref, RefType};
pub use transaction::{
    ContentRequest, CreateEntry, Idempotency, IdempotencyKey, Operation, OperationError,
    Transaction, TransactionRecord, TransactionStatus, UpdateEntry,
};
