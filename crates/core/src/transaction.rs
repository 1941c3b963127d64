//! Typed mutation transactions against the content tree.
//!
//! A [`Transaction`] is an ordered batch of [`Operation`]s submitted to the
//! backend in a single mutation. Order is significant: the backend applies
//! entries in sequence, which lets a later entry reference an earlier one by
//! its `transactionId` placeholder instead of a real block id.

use serde::{Deserialize, Serialize};

use crate::blocks::BlockType;

/// Local validation failure, raised before any network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("transaction has no operations")]
    Empty,

    #[error("operation {0} is missing a block id")]
    MissingId(usize),

    #[error("operation {0} has no value")]
    MissingValue(usize),

    #[error("block type '{1}' is not supported by the mutation api (operation {0})")]
    ImmutableBlockType(usize, BlockType),

    #[error("operation {0} is missing a branch name")]
    MissingBranchName(usize),

    #[error("operation {0} has an empty commit message")]
    EmptyCommitMessage(usize),
}

/// Key a create entry can be deduplicated on server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdempotencyKey {
    Id,
    Title,
    Slug,
    ApiName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idempotency {
    pub key: IdempotencyKey,
    pub value: String,
}

/// Payload for a single block creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntry {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Block value; its shape depends on `block_type`. Children of layout
    /// blocks nest inside this value, never as separate entries.
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder id so later entries in the same transaction can reference
    /// this block before it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency: Option<Idempotency>,
}

impl CreateEntry {
    pub fn new(block_type: BlockType, value: serde_json::Value) -> Self {
        Self {
            block_type,
            value,
            title: None,
            api_name: None,
            slug: None,
            description: None,
            transaction_id: None,
            hidden: None,
            idempotency: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Payload for a single block update. Only `id` is required; absent fields
/// are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_index: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl UpdateEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Request to open a content request alongside a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single entry in a transaction, tagged with its operation kind on the
/// wire (`"type": "create"`, `"create-branch"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Create {
        /// Parent block id; root level when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        data: CreateEntry,
    },
    Update(UpdateEntry),
    Delete {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    CreateBranch {
        base_branch_name: String,
        branch_name: String,
        #[serde(default)]
        description: String,
    },
    #[serde(rename_all = "camelCase")]
    MergeBranch {
        base_branch_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_branch_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        auto_create_content_request: Option<ContentRequest>,
    },
    #[serde(rename_all = "camelCase")]
    Commit {
        branch_name: String,
        message: String,
    },
}

impl Operation {
    fn validate(&self, index: usize) -> Result<(), OperationError> {
        match self {
            Operation::Create { data, .. } => {
                if !data.block_type.supports_mutation() {
                    return Err(OperationError::ImmutableBlockType(index, data.block_type));
                }
                if data.value.is_null() {
                    return Err(OperationError::MissingValue(index));
                }
                Ok(())
            }
            Operation::Update(entry) => {
                if entry.id.is_empty() {
                    return Err(OperationError::MissingId(index));
                }
                Ok(())
            }
            Operation::Delete { id } => {
                if id.is_empty() {
                    return Err(OperationError::MissingId(index));
                }
                Ok(())
            }
            Operation::CreateBranch {
                base_branch_name,
                branch_name,
                ..
            } => {
                if base_branch_name.is_empty() || branch_name.is_empty() {
                    return Err(OperationError::MissingBranchName(index));
                }
                Ok(())
            }
            Operation::MergeBranch {
                base_branch_name, ..
            } => {
                if base_branch_name.is_empty() {
                    return Err(OperationError::MissingBranchName(index));
                }
                Ok(())
            }
            Operation::Commit {
                branch_name,
                message,
            } => {
                if branch_name.is_empty() {
                    return Err(OperationError::MissingBranchName(index));
                }
                if message.is_empty() {
                    return Err(OperationError::EmptyCommitMessage(index));
                }
                Ok(())
            }
        }
    }
}

/// An ordered, validated batch of operations plus its envelope arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    operations: Vec<Operation>,
    author_id: Option<String>,
    auto_commit: Option<String>,
}

impl Transaction {
    /// Validate and assemble a transaction. Order of `operations` is kept
    /// exactly as given.
    pub fn new(operations: Vec<Operation>) -> Result<Self, OperationError> {
        if operations.is_empty() {
            return Err(OperationError::Empty);
        }
        for (index, op) in operations.iter().enumerate() {
            op.validate(index)?;
        }
        Ok(Self {
            operations,
            author_id: None,
            auto_commit: None,
        })
    }

    pub fn single(operation: Operation) -> Result<Self, OperationError> {
        Self::new(vec![operation])
    }

    /// Attribute the transaction to a user. Deployments without author
    /// attribution simply never call this.
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Ask the backend to commit immediately after applying, instead of
    /// leaving the changes as pending drafts.
    pub fn with_auto_commit(mut self, message: impl Into<String>) -> Self {
        self.auto_commit = Some(message.into());
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    pub fn auto_commit(&self) -> Option<&str> {
        self.auto_commit.as_deref()
    }
}

/// Terminal/non-terminal state of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Running,
    Scheduled,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, TransactionStatus::Failed)
    }

    /// Running/Scheduled transactions may still resolve; nothing in this
    /// layer polls them. The status is exposed and the caller decides.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            TransactionStatus::Running | TransactionStatus::Scheduled
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Running => "Running",
            TransactionStatus::Scheduled => "Scheduled",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Failed => "Failed",
            TransactionStatus::Cancelled => "Cancelled",
        };
        write!(f, "{}", s)
    }
}

/// What the backend reports back for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub status: TransactionStatus,
    #[serde(default)]
    pub message: Option<String>,
    /// Server-side apply duration in milliseconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl TransactionRecord {
    /// Server-provided failure message, with the documented fallback.
    pub fn failure_message(&self) -> Option<String> {
        if self.status.is_failure() {
            Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )
        } else {
            None
        }
    }
}
