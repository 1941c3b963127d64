use serde::{Deserialize, Serialize};

/// Kind of version pointer a call operates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Branch,
    Commit,
}

/// A pointer to either a branch or a specific commit of the content tree.
///
/// Branch refs carry a `name`; commit refs usually do not. A ref is only
/// mutated server-side (checkout, branch creation); within a single tool
/// call it is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "type")]
    pub ref_type: RefType,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Ref {
    pub fn branch(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ref_type: RefType::Branch,
            id: id.into(),
            name: Some(name.into()),
        }
    }

    pub fn commit(id: impl Into<String>) -> Self {
        Self {
            ref_type: RefType::Commit,
            id: id.into(),
            name: None,
        }
    }

    pub fn is_branch(&self) -> bool {
        self.ref_type == RefType::Branch
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.id),
        }
    }
}
