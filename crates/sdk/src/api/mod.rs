//! Per-endpoint API facades for the Canopy backend.

mod auth;
mod branches;
mod content;
mod docs;
mod transactions;
mod uploads;

pub use auth::{AuthApi, AuthContext};
pub use branches::{BranchSummary, BranchesApi};
pub use content::{ContentApi, StructureRequest, TargetBlock};
pub use docs::DocsApi;
pub use transactions::TransactionsApi;
pub use uploads::{SignedUpload, UploadsApi};
