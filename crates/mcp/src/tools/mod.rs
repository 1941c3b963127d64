pub mod blocks;
pub mod branches;
pub mod content;
pub mod docs;
pub mod tokens;
mod registry;

pub use blocks::{CreateBlocksTool, DeleteBlocksTool, UpdateBlocksTool};
pub use branches::{
    CheckoutBranchTool, CommitTool, CreateBranchTool, CurrentRefTool, ListBranchesTool,
    MergeBranchTool,
};
pub use content::{ContentStructureTool, DiffTool, GraphqlSchemaTool, QueryContentTool};
pub use docs::{
    BlockTypesTool, MutationGuidelinesTool, QueryGuidelinesTool, SearchDeveloperDocsTool,
};
pub use registry::{
    authenticate, json_schema_array, json_schema_boolean, json_schema_number, json_schema_object,
    json_schema_string, Tool, ToolRegistry,
};
pub use tokens::{GetTokenTool, UploadUrlTool};
