pub mod memory;
pub mod storage;

pub use memory::MemoryStore;
pub use storage::{get_workspace_path, load_workspace, save_workspace, WorkspaceData};
