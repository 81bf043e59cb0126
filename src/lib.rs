pub mod chat_store;
pub mod error;
pub mod host;
pub mod prompt_manager;
mod utils;

pub use error::Error;
pub use prompt_manager::controller::EditorController;
