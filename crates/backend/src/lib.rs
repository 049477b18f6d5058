mod api;
mod error;
mod memory;

pub use api::CommunityBackend;
pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
