pub mod handler;
pub mod sessions;

pub use handler::{router, ChatState};
pub use sessions::SessionStore;
