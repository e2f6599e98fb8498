pub mod storage;
pub mod types;

pub use storage::{SessionSnapshot, SessionStore};
pub use types::{Message, Origin};
