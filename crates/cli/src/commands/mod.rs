// CLI commands

pub mod chat;
pub mod follow;
pub mod forget;
pub mod resume;
pub mod stop;
pub mod timeline;
