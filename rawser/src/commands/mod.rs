pub mod read;
pub mod write;

pub use read::run as read;
pub use write::run as write;
