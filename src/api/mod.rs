mod client;
mod error;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use session::{Session, SharedSession};
