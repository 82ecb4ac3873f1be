pub mod client;
pub mod error;
pub mod types;

pub use client::ProfileClient;
pub use error::ProfileError;
pub use types::Profile;
