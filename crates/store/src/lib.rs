pub mod client;
pub mod entry;
pub mod errors;

pub use client::StoreClient;
pub use entry::{Entry, NewEntry};
pub use errors::StoreError;
