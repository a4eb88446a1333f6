//! Built-in adapters.
//!
//! Adapters implement [`Adapter`](crate::Adapter) for different storage types.
//! Remote transports live in their own crates (see `kakehashi-sftp`).

mod local;
mod memory;

pub use local::LocalAdapter;
pub use memory::MemoryAdapter;
