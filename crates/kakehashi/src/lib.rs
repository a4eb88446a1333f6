//! # kakehashi
//!
//! One path-based async API over heterogeneous storage backends.
//!
//! Key components:
//!
//! - [`Adapter`] - Capability trait every storage backend implements
//! - [`FileSystem`] - Routes `prefix://path` virtual paths to adapters
//! - [`LocalAdapter`] - Local disk under a root directory
//! - [`MemoryAdapter`] - In-memory store (scratch space, testing)
//! - [`FsError`] - The six error kinds every backend failure becomes
//!
//! ## Design Decisions
//!
//! - **Prefix routing**: a virtual path names its adapter explicitly
//!   (`remote1://reports/q3.csv`). The only implicit route is an explicitly
//!   designated default adapter for bare paths.
//! - **Adapters own root resolution**: the façade strips the prefix and
//!   forwards the relative path; each adapter joins it onto its root.
//! - **Check before act**: deletes, reads and appends stat the target first
//!   and surface not-found before any transport mutation.
//!
//! ```no_run
//! use kakehashi::{FileSystem, LocalAdapter, MemoryAdapter};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut fs = FileSystem::new();
//! fs.register(LocalAdapter::new("local", "/data"))?;
//! fs.register(MemoryAdapter::new("scratch"))?;
//!
//! fs.write_text_file("scratch://notes.txt", "hello", false).await?;
//! fs.copy_file("scratch://notes.txt", "local://notes.txt", false).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod adapters;
mod error;
mod filesystem;
mod model;
pub mod path;

pub use adapter::{Adapter, AdapterCore};
pub use adapters::{LocalAdapter, MemoryAdapter};
pub use error::{BoxError, ErrorKind, FsError, FsResult};
pub use filesystem::{FileSystem, RegistryError};
pub use model::{Directory, EntryKind, File};
