//! Tether Storage Library
//!
//! This crate provides the disk abstraction used to store attachment blobs,
//! with implementations for the local filesystem, S3 and an in-memory fake.
//! Disks are addressed by name through a [`DiskManager`].
//!
//! # Key format
//!
//! Keys are relative, `/` separated paths such as `posts/document/5.pdf`.
//! Keys must not contain `..` or a leading `/`. Key helpers live in the
//! `keys` module so all backends validate the same way.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod manager;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_disk, create_disks};
#[cfg(feature = "storage-local")]
pub use local::LocalDisk;
pub use manager::DiskManager;
pub use memory::MemoryDisk;
#[cfg(feature = "storage-s3")]
pub use s3::S3Disk;
pub use tether_core::DiskDriver;
pub use traits::{Disk, DiskError, DiskResult, PutOptions, Visibility};
