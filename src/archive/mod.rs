//! Archive access
//!
//! Streaming tar reading (plain, gzip, bzip2 or xz) and archive fingerprinting.

pub mod digest;
pub mod reader;

pub use reader::{ArchiveReader, Compression};
