//! targuard: limit-enforcing tar archive lister and extractor
//!
//! # Architecture
//!
//! ## Archive Access ([`archive`])
//! - [`archive::reader`]: streaming tar reader with transparent gzip, bzip2 and xz support
//! - [`archive::digest`]: SHA-256 archive fingerprint
//!
//! ## Processing ([`processor`])
//! - [`processor::limits`]: member-count and payload-size accounting
//! - [`processor::list`]: listing without touching the filesystem
//! - [`processor::extract`]: extraction confined to one output directory
//! - [`processor::report`]: structured reports and listing lines
//!
//! ## Path Safety ([`security`])
//! - Member-name sanitisation and symlink-ancestor checks
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: structured security audit events
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: limits, member kinds and the error enum
//! - [`config::loader`]: JSON config file and flag precedence
//! - [`config::validator`]: startup validation
//!
//! # Guarantees
//!
//! 1. **Limits before effects** - a member is counted before it is shown or written
//! 2. **Confined writes** - nothing lands outside the output directory
//! 3. **No link materialisation** - link and special members are never created
//! 4. **Streaming** - payloads are copied, never buffered whole

// Archive Access
pub mod archive;

// Processing
pub mod processor;

// Path Safety
pub mod security;

// Observability
pub mod observability;

// Configuration
pub mod config;

// CLI entrypoint wiring for the targuard binary
pub mod cli;

pub use config::types::*;
pub use processor::TarProcessor;
