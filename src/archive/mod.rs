//! Archive codec for backup artifacts
//!
//! Two symmetric operations over zip files: compress a directory tree at
//! maximum compression, and extract an archive back into a tree. An
//! [`ArchiveBuilder`] is also exposed for snapshots that are assembled entry
//! by entry (object-store backups never touch the local disk per object).

mod codec;

pub use codec::{compress_dir, entry_name, extract, ArchiveBuilder, COMPRESSION_LEVEL};
