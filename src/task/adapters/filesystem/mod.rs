//! Filesystem adapters for the task archive.

mod archive;

pub use archive::FilesystemArchiveStore;
