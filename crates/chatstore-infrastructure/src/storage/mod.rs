//! Storage layer for atomic document files and filesystem moves.

mod document_file;
pub mod fs_ops;

pub use document_file::DocumentFile;
