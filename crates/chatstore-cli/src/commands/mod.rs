pub mod list;
pub mod migrate;
pub mod remove;
pub mod transfer;
