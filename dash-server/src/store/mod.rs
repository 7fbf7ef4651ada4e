//! Store implementations local to the server

pub mod memory;

pub use memory::MemoryStore;
