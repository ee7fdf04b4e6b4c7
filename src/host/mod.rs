//! Host process table access
//!
//! Resolves PIDs reported by the GPU to OS process metadata.

pub mod resolver;

pub use resolver::{ProcessIdentity, ProcessResolver, SysinfoResolver};
