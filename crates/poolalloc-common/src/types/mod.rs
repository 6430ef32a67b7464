//! Core data types for the allocator

pub mod allocation;
pub mod amount;
pub mod pool;
