//! Reusable response buffers, partitioned by size class.

pub mod pool;

pub use pool::{BufferPool, BufferPools, PooledBuffer, SizeClass};
