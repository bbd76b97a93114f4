//! Size-classed byte buffer pools.
//!
//! Response capture borrows a buffer instead of allocating per request. The
//! buffer returns to its pool when its guard drops, truncated to zero length
//! so no request data survives into the next borrow.

use std::sync::{Arc, Mutex};

use bytes::BytesMut;

/// Initial capacity classes for the four pool instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// 1 KiB
    Small,
    /// 2 KiB
    Medium,
    /// 4 KiB
    Large,
    /// 8 KiB
    ExtraLarge,
}

impl SizeClass {
    /// All classes, smallest first.
    pub const ALL: [SizeClass; 4] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::ExtraLarge,
    ];

    /// Initial buffer capacity for this class, in bytes.
    pub const fn capacity(self) -> usize {
        match self {
            SizeClass::Small => 1024,
            SizeClass::Medium => 2048,
            SizeClass::Large => 4096,
            SizeClass::ExtraLarge => 8192,
        }
    }
}

/// A pool of reusable byte buffers sharing one initial capacity.
///
/// `acquire` never blocks and never fails: when the free list is empty a
/// fresh buffer is allocated. No reuse order is guaranteed between a release
/// and a later acquire; buffers carry no cross-request state once truncated.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    initial_capacity: usize,
}

impl BufferPool {
    /// Create a pool whose fresh buffers start with `initial_capacity` bytes.
    pub fn new(initial_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            free: Mutex::new(Vec::new()),
            initial_capacity,
        })
    }

    /// Borrow a buffer with zero logical length and retained capacity.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.initial_capacity));
        debug_assert!(buf.is_empty());
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, mut buf: BytesMut) {
        // Invariant: nothing from the previous request may reach the next
        // borrower.
        buf.clear();
        self.free.lock().unwrap_or_else(|e| e.into_inner()).push(buf);
    }
}

/// The four size-class pool instances.
///
/// Constructed explicitly and handed to the engine; nothing here is
/// process-global, so tests get isolated pools.
#[derive(Debug)]
pub struct BufferPools {
    small: Arc<BufferPool>,
    medium: Arc<BufferPool>,
    large: Arc<BufferPool>,
    extra_large: Arc<BufferPool>,
}

impl BufferPools {
    pub fn new() -> Self {
        Self {
            small: BufferPool::new(SizeClass::Small.capacity()),
            medium: BufferPool::new(SizeClass::Medium.capacity()),
            large: BufferPool::new(SizeClass::Large.capacity()),
            extra_large: BufferPool::new(SizeClass::ExtraLarge.capacity()),
        }
    }

    /// The pool instance for the given size class.
    pub fn get(&self, class: SizeClass) -> &Arc<BufferPool> {
        match class {
            SizeClass::Small => &self.small,
            SizeClass::Medium => &self.medium,
            SizeClass::Large => &self.large,
            SizeClass::ExtraLarge => &self.extra_large,
        }
    }
}

impl Default for BufferPools {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer borrowed from a pool.
///
/// Returns to its pool when dropped; the release truncates it first, on
/// every exit path.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Append bytes to the captured data, growing the buffer if needed.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        if let Some(buf) = self.buf.as_mut() {
            buf.extend_from_slice(data);
        }
    }

    /// Bytes captured so far.
    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_ref().map_or(&[], |b| &b[..])
    }

    pub fn len(&self) -> usize {
        self.buf.as_ref().map_or(0, BytesMut::len)
    }

    /// Current capacity of the underlying allocation.
    pub fn capacity(&self) -> usize {
        self.buf.as_ref().map_or(0, BytesMut::capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // Release is a no-op once the buffer has been taken.
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}
