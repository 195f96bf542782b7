use bytes::BytesMut;
use crossbeam_queue::ArrayQueue;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Recycles fixed-size receive buffers between datagrams.
#[derive(Clone)]
pub struct BufferPool {
    queue: Arc<ArrayQueue<BytesMut>>,
    buf_len: usize,
}

impl BufferPool {
    pub fn new(capacity: usize, buf_len: usize) -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(capacity.max(1))),
            buf_len,
        }
    }
    /// A zero-filled buffer of exactly `buf_len` bytes.
    pub fn alloc(&self) -> Block {
        let mut data = self
            .queue
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buf_len));
        data.clear();
        data.resize(self.buf_len, 0);
        Block {
            queue: self.queue.clone(),
            data: ManuallyDrop::new(data),
        }
    }
    pub fn idle(&self) -> usize {
        self.queue.len()
    }
}

/// Pooled buffer, handed back to its pool on drop.
pub struct Block {
    queue: Arc<ArrayQueue<BytesMut>>,
    data: ManuallyDrop<BytesMut>,
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `data` is never touched again after drop.
        let data = unsafe { ManuallyDrop::take(&mut self.data) };
        let _ = self.queue.push(data);
    }
}

impl Deref for Block {
    type Target = BytesMut;
    #[inline]
    fn deref(&self) -> &Self::Target {
        self.data.deref()
    }
}

impl DerefMut for Block {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data.deref_mut()
    }
}
