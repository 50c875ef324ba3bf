//! FIFO queue of byte chunks.
//!
//! # Overview
//!
//! A [`ByteQueue`] retains enqueued chunks as they are (no copy on enqueue) and copies bytes
//! out from the front on dequeue. Chunks that are fully consumed are released and a partially
//! consumed front chunk is replaced by its remainder, so the queue never holds on to more
//! than it still has to hand out.
//!
//! # Example
//!
//! ```
//! use bytecraft_utils::ByteQueue;
//!
//! let mut queue = ByteQueue::new();
//! queue.enqueue(vec![1, 2, 3]);
//! queue.enqueue(vec![4, 5]);
//! assert_eq!(&queue.peek(4)[..], &[1, 2, 3, 4]);
//! assert_eq!(&queue.dequeue(4)[..], &[1, 2, 3, 4]);
//! assert_eq!(queue.len(), 1);
//! ```

use bytecraft_codec::{Allocator, Unique};
use bytes::{Buf, Bytes};
use std::collections::VecDeque;

/// Queue of bytes made of retained chunks.
#[derive(Clone, Debug, Default)]
pub struct ByteQueue {
    chunks: VecDeque<Bytes>,
    len: usize,
}

impl ByteQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of retained chunks.
    pub fn chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Removes all bytes.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Appends `chunk` and returns the new length of the queue.
    ///
    /// Empty chunks are not retained.
    pub fn enqueue(&mut self, chunk: impl Into<Bytes>) -> usize {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.len += chunk.len();
            self.chunks.push_back(chunk);
        }
        self.len
    }

    /// Removes and returns up to `max` bytes from the front.
    pub fn dequeue(&mut self, max: usize) -> Bytes {
        self.take(max, &Unique)
    }

    /// Removes and returns all bytes.
    pub fn dequeue_all(&mut self) -> Bytes {
        self.dequeue(self.len)
    }

    /// Returns up to `max` bytes from the front without removing them.
    pub fn peek(&self, max: usize) -> Bytes {
        let len = max.min(self.len);
        let mut out = Unique.allocate_unique(len);
        self.copy_front(&mut out);
        out.freeze()
    }

    /// Removes up to `max` bytes from the front into a buffer obtained from `alloc`.
    pub fn dequeue_with(&mut self, max: usize, alloc: &impl Allocator) -> Bytes {
        self.take(max, alloc)
    }

    /// Removes up to `max` bytes from the front into `dst` and returns the number of bytes
    /// copied.
    ///
    /// The count is bounded by the length of `dst`, the length of the queue and `max`.
    pub fn dequeue_into(&mut self, dst: &mut [u8], max: usize) -> usize {
        let len = max.min(dst.len()).min(self.len);
        self.copy_front(&mut dst[..len]);
        self.consume(len);
        len
    }

    /// Copies up to `max` bytes from the front into `dst` without removing them and returns
    /// the number of bytes copied.
    pub fn peek_into(&self, dst: &mut [u8], max: usize) -> usize {
        let len = max.min(dst.len()).min(self.len);
        self.copy_front(&mut dst[..len]);
        len
    }

    fn take(&mut self, max: usize, alloc: &impl Allocator) -> Bytes {
        let len = max.min(self.len);
        let mut out = alloc.allocate_unique(len);
        self.copy_front(&mut out);
        self.consume(len);
        out.freeze()
    }

    /// Fills `dst` from the front of the queue. `dst` must not be longer than the queue.
    fn copy_front(&self, dst: &mut [u8]) {
        let mut copied = 0;
        for chunk in &self.chunks {
            if copied == dst.len() {
                break;
            }
            let n = chunk.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            copied += n;
        }
        debug_assert_eq!(copied, dst.len());
    }

    /// Drops `len` bytes from the front. `len` must not exceed the queue length.
    fn consume(&mut self, mut len: usize) {
        self.len -= len;
        while len > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            if front.len() > len {
                front.advance(len);
                break;
            }
            len -= front.len();
            self.chunks.pop_front();
        }
    }
}

impl Buf for ByteQueue {
    fn remaining(&self) -> usize {
        self.len
    }

    fn chunk(&self) -> &[u8] {
        self.chunks.front().map(|c| &c[..]).unwrap_or_default()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(cnt <= self.len, "cannot advance past the end of the queue");
        self.consume(cnt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_enqueue() {
        let mut queue = ByteQueue::new();
        assert_eq!(queue.enqueue(vec![1, 2]), 2);
        assert_eq!(queue.enqueue(Vec::new()), 2);
        assert_eq!(queue.enqueue(Bytes::from_static(&[3])), 3);
        assert_eq!(queue.chunks(), 2);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_dequeue() {
        let mut queue = ByteQueue::new();
        queue.enqueue(vec![1, 2, 3]);
        queue.enqueue(vec![4, 5, 6]);
        queue.enqueue(vec![7]);

        // Partially consumes the first chunk.
        assert_eq!(&queue.dequeue(2)[..], &[1, 2]);
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.chunks(), 3);

        // Ends exactly on a chunk boundary.
        assert_eq!(&queue.dequeue(4)[..], &[3, 4, 5, 6]);
        assert_eq!(queue.chunks(), 1);

        // Asks for more than is queued.
        assert_eq!(&queue.dequeue(10)[..], &[7]);
        assert!(queue.is_empty());
        assert_eq!(queue.chunks(), 0);
        assert!(queue.dequeue(1).is_empty());
    }

    #[test]
    fn test_peek() {
        let mut queue = ByteQueue::new();
        queue.enqueue(vec![1, 2]);
        queue.enqueue(vec![3]);
        assert_eq!(&queue.peek(3)[..], &[1, 2, 3]);
        assert_eq!(&queue.peek(100)[..], &[1, 2, 3]);
        assert_eq!(queue.len(), 3);

        let mut dst = [0u8; 2];
        assert_eq!(queue.peek_into(&mut dst, 5), 2);
        assert_eq!(dst, [1, 2]);
        assert_eq!(queue.len(), 3);
        assert_eq!(&queue.dequeue_all()[..], &[1, 2, 3]);
    }

    #[test]
    fn test_dequeue_into() {
        let mut queue = ByteQueue::new();
        queue.enqueue(vec![1, 2, 3]);
        queue.enqueue(vec![4, 5]);

        let mut dst = [0u8; 4];
        assert_eq!(queue.dequeue_into(&mut dst, 2), 2);
        assert_eq!(dst, [1, 2, 0, 0]);
        assert_eq!(queue.dequeue_into(&mut dst, usize::MAX), 3);
        assert_eq!(dst, [3, 4, 5, 0]);
        assert_eq!(queue.dequeue_into(&mut dst, usize::MAX), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = ByteQueue::new();
        queue.enqueue(vec![1, 2, 3]);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.chunks(), 0);
        assert_eq!(queue.enqueue(vec![4]), 1);
    }

    #[test]
    fn test_buf() {
        let mut queue = ByteQueue::new();
        assert_eq!(queue.chunk(), &[] as &[u8]);
        queue.enqueue(vec![0x01]);
        queue.enqueue(vec![0x02, 0x03, 0x04]);
        assert_eq!(queue.get_u16(), 0x0102);
        assert_eq!(queue.chunk(), &[0x03, 0x04]);
        assert_eq!(queue.get_u8(), 0x03);
        assert_eq!(queue.remaining(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot advance past the end of the queue")]
    fn test_buf_advance_past_end() {
        let mut queue = ByteQueue::new();
        queue.enqueue(vec![1]);
        queue.advance(2);
    }

    #[test]
    fn test_conservation() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut queue = ByteQueue::new();
        let mut enqueued = Vec::new();
        let mut dequeued = Vec::new();
        for _ in 0..1000 {
            if rng.gen_bool(0.5) {
                let chunk: Vec<u8> = (0..rng.gen_range(0..16)).map(|_| rng.gen()).collect();
                enqueued.extend_from_slice(&chunk);
                queue.enqueue(chunk);
            } else if rng.gen_bool(0.5) {
                let max = rng.gen_range(0..24);
                dequeued.extend_from_slice(&queue.dequeue(max));
            } else {
                let mut dst = [0u8; 8];
                let max = rng.gen_range(0..12);
                let n = queue.dequeue_into(&mut dst, max);
                dequeued.extend_from_slice(&dst[..n]);
            }
            assert_eq!(enqueued.len() - dequeued.len(), queue.len());
        }
        dequeued.extend_from_slice(&queue.dequeue_all());
        assert_eq!(dequeued, enqueued);
    }
}
