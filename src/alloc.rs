//! Allocation accounting.
//!
//! The crate installs [`CountingAlloc`] as the global allocator. It forwards
//! to the system allocator and counts bytes and calls per thread, so a
//! measurement taken on one thread is not disturbed by work running on others.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static BYTES: Cell<u64> = const { Cell::new(0) };
    static COUNT: Cell<u64> = const { Cell::new(0) };
}

/// Global allocator that counts allocations made by the current thread.
pub struct CountingAlloc;

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn record(size: usize) {
    // try_with fails only while the thread is being torn down.
    let _ = BYTES.try_with(|b| b.set(b.get().wrapping_add(size as u64)));
    let _ = COUNT.try_with(|c| c.set(c.get().wrapping_add(1)));
}

// SAFETY: every call is forwarded unchanged to `System`; the counters are
// const-initialized thread locals without destructors, so touching them never
// allocates.
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc_zeroed(layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size);
        System.realloc(ptr, layout, new_size)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

/// Cumulative allocation totals for the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Bytes requested, counting every realloc at its new size
    pub bytes: u64,
    /// Number of allocation calls
    pub count: u64,
}

impl Snapshot {
    /// Read the current thread's totals.
    pub fn now() -> Self {
        Self {
            bytes: BYTES.try_with(Cell::get).unwrap_or(0),
            count: COUNT.try_with(Cell::get).unwrap_or(0),
        }
    }

    /// Totals accumulated since `self` was taken.
    pub fn elapsed(&self) -> Self {
        let now = Self::now();
        Self {
            bytes: now.bytes.saturating_sub(self.bytes),
            count: now.count.saturating_sub(self.count),
        }
    }
}

/// Run `f` and return its result with the allocations it made.
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, Snapshot) {
    let before = Snapshot::now();
    let result = f();
    (result, before.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hint::black_box;

    #[test]
    fn test_counts_heap_allocation() {
        let (v, delta) = measure(|| black_box(vec![0u8; 4096]));
        assert_eq!(v.len(), 4096);
        assert!(delta.bytes >= 4096);
        assert!(delta.count >= 1);
    }

    #[test]
    fn test_no_allocation_counts_nothing() {
        let (sum, delta) = measure(|| black_box((0u64..100).sum::<u64>()));
        assert_eq!(sum, 4950);
        assert_eq!(delta, Snapshot::default());
    }

    #[test]
    fn test_other_threads_not_attributed() {
        let before = Snapshot::now();
        std::thread::spawn(|| black_box(vec![1u8; 1 << 20]))
            .join()
            .unwrap();
        // Spawning itself allocates on this thread, but not the 1 MiB buffer.
        assert!(before.elapsed().bytes < 1 << 20);
    }
}
