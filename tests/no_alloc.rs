//! Asserts the hot decode path performs no heap allocation, matching the
//! no-`Rc`/`Arc`/allocation resource model: the crate is `no_std` + `alloc`,
//! but `alloc` exists only for the formatter's owned-`String` convenience
//! API, never for `decode16`/`decode32`/`decode64` themselves.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};
use x86_decoder::{decode64, Instruction};

struct CountingAlloc;

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

#[test]
fn decode_does_not_allocate_per_instruction() {
    let bytes = [0x48, 0x89, 0xD8]; // MOV RAX, RBX
    let mut inst = Instruction::default();

    // Warm-up: let any one-time allocation in the test harness itself
    // happen before counting starts.
    assert!(decode64(&bytes, 0x1000, &mut inst));

    ALLOCATIONS.store(0, Ordering::Relaxed);

    for _ in 0..10_000 {
        let mut inst = Instruction::default();
        assert!(decode64(&bytes, 0x1000, &mut inst));
        assert_eq!(inst.length, 3);
    }

    assert_eq!(
        ALLOCATIONS.load(Ordering::Relaxed),
        0,
        "decoder allocated during hot-path decode"
    );
}
