//! Scoped scratch buffers for the token writer.
//!
//! Small requests are served from the stack. Larger ones borrow a buffer kept
//! per thread, and fall back to a fresh allocation when that buffer is
//! already in use further up the call stack.

use std::cell::RefCell;

/// Requests up to this size never touch the heap.
pub const STACK_SCRATCH_LEN: usize = 1024;

/// Pooled buffers grown past this size are released instead of being kept.
const MAX_RETAINED_LEN: usize = 64 * 1024;

thread_local! {
    static POOLED_SCRATCH: RefCell<Vec<u8>> = RefCell::new(Vec::new());
}

/// Runs `f` with a writable buffer of exactly `len` bytes.
///
/// The buffer contents are unspecified on entry and the buffer is returned to
/// its source on every exit path, including errors returned by `f`.
pub(crate) fn with_scratch<R>(len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
    if len <= STACK_SCRATCH_LEN {
        let mut buf = [0u8; STACK_SCRATCH_LEN];
        return f(&mut buf[..len]);
    }
    POOLED_SCRATCH.with(|pooled| match pooled.try_borrow_mut() {
        Ok(mut buf) => {
            if buf.len() < len {
                buf.resize(len, 0);
            }
            let result = f(&mut buf[..len]);
            if buf.len() > MAX_RETAINED_LEN {
                *buf = Vec::new();
            }
            result
        }
        Err(_) => {
            let mut buf = vec![0u8; len];
            f(&mut buf)
        }
    })
}

#[cfg(test)]
fn pooled_len() -> usize {
    POOLED_SCRATCH.with(|pooled| pooled.borrow().len())
}
