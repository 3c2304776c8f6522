//! Per-thread decimal arithmetic context.
//!
//! Each thread gets its own context on first use; it is torn down with the
//! thread. The clamped default precision is computed once per process.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

const DEC_MAX_DIGITS: i64 = 999_999_999;
const EMAX: i64 = 999_999_999;
const EMIN: i64 = -999_999_999;
/// Decimal digits packed per coefficient unit in the reference arithmetic.
const DPUN: i64 = 3;

static LIVE_CONTEXTS: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct DecContext {
    /// Working precision for literal parses, in decimal digits.
    pub(crate) digits: u64,
}

impl DecContext {
    fn new() -> DecContext {
        DecContext {
            digits: default_digits(),
        }
    }
}

impl Drop for DecContext {
    fn drop(&mut self) {
        LIVE_CONTEXTS.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Precision clamped so an exponent difference can never overflow a 32-bit
/// int during unit arithmetic.
fn default_digits() -> u64 {
    static DIGITS: OnceLock<u64> = OnceLock::new();
    *DIGITS.get_or_init(|| DEC_MAX_DIGITS.min(i32::MAX as i64 - (DPUN - 1) - (EMAX - EMIN - 1)) as u64)
}

thread_local! {
    static DEC_CTX: RefCell<Option<DecContext>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's context, creating it on first use.
pub(crate) fn with<R>(f: impl FnOnce(&DecContext) -> R) -> R {
    DEC_CTX.with(|slot| {
        let mut slot = slot.borrow_mut();
        let ctx = slot.get_or_insert_with(|| {
            LIVE_CONTEXTS.fetch_add(1, Ordering::Relaxed);
            DecContext::new()
        });
        f(ctx)
    })
}

/// Contexts currently alive across all threads.
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) fn live_contexts() -> usize {
    LIVE_CONTEXTS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_clamp() {
        with(|ctx| assert_eq!(ctx.digits, 147_483_648));
    }

    #[test]
    fn test_context_created_once_per_thread() {
        let created = std::thread::spawn(|| {
            let before = live_contexts() as i64;
            with(|_| ());
            with(|_| ());
            live_contexts() as i64 - before
        })
        .join()
        .unwrap();
        // first use creates the context, the second reuses it
        assert!(created >= 1);
    }

    #[test]
    fn test_context_destroyed_at_thread_exit() {
        let before = live_contexts();
        for _ in 0..8 {
            std::thread::spawn(|| with(|_| ())).join().unwrap();
        }
        // each thread's context died with it; the count cannot have grown by
        // one per thread
        assert!(live_contexts() < before + 8);
    }
}
