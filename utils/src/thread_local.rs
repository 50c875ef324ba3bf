//! RAII guard for a value parked in a thread-local slot.
//!
//! # Overview
//!
//! Reusable buffers are cheap to keep around and expensive to allocate over and over. Parking
//! one instance per thread in a slot declared with [`thread_local_cache!`] lets stateless
//! functions borrow it without any synchronization.
//!
//! [`Cached`] borrows the value out of the slot and puts it back on [`Drop`], so a borrowed
//! value cannot be lost by forgetting to return it.
//!
//! # Reentrancy
//!
//! Within one thread, only one guard per slot can be held at a time. Taking a second guard
//! while the first is alive returns `None` instead of blocking or panicking, so callers can
//! fall back to a fresh value.
//!
//! # Examples
//!
//! ```
//! use bytecraft_utils::{thread_local_cache, Cached};
//!
//! thread_local_cache!(static SLOT: Vec<u8>);
//!
//! assert!(Cached::take(&SLOT).is_none());
//! assert!(Cached::store(&SLOT, Some(vec![0; 4])).is_ok());
//!
//! let guard = Cached::take(&SLOT).unwrap();
//! assert_eq!(guard.len(), 4);
//! assert!(Cached::take(&SLOT).is_none());
//! drop(guard);
//!
//! assert!(Cached::take(&SLOT).is_some());
//! ```

use std::{
    cell::RefCell,
    ops::{Deref, DerefMut},
    thread::LocalKey,
};

/// Thread-local slot declared with [`thread_local_cache!`].
///
/// `(held, value)` where:
/// - `(false, None)` means empty
/// - `(false, Some(_))` means available
/// - `(true, None)` means held
pub type Slot<T> = LocalKey<RefCell<(bool, Option<T>)>>;

/// RAII guard that borrows a value from a thread-local slot and returns it on drop.
pub struct Cached<T: 'static> {
    value: Option<T>,
    cache: &'static Slot<T>,
}

impl<T: 'static> Cached<T> {
    /// Borrows the value parked in `cache`.
    ///
    /// Returns `None` if the slot is empty or already held on this thread.
    pub fn take(cache: &'static Slot<T>) -> Option<Self> {
        let value = cache.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.0 {
                return None;
            }
            let value = slot.1.take()?;
            slot.0 = true;
            Some(value)
        })?;
        Some(Self {
            value: Some(value),
            cache,
        })
    }

    /// Replaces the value parked in `cache` and returns the previous one.
    ///
    /// Storing `None` empties the slot. Fails with `value` if the slot is currently held on
    /// this thread.
    pub fn store(cache: &'static Slot<T>, value: Option<T>) -> Result<Option<T>, Option<T>> {
        cache.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.0 {
                return Err(value);
            }
            Ok(std::mem::replace(&mut slot.1, value))
        })
    }
}

impl<T: 'static> Deref for Cached<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.value.as_ref() {
            Some(value) => value,
            None => unreachable!("value only taken on drop"),
        }
    }
}

impl<T: 'static> DerefMut for Cached<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value.as_mut() {
            Some(value) => value,
            None => unreachable!("value only taken on drop"),
        }
    }
}

impl<T: 'static> Drop for Cached<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            // The slot may already be gone if the thread is shutting down.
            let _ = self.cache.try_with(|cell| {
                let mut slot = cell.borrow_mut();
                debug_assert!(slot.0, "slot expected to be held");
                slot.0 = false;
                slot.1 = Some(value);
            });
        }
    }
}

/// Declare a thread-local slot for use with [`Cached`].
///
/// ```ignore
/// thread_local_cache!(static SLOT: MyType);
/// ```
#[macro_export]
macro_rules! thread_local_cache {
    ($vis:vis static $name:ident : $ty:ty) => {
        ::std::thread_local! {
            $vis static $name: ::std::cell::RefCell<(bool, ::core::option::Option<$ty>)> =
                const { ::std::cell::RefCell::new((false, ::core::option::Option::None)) };
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    thread_local_cache!(static EMPTY_SLOT: Vec<u8>);

    #[test]
    fn test_take_empty() {
        assert!(Cached::take(&EMPTY_SLOT).is_none());
    }

    thread_local_cache!(static REUSE_SLOT: Vec<u8>);

    #[test]
    fn test_take_reuses() {
        Cached::store(&REUSE_SLOT, Some(vec![1, 2, 3])).unwrap();
        let mut guard = Cached::take(&REUSE_SLOT).unwrap();
        guard.push(4);
        drop(guard);

        let guard = Cached::take(&REUSE_SLOT).unwrap();
        assert_eq!(&*guard, &[1, 2, 3, 4]);
    }

    thread_local_cache!(static NESTED_SLOT: Vec<u8>);

    #[test]
    fn test_nested_take_rejected() {
        Cached::store(&NESTED_SLOT, Some(vec![1])).unwrap();
        let outer = Cached::take(&NESTED_SLOT).unwrap();
        assert!(Cached::take(&NESTED_SLOT).is_none());

        // Storing while held is refused and hands the value back.
        assert_eq!(
            Cached::store(&NESTED_SLOT, Some(vec![2])),
            Err(Some(vec![2]))
        );
        drop(outer);
        assert_eq!(&*Cached::take(&NESTED_SLOT).unwrap(), &[1]);
    }

    thread_local_cache!(static STORE_SLOT: u32);

    #[test]
    fn test_store_replaces() {
        assert_eq!(Cached::store(&STORE_SLOT, Some(1)), Ok(None));
        assert_eq!(Cached::store(&STORE_SLOT, Some(2)), Ok(Some(1)));
        assert_eq!(Cached::store(&STORE_SLOT, None), Ok(Some(2)));
        assert!(Cached::take(&STORE_SLOT).is_none());
    }

    thread_local_cache!(static THREAD_SLOT: u32);

    #[test]
    fn test_slots_are_per_thread() {
        Cached::store(&THREAD_SLOT, Some(7)).unwrap();
        let _guard = Cached::take(&THREAD_SLOT).unwrap();
        std::thread::spawn(|| {
            assert!(Cached::take(&THREAD_SLOT).is_none());
            Cached::store(&THREAD_SLOT, Some(8)).unwrap();
            assert_eq!(*Cached::take(&THREAD_SLOT).unwrap(), 8);
        })
        .join()
        .unwrap();
    }

    thread_local_cache!(static UNWIND_SLOT: Vec<u8>);

    #[test]
    fn test_unwind_returns_value() {
        Cached::store(&UNWIND_SLOT, Some(vec![1])).unwrap();
        let result = std::panic::catch_unwind(|| {
            let mut guard = Cached::take(&UNWIND_SLOT).unwrap();
            guard.push(10);
            panic!("boom");
        });
        assert!(result.is_err());

        let cached = UNWIND_SLOT.with(|cell| cell.borrow().1.clone());
        assert_eq!(cached, Some(vec![1, 10]));
    }
}
