//! Process-wide string pooling with stable integer handles.
//!
//! Every identifier the semantic pass cares about is interned exactly
//! once; repeated interning of the same content yields the same
//! [`StringHandle`]. Handle 0 is a reserved sentinel and never allocated.
//! Handles are allocated monotonically until the counter saturates at
//! three quarters of the type's range, after which a gap search over the
//! live map takes over.
//!
//! The pool is mutex-guarded so that the parser and the code generator
//! can share it with the semantic pass; [`StringPool::lock`] exposes the
//! guard directly for callers that want to intern a batch of strings
//! without re-locking.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    error::Error,
    fmt::Display,
    sync::{Arc, Mutex, MutexGuard},
};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Stable identity of one pooled string. 1-based; 0 is the null sentinel.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StringHandle(u32);

impl StringHandle {
    pub const NULL: StringHandle = StringHandle(0);

    pub const fn from_raw(raw: u32) -> Self {
        StringHandle(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Display for StringHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("#{}", self.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlesExhausted;

impl Display for HandlesExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("string handle values exhausted")
    }
}

impl Error for HandlesExhausted {}

/// Largest handle value the monotonic counter may reach before the
/// allocator switches to gap scanning. Order of operations avoids
/// overflow.
const MAX_HANDLE: u32 = (u32::MAX / 4) * 3;

/// Allocates handle values, recycling gaps only once the monotonic
/// counter saturates.
#[derive(Clone, Debug)]
struct HandleAllocator {
    current_monotonic: u32,
}

impl HandleAllocator {
    fn new() -> Self {
        HandleAllocator {
            current_monotonic: 1,
        }
    }

    #[cfg(test)]
    fn saturated() -> Self {
        HandleAllocator {
            current_monotonic: MAX_HANDLE,
        }
    }

    fn allocate(
        &mut self,
        live: &BTreeMap<StringHandle, Arc<str>>,
    ) -> Result<StringHandle, HandlesExhausted> {
        if live.is_empty() {
            return Ok(StringHandle(1));
        }

        if self.current_monotonic < MAX_HANDLE {
            self.current_monotonic += 1;
            return Ok(StringHandle(self.current_monotonic));
        }

        search_unused(live, 1, self.current_monotonic).ok_or(HandlesExhausted)
    }
}

fn search_unused(
    live: &BTreeMap<StringHandle, Arc<str>>,
    min: u32,
    max: u32,
) -> Option<StringHandle> {
    if min >= max {
        return None;
    }

    let pivot = (max - min) / 2 + min;
    if !live.contains_key(&StringHandle(pivot)) {
        return Some(StringHandle(pivot));
    }

    search_unused(live, min, pivot - 1).or_else(|| search_unused(live, pivot + 1, max))
}

#[derive(Debug, Default)]
struct PoolInner {
    allocator: Option<HandleAllocator>,
    strings: BTreeMap<StringHandle, Arc<str>>,
    lookup: HashMap<Arc<str>, StringHandle>,
}

impl PoolInner {
    fn pool(&mut self, text: &str) -> StringHandle {
        if let Some(&handle) = self.lookup.get(text) {
            return handle;
        }
        self.pool_fast(text)
    }

    fn pool_fast(&mut self, text: &str) -> StringHandle {
        let allocator = self.allocator.get_or_insert_with(HandleAllocator::new);
        let handle = allocator
            .allocate(&self.strings)
            .unwrap_or_else(|exhausted| panic!("{exhausted}"));

        let shared: Arc<str> = Arc::from(text);
        self.strings.insert(handle, Arc::clone(&shared));
        self.lookup.insert(shared, handle);
        handle
    }

    fn pool_at(&mut self, handle: StringHandle, text: &str) {
        assert!(!handle.is_null(), "handle 0 is reserved");
        if let Some(existing) = self.strings.get(&handle) {
            assert_eq!(
                existing.as_ref(),
                text,
                "handle {handle} is already pooled with different contents"
            );
            return;
        }

        let shared: Arc<str> = Arc::from(text);
        self.strings.insert(handle, Arc::clone(&shared));
        self.lookup.insert(shared, handle);
    }

    fn get(&self, handle: StringHandle) -> Option<Arc<str>> {
        self.strings.get(&handle).cloned()
    }

    fn garbage_collect(&mut self, live: &HashSet<StringHandle>) {
        let dead: Vec<StringHandle> = self
            .strings
            .keys()
            .copied()
            .filter(|handle| !live.contains(handle))
            .collect();

        for handle in dead {
            if let Some(text) = self.strings.remove(&handle) {
                self.lookup.remove(text.as_ref());
            }
        }
    }
}

/// Mutex-guarded pool of interned strings.
#[derive(Debug, Default)]
pub struct StringPool {
    inner: Mutex<PoolInner>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing handle when the content is
    /// already pooled.
    pub fn pool(&self, text: &str) -> StringHandle {
        self.lock_inner().pool(text)
    }

    /// Intern `text` without checking for existing content. Only safe
    /// when the caller knows the content is fresh (e.g. generated names).
    pub fn pool_fast(&self, text: &str) -> StringHandle {
        self.lock_inner().pool_fast(text)
    }

    /// Install `text` under a caller-chosen handle, used when
    /// deserializing a pool. Panics if the handle is already bound to
    /// different contents.
    pub fn pool_at(&self, handle: StringHandle, text: &str) {
        self.lock_inner().pool_at(handle, text)
    }

    pub fn get(&self, handle: StringHandle) -> Option<Arc<str>> {
        self.lock_inner().get(handle)
    }

    /// Drop every pooled string whose handle is not in `live`.
    pub fn garbage_collect(&self, live: &HashSet<StringHandle>) {
        self.lock_inner().garbage_collect(live)
    }

    pub fn len(&self) -> usize {
        self.lock_inner().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().strings.is_empty()
    }

    /// Take the lock once and intern through the guard. This is the fast
    /// path for the pass, which interns identifiers in bursts.
    pub fn lock(&self) -> StringPoolGuard<'_> {
        StringPoolGuard {
            inner: self.lock_inner(),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, PoolInner> {
        // A poisoned pool is still structurally sound; keep going.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held lock over the pool; interning through the guard skips the
/// per-call lock round trip.
pub struct StringPoolGuard<'a> {
    inner: MutexGuard<'a, PoolInner>,
}

impl StringPoolGuard<'_> {
    pub fn pool(&mut self, text: &str) -> StringHandle {
        self.inner.pool(text)
    }

    pub fn pool_fast(&mut self, text: &str) -> StringHandle {
        self.inner.pool_fast(text)
    }

    pub fn get(&self, handle: StringHandle) -> Option<Arc<str>> {
        self.inner.get(handle)
    }
}

static PROCESS_POOL: Lazy<StringPool> = Lazy::new(StringPool::new);

/// The shared per-process pool, for hosts that do not care to manage
/// their own.
pub fn process_pool() -> &'static StringPool {
    &PROCESS_POOL
}
