//! Interned strings used for blackboard keys and parameter names.
//!
//! Two symbols compare equal iff they point to the same interned string, so
//! equality is a pointer comparison.

use ::once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::Deref;
use std::sync::Mutex;

static SYMBOL_HEAP: Lazy<Mutex<BTreeSet<&'static str>>> = Lazy::new(|| Mutex::new(BTreeSet::new()));

/// An interned string with O(1) equality.
#[derive(Clone, Copy, Eq, Hash)]
pub struct Symbol {
    s: &'static str,
}

impl Symbol {
    /// Retrieves the address of the backing string.
    pub fn addr(self) -> usize {
        self.s.as_ptr() as usize
    }

    /// Retrieves the string from the Symbol.
    pub fn as_str(self) -> &'static str {
        self.s
    }

    /// Number of distinct strings interned so far.
    pub fn count() -> usize {
        SYMBOL_HEAP.lock().map(|heap| heap.len()).unwrap_or(0)
    }
}

impl Debug for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        Debug::fmt(self.s, fmt)
    }
}

impl Deref for Symbol {
    type Target = str;
    fn deref(&self) -> &str {
        self.s
    }
}

impl Display for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str(self.s)
    }
}

impl<S: AsRef<str>> From<S> for Symbol {
    fn from(s: S) -> Symbol {
        let s = s.as_ref();
        // A poisoned heap still holds valid leaked strings, so keep using it.
        let mut heap = SYMBOL_HEAP
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(interned) = heap.get(s) {
            return Symbol { s: *interned };
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        heap.insert(leaked);
        Symbol { s: leaked }
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.s == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.s == *other
    }
}
