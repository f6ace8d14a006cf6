//! Global string interning for element and attribute names.
//!
//! The path model compares element and attribute names constantly (map
//! lookups, chain equality, classification). Interning turns every one of
//! those comparisons into an integer compare. The pool is process-global and
//! append-only; interned strings are leaked and live for the program.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Interned handle to a name string. Equality and hashing use the id only.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

#[derive(Default)]
struct Pool {
    lookup: HashMap<&'static str, u32>,
    entries: Vec<&'static str>,
}

static POOL: OnceLock<Mutex<Pool>> = OnceLock::new();

fn pool() -> &'static Mutex<Pool> {
    POOL.get_or_init(|| Mutex::new(Pool::default()))
}

impl Symbol {
    /// Intern `name`, returning the existing handle if it was seen before.
    pub fn new(name: &str) -> Symbol {
        let mut pool = pool().lock().unwrap();
        if let Some(&id) = pool.lookup.get(name) {
            return Symbol(id);
        }
        let leaked: &'static str = Box::leak(name.into());
        let id = pool.entries.len() as u32;
        pool.entries.push(leaked);
        pool.lookup.insert(leaked, id);
        Symbol(id)
    }

    /// Resolve the handle back to its string.
    pub fn as_str(self) -> &'static str {
        pool().lock().unwrap().entries[self.0 as usize]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_duplicate() {
        let a = Symbol::new("ldml");
        let b = Symbol::new("ldml");
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_different() {
        let a = Symbol::new("alpha");
        let b = Symbol::new("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve() {
        let s = Symbol::new("localeDisplayNames");
        assert_eq!(s.as_str(), "localeDisplayNames");
    }

    #[test]
    fn test_empty_string() {
        let s = Symbol::new("");
        assert_eq!(s.as_str(), "");
        assert_eq!(s, Symbol::new(""));
    }
}
