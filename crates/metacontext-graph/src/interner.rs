//! Compact symbols for identifiers and type names used as index keys.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Interned string handle (4 bytes instead of 24+ for `String`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Sym(u32);

impl Sym {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Concurrent string interner; interning only needs `&self`.
#[derive(Debug)]
pub struct SymbolTable {
    str_to_sym: DashMap<String, Sym>,
    sym_to_str: DashMap<Sym, String>,
    next: AtomicU32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            str_to_sym: DashMap::new(),
            sym_to_str: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    pub fn intern(&self, s: &str) -> Sym {
        if let Some(sym) = self.str_to_sym.get(s) {
            return *sym;
        }
        // The entry lock keeps two racing writers from minting two symbols.
        match self.str_to_sym.entry(s.to_string()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let sym = Sym(self.next.fetch_add(1, Ordering::SeqCst));
                self.sym_to_str.insert(sym, s.to_string());
                e.insert(sym);
                sym
            }
        }
    }

    /// Existing symbol for `s`, without inserting.
    pub fn get(&self, s: &str) -> Option<Sym> {
        self.str_to_sym.get(s).map(|sym| *sym)
    }

    pub fn resolve(&self, sym: Sym) -> Option<String> {
        self.sym_to_str.get(&sym).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.next.load(Ordering::SeqCst) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn interning_is_stable() {
        let table = SymbolTable::new();
        let a = table.intern("RelationalColumn");
        let b = table.intern("RelationalTable");
        assert_ne!(a, b);
        assert_eq!(table.intern("RelationalColumn"), a);
        assert_eq!(table.get("RelationalTable"), Some(b));
        assert_eq!(table.get("Missing"), None);
        assert_eq!(table.resolve(a).as_deref(), Some("RelationalColumn"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn concurrent_interning_yields_one_symbol_per_string() {
        let table = Arc::new(SymbolTable::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    (0..64)
                        .map(|i| table.intern(&format!("id-{i}")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<Sym>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results[1..] {
            assert_eq!(r, &results[0]);
        }
        assert_eq!(table.len(), 64);
    }
}
