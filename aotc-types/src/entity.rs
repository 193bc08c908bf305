//! Densely numbered entity references, used throughout the compiler as keys
//! for module-level tables (types, functions, tables, memories, globals).

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::slice;
use std::vec::Vec;

/// A type that can be used as a small, dense index into a table.
///
/// Implementors are newtype wrappers around `u32` that identify a kind of
/// entity (a function, a table, a type signature, ...). Two different
/// entity kinds are never comparable to each other even if their numeric
/// value coincides, which is what keeps `FuncIndex(3)` from being
/// accidentally used where a `TableIndex` was expected.
pub trait EntityRef: Copy + Eq {
    fn new(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Declares a newtype `u32` entity reference and its `EntityRef`/`Display`
/// impls. Mirrors the style of `cranelift_entity`'s generated reference
/// types: `FuncIndex`, `TypeIndex`, and friends.
#[macro_export]
macro_rules! entity_impl {
    ($name:ident) => {
        impl $crate::entity::EntityRef for $name {
            fn new(index: usize) -> Self {
                debug_assert!(index < (u32::MAX as usize));
                $name(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $name {
            /// Create a new instance from a `u32`.
            pub fn from_u32(x: u32) -> Self {
                $name(x)
            }

            /// Return the underlying `u32`.
            pub fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}{}", stringify!($name), self.0)
            }
        }
    };
}

/// A mapping `K -> V` that also owns the dense key space: pushing a value
/// allocates the next `K`. Used to build up module-level tables (the list
/// of function types, the list of defined functions, ...) while parsing.
#[derive(Debug, Clone)]
pub struct PrimaryMap<K, V>
where
    K: EntityRef,
{
    elems: Vec<V>,
    unused: PhantomData<K>,
}

impl<K, V> PrimaryMap<K, V>
where
    K: EntityRef,
{
    pub fn new() -> Self {
        Self {
            elems: Vec::new(),
            unused: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elems: Vec::with_capacity(capacity),
            unused: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.elems.get(k.index())
    }

    /// Append `v` and return the key that now refers to it.
    pub fn push(&mut self, v: V) -> K {
        let k = K::new(self.elems.len());
        self.elems.push(v);
        k
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.elems
            .iter()
            .enumerate()
            .map(|(i, v)| (K::new(i), v))
    }

    pub fn values(&self) -> slice::Iter<V> {
        self.elems.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> {
        (0..self.elems.len()).map(K::new)
    }

    pub fn next_key(&self) -> K {
        K::new(self.elems.len())
    }
}

impl<K, V> Default for PrimaryMap<K, V>
where
    K: EntityRef,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Index<K> for PrimaryMap<K, V>
where
    K: EntityRef,
{
    type Output = V;

    fn index(&self, k: K) -> &V {
        &self.elems[k.index()]
    }
}

impl<K, V> IndexMut<K> for PrimaryMap<K, V>
where
    K: EntityRef,
{
    fn index_mut(&mut self, k: K) -> &mut V {
        &mut self.elems[k.index()]
    }
}

/// A mapping `K -> V` for densely indexed entity references that does not
/// own the key space: out-of-range keys silently read back the configured
/// default. Used to attach secondary information (e.g. a basic block's
/// "sealed" flag) to entities allocated elsewhere.
#[derive(Debug, Clone)]
pub struct SecondaryMap<K, V>
where
    K: EntityRef,
    V: Clone,
{
    elems: Vec<V>,
    default: V,
    unused: PhantomData<K>,
}

impl<K, V> SecondaryMap<K, V>
where
    K: EntityRef,
    V: Clone,
{
    pub fn new() -> Self
    where
        V: Default,
    {
        Self {
            elems: Vec::new(),
            default: Default::default(),
            unused: PhantomData,
        }
    }

    pub fn with_default(default: V) -> Self {
        Self {
            elems: Vec::new(),
            default,
            unused: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.elems.get(k.index())
    }

    pub fn clear(&mut self) {
        self.elems.clear()
    }

    pub fn resize(&mut self, n: usize) {
        self.elems.resize(n, self.default.clone());
    }
}

impl<K, V> Default for SecondaryMap<K, V>
where
    K: EntityRef,
    V: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Index<K> for SecondaryMap<K, V>
where
    K: EntityRef,
    V: Clone,
{
    type Output = V;

    fn index(&self, k: K) -> &V {
        self.get(k).unwrap_or(&self.default)
    }
}

impl<K, V> IndexMut<K> for SecondaryMap<K, V>
where
    K: EntityRef,
    V: Clone,
{
    fn index_mut(&mut self, k: K) -> &mut V {
        let i = k.index();
        if i >= self.elems.len() {
            self.resize(i + 1);
        }
        &mut self.elems[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct E(u32);

    impl EntityRef for E {
        fn new(i: usize) -> Self {
            E(i as u32)
        }
        fn index(self) -> usize {
            self.0 as usize
        }
    }

    #[test]
    fn primary_map_allocates_dense_keys() {
        let mut m: PrimaryMap<E, &str> = PrimaryMap::new();
        let k0 = m.push("a");
        let k1 = m.push("b");
        assert_eq!(k0, E(0));
        assert_eq!(k1, E(1));
        assert_eq!(m[k0], "a");
        assert_eq!(m[k1], "b");
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn secondary_map_reads_default_for_unset_keys() {
        let mut m: SecondaryMap<E, i32> = SecondaryMap::new();
        m[E(2)] = 7;
        assert_eq!(m[E(0)], 0);
        assert_eq!(m[E(2)], 7);
    }
}
