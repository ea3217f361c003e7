use std::cell::Cell;
use std::fmt;

use bumpalo::Bump;

pub use bumpalo::collections::String as ArenaString;
pub use bumpalo::collections::Vec as ArenaVec;

use crate::value::Value;

/// Call-scoped owner of every node built while marshaling one result.
///
/// Backed by a bump allocator. Only `Copy` payloads can be stored, so no node
/// carries a destructor and dropping the arena reclaims all of them at once.
/// There is no other way to free a node.
///
/// Every reference handed out borrows the arena, so the borrow checker
/// rejects a release while the tree is still in use:
///
/// ```compile_fail
/// use pgtree_api::arena::Arena;
///
/// let arena = Arena::new();
/// let text = arena.alloc_str("hello");
/// arena.release();
/// assert_eq!(text, "hello");
/// ```
///
/// The arena is `!Sync`: one arena belongs to exactly one marshaling call.
pub struct Arena {
    bump: Bump,
    nodes: Cell<usize>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            bump: Bump::new(),
            nodes: Cell::new(0),
        }
    }

    /// Pre-size the first chunk, e.g. from the raw byte size of a result.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
            nodes: Cell::new(0),
        }
    }

    pub fn alloc<T: Copy>(&self, value: T) -> &mut T {
        self.count_node();
        self.bump.alloc(value)
    }

    pub fn alloc_str(&self, s: &str) -> &str {
        self.count_node();
        self.bump.alloc_str(s)
    }

    pub fn alloc_bytes(&self, bytes: &[u8]) -> &[u8] {
        self.count_node();
        self.bump.alloc_slice_copy(bytes)
    }

    /// Zero-filled byte buffer, to be written in place (hex decoding, binary cells).
    pub fn alloc_zeroed(&self, len: usize) -> &mut [u8] {
        self.count_node();
        self.bump.alloc_slice_fill_copy(len, 0u8)
    }

    pub fn alloc_slice_fill_iter<T, I>(&self, iter: I) -> &[T]
    where
        T: Copy,
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.count_node();
        self.bump.alloc_slice_fill_iter(iter)
    }

    /// Growable buffer living in the arena. Freeze with `into_bump_slice()`.
    pub fn vec<T: Copy>(&self) -> ArenaVec<'_, T> {
        self.count_node();
        ArenaVec::new_in(&self.bump)
    }

    /// Growable string living in the arena. Freeze with `into_bump_str()`.
    pub fn string(&self) -> ArenaString<'_> {
        self.count_node();
        ArenaString::new_in(&self.bump)
    }

    /// Build an `Array` value from an ordered sequence of elements.
    pub fn array<'a, I>(&'a self, values: I) -> Value<'a>
    where
        I: IntoIterator<Item = Value<'a>>,
    {
        let mut items = self.vec();
        items.extend(values);
        Value::Array(items.into_bump_slice())
    }

    /// Build an `Object` value; field order is the iteration order.
    pub fn object<'a, I>(&'a self, fields: I) -> Value<'a>
    where
        I: IntoIterator<Item = (&'a str, Value<'a>)>,
    {
        let mut entries = self.vec();
        entries.extend(fields);
        Value::Object(entries.into_bump_slice())
    }

    /// Number of allocation requests served so far.
    pub fn nodes(&self) -> usize {
        self.nodes.get()
    }

    /// Bytes reserved from the system allocator, including unused chunk tails.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Free every node in one step. Consumes the arena.
    pub fn release(self) {
        drop(self);
    }

    fn count_node(&self) {
        self.nodes.set(self.nodes.get() + 1);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("nodes", &self.nodes.get())
            .field("allocated_bytes", &self.bump.allocated_bytes())
            .finish()
    }
}
