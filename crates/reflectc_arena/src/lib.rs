//! Bump-allocated memory arena with a scoped sub-arena for transient scratch.
//!
//! The arena is split into two long-lived bump regions (`file`, `permanent`)
//! plus however many short-lived [`Scratch`] regions the caller opens and
//! drops as it goes. All three kinds are backed by [`bumpalo::Bump`]; the
//! scoped-scratch contract ("guaranteed release on all exit paths") falls
//! straight out of `Drop` instead of a manual high-water-mark reset.

use std::cell::Cell;

use bumpalo::Bump;

/// Default byte budget for the file-text region, used when a caller doesn't
/// override it (see `reflectc`'s `--file-capacity` flag).
pub const DEFAULT_FILE_CAPACITY: usize = 16 * 1024 * 1024;

/// Default byte budget for the permanent region.
pub const DEFAULT_PERMANENT_CAPACITY: usize = 16 * 1024 * 1024;

/// Process-wide arena supplied by the driver and threaded through
/// tokenizing, parsing, and generation. Every pointer handed out of `file`
/// or `permanent` stays valid until the `Arena` itself is dropped.
pub struct Arena {
    file: Bump,
    permanent: Bump,
    file_cap: usize,
    permanent_cap: usize,
}

impl Arena {
    /// Creates a fresh arena. `file_capacity`/`permanent_capacity` are soft
    /// caps in bytes; exceeding either is a fatal invariant violation.
    pub fn new(file_capacity: usize, permanent_capacity: usize) -> Self {
        Arena {
            file: Bump::new(),
            permanent: Bump::new(),
            file_cap: file_capacity,
            permanent_cap: permanent_capacity,
        }
    }

    pub fn with_default_capacities() -> Self {
        Self::new(DEFAULT_FILE_CAPACITY, DEFAULT_PERMANENT_CAPACITY)
    }

    /// Copies `bytes` into the file region and hands back a slice whose
    /// lifetime is tied to this arena. Every token and declaration name the
    /// tokenizer/parser ever produce is a sub-slice of one of these.
    pub fn push_file<'a>(&'a self, bytes: &[u8]) -> &'a [u8] {
        check_capacity("file", &self.file, bytes.len(), self.file_cap);
        self.file.alloc_slice_copy(bytes)
    }

    /// Like [`Arena::push_file`], but validates the bytes are UTF-8 first,
    /// since every input this tool accepts is C/C++-flavored source text.
    pub fn push_file_str<'a>(&'a self, text: &str) -> &'a str {
        let bytes = self.push_file(text.as_bytes());
        // Safe: `bytes` is a verbatim copy of `text`, which was valid UTF-8.
        std::str::from_utf8(bytes).expect("push_file_str: copied bytes are always valid UTF-8")
    }

    /// Raw allocation out of the permanent region, zero-initialized, with
    /// the given alignment (the spec's `push_permanent(size, alignment)`).
    pub fn push_permanent(&self, size: usize, alignment: usize) -> &mut [u8] {
        check_capacity("permanent", &self.permanent, size, self.permanent_cap);
        let layout = std::alloc::Layout::from_size_align(size, alignment)
            .expect("push_permanent: invalid size/alignment");
        let ptr = self.permanent.alloc_layout(layout);
        // SAFETY: `alloc_layout` returns `size` freshly-allocated, unaliased
        // bytes owned by this arena for its remaining lifetime.
        let slice = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) };
        slice.fill(0);
        slice
    }

    /// Copies `text` into the permanent region (used by the generator for
    /// owned scratch strings it wants to keep around after a `Scratch`
    /// scope closes).
    pub fn push_permanent_str(&self, text: &str) -> &str {
        check_capacity("permanent", &self.permanent, text.len(), self.permanent_cap);
        self.permanent.alloc_str(text)
    }

    /// Opens a scoped scratch region. The region is released in full when
    /// the returned [`Scratch`] is dropped (or its `end` is called
    /// explicitly) — the Rust expression of "scope guard whose destruction
    /// restores the high-water mark" (see DESIGN.md).
    pub fn scope_begin(&self, size_hint: usize) -> Scratch {
        Scratch {
            bump: Bump::with_capacity(size_hint),
            used: Cell::new(0),
        }
    }
}

fn check_capacity(region: &str, bump: &Bump, additional: usize, cap: usize) {
    let used = bump.allocated_bytes();
    if used + additional > cap {
        panic!(
            "reflectc_arena: {region} arena exhausted (used {used} + requested {additional} > cap {cap})"
        );
    }
}

/// A scoped scratch allocator carved out for the duration of one generator
/// step (e.g. collecting the distinct `MetaType` names). Scopes may nest in
/// strict LIFO order simply because each one owns its own `Bump` and
/// borrows nothing from its parent.
pub struct Scratch {
    bump: Bump,
    used: Cell<usize>,
}

impl Scratch {
    /// Allocates `size` zero-initialized bytes at the given alignment
    /// within this scope's slab.
    pub fn alloc(&self, size: usize, alignment: usize) -> &mut [u8] {
        let layout = std::alloc::Layout::from_size_align(size, alignment)
            .expect("Scratch::alloc: invalid size/alignment");
        let ptr = self.bump.alloc_layout(layout);
        self.used.set(self.used.get() + size);
        // SAFETY: see `Arena::push_permanent`.
        let slice = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) };
        slice.fill(0);
        slice
    }

    /// Allocates a single value into this scope.
    pub fn alloc_value<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    /// A growable vector backed by this scope's slab, freed along with the
    /// rest of the scope — the mechanism §5 has in mind for "the list of
    /// distinct `MetaType` names built while generating the `MetaType`
    /// enum".
    pub fn vec<'s, T>(&'s self) -> bumpalo::collections::Vec<'s, T> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    pub fn bytes_used(&self) -> usize {
        self.used.get()
    }

    /// Explicit, named end-of-scope; equivalent to dropping `self`. Kept as
    /// a named operation so call sites can mirror the spec's
    /// `scope_begin`/`scope_end` pairing even though Rust's `Drop` makes it
    /// unconditional.
    pub fn end(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_file_returns_stable_slice() {
        let arena = Arena::with_default_capacities();
        let a = arena.push_file_str("struct V2 { int x; };");
        let b = arena.push_file_str("struct Ball {};");
        assert_eq!(a, "struct V2 { int x; };");
        assert_eq!(b, "struct Ball {};");
    }

    #[test]
    fn scratch_scopes_nest_lifo() {
        let arena = Arena::with_default_capacities();
        let outer = arena.scope_begin(64);
        let outer_val = outer.alloc_value(1u32);
        {
            let inner = arena.scope_begin(64);
            let inner_val = inner.alloc_value(2u32);
            assert_eq!(*inner_val, 2);
            inner.end();
        }
        assert_eq!(*outer_val, 1);
    }

    #[test]
    fn scratch_vec_collects_and_is_freed_on_end() {
        let arena = Arena::with_default_capacities();
        let scratch = arena.scope_begin(64);
        let mut names = scratch.vec();
        names.push("char");
        names.push("int");
        assert_eq!(names.as_slice(), ["char", "int"]);
        scratch.end();
    }

    #[test]
    #[should_panic(expected = "file arena exhausted")]
    fn file_exhaustion_is_fatal() {
        let arena = Arena::new(8, DEFAULT_PERMANENT_CAPACITY);
        let _ = arena.push_file(&[0u8; 9]);
    }

    #[test]
    #[should_panic(expected = "permanent arena exhausted")]
    fn permanent_exhaustion_is_fatal() {
        let arena = Arena::new(DEFAULT_FILE_CAPACITY, 8);
        let _ = arena.push_permanent(9, 4);
    }
}
