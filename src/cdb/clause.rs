//! Clause header layout and word-level access into the arena (component A,
//! spec.md §3 "Clause" / §9 "Bitfields"). A clause is never represented as
//! an owned `Vec<Lit>`; it is always a view computed from an arena slice and
//! a `ClauseRef`, following spec.md §9's "pointer graphs must not leak into
//! the type system" directive (the teacher's own boxed-`Clause`/`ClauseId`
//! pair is adapted into an arena offset instead, since the specification
//! requires word-packed storage that the teacher does not have).
use crate::types::{ClauseFlag, Lit};

/// Header word layout, packed into a single `u32`:
/// `[ glue:16 | flags:8 | size:8 ]` bits from MSB to LSB.
///
/// `size` is capped at 255 in the header; clauses larger than that (rare,
/// e.g. the size-10^5 boundary scenario of spec.md §8) store the real size
/// in the first body word instead and set `size` to `0xff` as an escape
/// marker, mirroring the "size(c)" accounting of spec.md §4.A without
/// bounding clause length to a byte.
const SIZE_ESCAPE: u32 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseHeader {
    pub flags: ClauseFlag,
    pub glue: u32,
    pub size: usize,
}

impl ClauseHeader {
    pub fn pack(&self) -> u32 {
        let size_field = if self.size < SIZE_ESCAPE as usize {
            self.size as u32
        } else {
            SIZE_ESCAPE
        };
        let glue = self.glue.min(0xffff);
        (glue << 16) | ((self.flags.bits() & 0xff) << 8) | size_field
    }

    pub fn unpack(word: u32, escape: Option<u32>) -> ClauseHeader {
        let size_field = word & 0xff;
        let flags = ClauseFlag::from_bits_truncate((word >> 8) & 0xff);
        let glue = word >> 16;
        let size = if size_field == SIZE_ESCAPE {
            escape.expect("escaped clause size word must follow header") as usize
        } else {
            size_field as usize
        };
        ClauseHeader { flags, glue, size }
    }

    /// Number of arena words the header itself occupies: the packed word,
    /// plus one extra word when the size escape is used.
    pub fn header_words(&self) -> usize {
        if self.size >= SIZE_ESCAPE as usize {
            2
        } else {
            1
        }
    }
}

/// Read-only view of a clause living at some `ClauseRef` inside the arena.
/// Borrowing a `&[u32]` slice rather than the whole arena keeps this usable
/// from both the main clause store and Kitten's private arena (component Q).
pub struct ClauseView<'a> {
    pub header: ClauseHeader,
    lits: &'a [Lit],
}

impl<'a> ClauseView<'a> {
    /// `words` must start at the clause's header word.
    pub fn from_words(words: &'a [u32]) -> ClauseView<'a> {
        let first = words[0];
        let size_field = first & 0xff;
        let (header, body_words) = if size_field == SIZE_ESCAPE {
            (ClauseHeader::unpack(first, Some(words[1])), &words[2..])
        } else {
            (ClauseHeader::unpack(first, None), &words[1..])
        };
        let lits = unsafe {
            std::slice::from_raw_parts(body_words.as_ptr() as *const Lit, header.size)
        };
        ClauseView { header, lits }
    }

    pub fn lits(&self) -> &'a [Lit] {
        self.lits
    }

    pub fn size(&self) -> usize {
        self.header.size
    }

    pub fn is_redundant(&self) -> bool {
        self.header.flags.contains(ClauseFlag::REDUNDANT)
    }

    pub fn is_garbage(&self) -> bool {
        self.header.flags.contains(ClauseFlag::GARBAGE)
    }

    pub fn glue(&self) -> u32 {
        self.header.glue
    }
}

/// Total arena words a clause of `size` literals (plus its header) occupies,
/// rounded up so every clause starts on a word boundary -- trivially true
/// here since a `Lit` is exactly one `u32` wide, but kept as a named
/// function so the rounding rule has one definition (spec.md §4.A
/// `ceil_to_word`).
pub fn ceil_to_word(size: usize) -> usize {
    let header_words = if size >= SIZE_ESCAPE as usize { 2 } else { 1 };
    header_words + size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips_through_pack_unpack() {
        let h = ClauseHeader {
            flags: ClauseFlag::REDUNDANT | ClauseFlag::KEEP,
            glue: 12,
            size: 5,
        };
        let word = h.pack();
        let back = ClauseHeader::unpack(word, None);
        assert_eq!(h, back);
    }

    #[test]
    fn large_clause_uses_size_escape() {
        let h = ClauseHeader {
            flags: ClauseFlag::empty(),
            glue: 0,
            size: 100_000,
        };
        assert_eq!(h.header_words(), 2);
        assert_eq!(ceil_to_word(100_000), 100_002);
    }
}
