//! 256-bit byte membership sets.
//!
//! A [`ByteSet`] is the matcher behind character classes like `[0-9a-f]`.
//! Membership is a bitmap probe; [`ByteSet::ranges`] recovers the compact
//! `lo-hi` runs for display and code emission.

use std::fmt;

/// Set of byte values, one bit per value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteSet {
    bits: [u64; 4],
}

impl ByteSet {
    pub const EMPTY: ByteSet = ByteSet { bits: [0; 4] };
    pub const FULL: ByteSet = ByteSet { bits: [u64::MAX; 4] };

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Set containing exactly `byte`.
    pub fn single(byte: u8) -> Self {
        let mut set = Self::EMPTY;
        set.insert(byte);
        set
    }

    /// Set containing the inclusive range `lo..=hi`.
    pub fn range(lo: u8, hi: u8) -> Self {
        let mut set = Self::EMPTY;
        set.insert_range(lo, hi);
        set
    }

    #[inline]
    pub fn insert(&mut self, byte: u8) {
        self.bits[(byte >> 6) as usize] |= 1 << (byte & 63);
    }

    /// Inserts every byte in `lo..=hi`. Does nothing when `lo > hi`.
    pub fn insert_range(&mut self, lo: u8, hi: u8) {
        for b in lo..=hi {
            self.insert(b);
        }
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.bits[(byte >> 6) as usize] & (1 << (byte & 63)) != 0
    }

    /// Union of `self` and `other`.
    pub fn union(&self, other: &ByteSet) -> ByteSet {
        let mut bits = self.bits;
        for (dst, src) in bits.iter_mut().zip(other.bits.iter()) {
            *dst |= src;
        }
        ByteSet { bits }
    }

    /// Set of every byte not in `self`.
    pub fn complement(&self) -> ByteSet {
        let mut bits = self.bits;
        for word in bits.iter_mut() {
            *word = !*word;
        }
        ByteSet { bits }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == [0; 4]
    }

    /// Iterates members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=255u8).filter(|&b| self.contains(b))
    }

    /// Iterates the maximal runs of consecutive members as `(lo, hi)` pairs.
    pub fn ranges(&self) -> Ranges {
        Ranges { set: *self, next: 0 }
    }
}

/// Iterator over the consecutive runs of a [`ByteSet`].
pub struct Ranges {
    set: ByteSet,
    next: u16,
}

impl Iterator for Ranges {
    type Item = (u8, u8);

    fn next(&mut self) -> Option<(u8, u8)> {
        while self.next < 256 && !self.set.contains(self.next as u8) {
            self.next += 1;
        }
        if self.next >= 256 {
            return None;
        }
        let lo = self.next as u8;
        let mut hi = lo;
        while self.next < 256 && self.set.contains(self.next as u8) {
            hi = self.next as u8;
            self.next += 1;
        }
        Some((lo, hi))
    }
}

fn write_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte {
        b'\n' => write!(f, "\\n"),
        b'\r' => write!(f, "\\r"),
        b'\t' => write!(f, "\\t"),
        b'\\' | b'[' | b']' | b'-' => write!(f, "\\{}", byte as char),
        0x20..=0x7e => write!(f, "{}", byte as char),
        _ => write!(f, "\\x{byte:02x}"),
    }
}

impl fmt::Display for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (lo, hi) in self.ranges() {
            write_byte(f, lo)?;
            if hi > lo {
                if hi > lo + 1 {
                    write!(f, "-")?;
                }
                write_byte(f, hi)?;
            }
        }
        write!(f, "]")
    }
}

impl fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSet({self})")
    }
}

impl FromIterator<u8> for ByteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ByteSet::EMPTY;
        for b in iter {
            set.insert(b);
        }
        set
    }
}
