use crate::SyntaxKind;

const _: () = assert!((SyntaxKind::DOTTED_CHAIN as u32) < u64::BITS);

/// A set of token kinds, used by the grammar for stop and continuation sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntaxSet(u64);

impl SyntaxSet {
    pub const EMPTY: Self = Self(0);

    const fn bit(kind: SyntaxKind) -> u64 {
        1 << kind as u8
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut bits = 0;

        let mut i = 0;
        while i < N {
            bits |= Self::bit(kinds[i]);
            i += 1;
        }

        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn with(self, kind: SyntaxKind) -> Self {
        Self(self.0 | Self::bit(kind))
    }

    pub const fn contains(self, kind: SyntaxKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::SyntaxSet;
    use crate::SyntaxKind::*;

    #[test]
    fn union_and_membership() {
        let ends = SyntaxSet::new([NEW_LINE, EOF]);
        let set = ends.union(SyntaxSet::new([DOT])).with(HASH);

        assert!(set.contains(NEW_LINE));
        assert!(set.contains(DOT));
        assert!(set.contains(HASH));
        assert!(!set.contains(EQ));
        assert!(!ends.contains(DOT));
        assert!(!SyntaxSet::EMPTY.contains(EOF));
    }
}
