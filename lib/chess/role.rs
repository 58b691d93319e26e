use derive_more::{Display, Error};
use std::str::FromStr;

/// The kind of a chess [`Piece`][`crate::chess::Piece`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[repr(u8)]
pub enum Role {
    #[display("p")]
    Pawn,
    #[display("n")]
    Knight,
    #[display("b")]
    Bishop,
    #[display("r")]
    Rook,
    #[display("q")]
    Queen,
    #[display("k")]
    King,
}

impl Role {
    /// An iterator over all roles in ascending exchange value order.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        use Role::*;
        [Pawn, Knight, Bishop, Rook, Queen, King].into_iter()
    }

    /// Constructs [`Role`] from its index.
    #[inline(always)]
    pub const fn from_index(idx: usize) -> Self {
        use Role::*;
        const ROLES: [Role; 6] = [Pawn, Knight, Bishop, Rook, Queen, King];
        ROLES[idx]
    }

    /// This role's index, in ascending exchange value order.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// This role's exchange value in centipawns.
    ///
    /// The order pawn < knight < bishop < rook < queen < king is relied upon
    /// by the exchange evaluation.
    #[inline(always)]
    pub const fn value(self) -> i32 {
        match self {
            Role::Pawn => 100,
            Role::Knight => 320,
            Role::Bishop => 330,
            Role::Rook => 500,
            Role::Queen => 900,
            Role::King => 20000,
        }
    }
}

/// The reason why parsing [`Role`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse role")]
pub struct ParseRoleError;

impl FromStr for Role {
    type Err = ParseRoleError;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p" => Ok(Role::Pawn),
            "n" => Ok(Role::Knight),
            "b" => Ok(Role::Bishop),
            "r" => Ok(Role::Rook),
            "q" => Ok(Role::Queen),
            "k" => Ok(Role::King),
            _ => Err(ParseRoleError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn role_has_an_index(r: Role) {
        assert_eq!(Role::from_index(r.index()), r);
    }

    #[test]
    fn role_values_are_sorted_ascending() {
        let values: Vec<_> = Role::iter().map(Role::value).collect();
        assert!(values.is_sorted());
    }

    #[proptest]
    fn parsing_printed_role_is_an_identity(r: Role) {
        assert_eq!(r.to_string().parse(), Ok(r));
    }

    #[proptest]
    fn parsing_role_fails_if_not_one_of_pnbrqk(
        #[filter(!['p', 'n', 'b', 'r', 'q', 'k'].contains(&#c))] c: char,
    ) {
        assert_eq!(c.to_string().parse::<Role>(), Err(ParseRoleError));
    }
}
