//! Rule-table combat resolver.
//!
//! Double dispatch on `(attacker kind, defender kind)` is a lookup into a
//! `3 x 3` table indexed by [`Kind::index`]. Rows are attackers, columns are
//! defenders.
//!
//! # Standard Rules
//!
//! | attacker \ defender | Dragon   | Knight   | `BlackKnight` |
//! |---------------------|----------|----------|---------------|
//! | Dragon              | survives | dies     | survives      |
//! | Knight              | dies     | survives | survives      |
//! | `BlackKnight`       | dies     | dies     | dies          |

use crate::entity::Kind;

use super::Resolver;

/// Verdict table: `table[attacker.index()][defender.index()]` is `true` when
/// the defender dies.
pub type RuleTable = [[bool; Kind::COUNT]; Kind::COUNT];

const STANDARD_RULES: RuleTable = [
    // Dragon attacks:       Dragon, Knight, BlackKnight
    [false, true, false],
    // Knight attacks
    [true, false, false],
    // BlackKnight attacks
    [true, true, true],
];

/// Resolver backed by a [`RuleTable`].
///
/// Holds no mutable state, so it is safe to share across threads and to
/// call without any locking.
///
/// # Example
///
/// ```
/// use bestiary_core::entity::Kind;
/// use bestiary_core::resolver::{CombatResolver, Resolver};
///
/// let resolver = CombatResolver::standard();
/// assert!(resolver.resolve(Kind::Knight, Kind::Dragon));
/// assert!(!resolver.resolve(Kind::Dragon, Kind::BlackKnight));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatResolver {
    table: RuleTable,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl CombatResolver {
    /// Creates a resolver with the standard bestiary rules.
    #[must_use]
    pub const fn standard() -> Self {
        Self::from_table(STANDARD_RULES)
    }

    /// Creates a resolver with a custom rule table.
    #[must_use]
    pub const fn from_table(table: RuleTable) -> Self {
        Self { table }
    }

    /// Returns the underlying rule table.
    #[must_use]
    pub const fn table(&self) -> &RuleTable {
        &self.table
    }
}

impl Resolver for CombatResolver {
    fn resolve(&self, attacker: Kind, defender: Kind) -> bool {
        self.table[attacker.index()][defender.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod standard_rules_tests {
        use super::*;

        #[test]
        fn knights_slay_dragons() {
            let resolver = CombatResolver::standard();
            assert!(resolver.resolve(Kind::Knight, Kind::Dragon));
        }

        #[test]
        fn dragons_slay_knights() {
            let resolver = CombatResolver::standard();
            assert!(resolver.resolve(Kind::Dragon, Kind::Knight));
        }

        #[test]
        fn same_kind_survives_except_black_knights() {
            let resolver = CombatResolver::standard();
            assert!(!resolver.resolve(Kind::Dragon, Kind::Dragon));
            assert!(!resolver.resolve(Kind::Knight, Kind::Knight));
            assert!(resolver.resolve(Kind::BlackKnight, Kind::BlackKnight));
        }

        #[test]
        fn black_knights_are_lethal_to_everyone() {
            let resolver = CombatResolver::standard();
            for defender in Kind::ALL {
                assert!(resolver.resolve(Kind::BlackKnight, defender));
            }
        }

        #[test]
        fn black_knights_survive_every_attacker_but_their_own() {
            let resolver = CombatResolver::standard();
            assert!(!resolver.resolve(Kind::Dragon, Kind::BlackKnight));
            assert!(!resolver.resolve(Kind::Knight, Kind::BlackKnight));
        }

        #[test]
        fn default_is_standard() {
            assert_eq!(CombatResolver::default(), CombatResolver::standard());
        }
    }

    mod custom_table_tests {
        use super::*;

        #[test]
        fn custom_table_is_used() {
            let mut table = [[false; Kind::COUNT]; Kind::COUNT];
            table[Kind::Dragon.index()][Kind::BlackKnight.index()] = true;
            let resolver = CombatResolver::from_table(table);

            assert!(resolver.resolve(Kind::Dragon, Kind::BlackKnight));
            assert!(!resolver.resolve(Kind::BlackKnight, Kind::Dragon));
            assert_eq!(resolver.table(), &table);
        }
    }
}
