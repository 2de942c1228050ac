use std::fmt;

use anyhow::{Context, Result};

pub const MAX_RANK: u8 = 13;

const RANKS: [char; MAX_RANK as usize] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'J', 'Q', 'K',
];

/// A sortable symbol: a rank index into the thirteen-char alphabet.
/// The derived `Ord` is the total order the whole sort is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    pub fn new(rank: u8) -> Option<Self> {
        if rank < MAX_RANK { Some(Self(rank)) } else { None }
    }

    /// Parses a rank char. `'1'` is accepted as an alias of `'A'` so that
    /// plain digit sequences can be sorted as-is.
    pub fn parse(ch: char) -> Result<Self> {
        let ch = if ch == '1' { 'A' } else { ch };
        let rank = RANKS
            .iter()
            .position(|&r| r == ch)
            .with_context(|| format!("Invalid card '{ch}'"))?;
        Ok(Self(rank as u8))
    }

    pub fn parse_all(s: &str) -> Result<Vec<Self>> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(Self::parse)
            .collect()
    }

    pub fn rank(&self) -> u8 {
        self.0
    }

    pub fn as_char(&self) -> char {
        RANKS[self.0 as usize]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// True when `above` is exactly the next rank after `below`. No wraparound:
/// nothing stacks on a king, and an ace stacks on nothing.
pub fn stackable(below: Card, above: Card) -> bool {
    above.0 == below.0 + 1
}
