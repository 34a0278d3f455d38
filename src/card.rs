use anyhow::{Result, bail};

pub const MAX_RANK: u8 = 9;
pub const TOTAL_SUITS: usize = 3;
pub const TOTAL_DRAGONS: usize = 3;
pub const DRAGON_COPIES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Red,
    Green,
    Black,
}

impl Suit {
    pub const ALL: [Suit; TOTAL_SUITS] = [Suit::Red, Suit::Green, Suit::Black];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            Suit::Red => 'r',
            Suit::Green => 'g',
            Suit::Black => 'b',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.letter() == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dragon {
    Red,
    Green,
    White,
}

impl Dragon {
    pub const ALL: [Dragon; TOTAL_DRAGONS] = [Dragon::Red, Dragon::Green, Dragon::White];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            Dragon::Red => 'R',
            Dragon::Green => 'G',
            Dragon::White => 'W',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.letter() == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Card {
    Suited(Suit, u8),
    Dragon(Dragon),
    Flower,
}

impl Card {
    pub fn suited(suit: Suit, rank: u8) -> Self {
        Card::Suited(suit, rank)
    }

    pub fn suit(&self) -> Option<Suit> {
        match self {
            Card::Suited(suit, _) => Some(*suit),
            _ => None,
        }
    }

    pub fn rank(&self) -> Option<u8> {
        match self {
            Card::Suited(_, rank) => Some(*rank),
            _ => None,
        }
    }

    pub fn dragon(&self) -> Option<Dragon> {
        match self {
            Card::Dragon(dragon) => Some(*dragon),
            _ => None,
        }
    }

    pub fn is_flower(&self) -> bool {
        matches!(self, Card::Flower)
    }

    pub fn parse(token: &str) -> Result<Self> {
        let mut chars = token.chars();
        let card = match (chars.next(), chars.next(), chars.next()) {
            (Some('F'), None, None) => Card::Flower,
            (Some(c), None, None) => match Dragon::from_letter(c) {
                Some(dragon) => Card::Dragon(dragon),
                None => bail!("Invalid card '{token}'"),
            },
            (Some(s), Some(r), None) => {
                let Some(suit) = Suit::from_letter(s) else {
                    bail!("Invalid suit at card '{token}'");
                };
                let rank = match r.to_digit(10) {
                    Some(rank) if (1..=MAX_RANK as u32).contains(&rank) => rank as u8,
                    _ => bail!("Invalid rank at card '{token}'"),
                };
                Card::Suited(suit, rank)
            }
            _ => bail!("Invalid card '{token}'"),
        };
        Ok(card)
    }

    pub fn pretty_print(&self) -> String {
        match self {
            Card::Suited(suit, rank) => format!("{}{rank}", suit.letter()),
            Card::Dragon(dragon) => dragon.letter().to_string(),
            Card::Flower => "F".to_string(),
        }
    }
}

/// Whether `lower` may sit directly on top of `upper` in a column.
pub fn stackable(lower: Card, upper: Card) -> bool {
    match (lower, upper) {
        (Card::Suited(lower_suit, lower_rank), Card::Suited(upper_suit, upper_rank)) => {
            lower_suit != upper_suit && lower_rank + 1 == upper_rank
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stackable() {
        let r4 = Card::suited(Suit::Red, 4);
        let g5 = Card::suited(Suit::Green, 5);
        let r5 = Card::suited(Suit::Red, 5);
        assert!(stackable(r4, g5));
        assert!(!stackable(g5, r4));
        assert!(!stackable(r4, r5));
        assert!(!stackable(Card::Dragon(Dragon::Red), g5));
        assert!(!stackable(r4, Card::Flower));
    }

    #[test]
    fn test_parse_card() {
        assert_eq!(Card::parse("b9").unwrap(), Card::suited(Suit::Black, 9));
        assert_eq!(Card::parse("W").unwrap(), Card::Dragon(Dragon::White));
        assert_eq!(Card::parse("F").unwrap(), Card::Flower);
        assert!(Card::parse("r0").is_err());
        assert!(Card::parse("x3").is_err());
        assert!(Card::parse("B").is_err());
        assert!(Card::parse("r10").is_err());
        for token in ["r1", "g7", "b3", "R", "G", "W", "F"] {
            assert_eq!(Card::parse(token).unwrap().pretty_print(), token);
        }
    }
}
