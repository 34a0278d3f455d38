use crate::board::{Board, Column, FreeCell};
use crate::card::{MAX_RANK, Suit, TOTAL_SUITS, stackable};

pub const SOLVED_PRIORITY: f64 = -999.0;
const NEAR_COMPLETE_OFFSET: f64 = -100.0;
const NEAR_COMPLETE_CARDS: usize = 10;
const TURN_WEIGHT: f64 = 0.1;
const STACKED_WEIGHT: f64 = 0.9;
const SORTED_COLUMN_BONUS: f64 = 1.1;
const SORTED_FROM_NINE_BONUS: f64 = 1.2;

/// Lowest rank of each suit still on the table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LowestRanks([u8; TOTAL_SUITS]);

impl LowestRanks {
    /// Stored for a suit with no card left anywhere.
    pub const NONE: u8 = MAX_RANK + 1;

    pub fn compute(board: &Board) -> Self {
        let mut ranks = [Self::NONE; TOTAL_SUITS];
        let cards = board
            .columns
            .iter()
            .flat_map(|column| column.cards.iter())
            .chain(board.cells.iter().filter_map(FreeCell::card));
        for card in cards {
            if let (Some(suit), Some(rank)) = (card.suit(), card.rank()) {
                let lowest = &mut ranks[suit.index()];
                *lowest = (*lowest).min(rank);
            }
        }
        Self(ranks)
    }

    pub fn get(&self, suit: Suit) -> u8 {
        self.0[suit.index()]
    }

    /// The lowest outstanding rank across every suit.
    pub fn floor(&self) -> u8 {
        self.0.iter().copied().min().unwrap_or(Self::NONE)
    }
}

pub fn stacked_bonus(columns: &[Column]) -> f64 {
    columns
        .iter()
        .filter(|column| !column.is_empty())
        .map(|column| {
            let cards = &column.cards;
            let stacked = cards
                .windows(2)
                .filter(|pair| stackable(pair[1], pair[0]))
                .count();
            let sorted = cards.len() > 1 && stacked == cards.len() - 1;
            let multiplier = match (sorted, cards[0].rank()) {
                (true, Some(MAX_RANK)) => SORTED_FROM_NINE_BONUS,
                (true, _) => SORTED_COLUMN_BONUS,
                (false, _) => 1.0,
            };
            stacked as f64 * multiplier
        })
        .sum()
}

/// Lower is explored first.
pub fn priority(board: &Board, turn: u32) -> f64 {
    let remaining = board.remaining_cards();
    let turn = turn as f64 * TURN_WEIGHT;
    if remaining == 0 {
        SOLVED_PRIORITY
    } else if remaining < NEAR_COMPLETE_CARDS {
        NEAR_COMPLETE_OFFSET + remaining as f64 + turn
    } else {
        remaining as f64 + turn - stacked_bonus(&board.columns) * STACKED_WEIGHT
    }
}
