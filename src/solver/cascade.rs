//! Safe auto-play: sheds every card that can never be needed again.

use super::helper::LowestRanks;
use crate::board::{Board, TOTAL_CELLS, TOTAL_COLUMNS};
use crate::card::Card;

use anyhow::{Result, bail};

pub const MAX_PASSES: usize = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cascade {
    /// Passes that discarded at least one card.
    pub passes: usize,
    pub lowest: LowestRanks,
}

/// Runs discard passes until one discards nothing.
pub fn resolve(board: &mut Board) -> Result<Cascade> {
    let mut passes = 0;
    loop {
        let (discarded, lowest) = discard_pass(board);
        if !discarded {
            return Ok(Cascade { passes, lowest });
        }
        passes += 1;
        if passes >= MAX_PASSES {
            bail!(
                "Auto-play did not settle after {MAX_PASSES} passes on board:\n{}",
                board.pretty_print()
            );
        }
    }
}

fn discard_pass(board: &mut Board) -> (bool, LowestRanks) {
    let mut discarded = false;

    for idx in 0..TOTAL_COLUMNS {
        if board.columns[idx].peek_top().is_some_and(Card::is_flower) {
            board.discard_column_top(idx);
            discarded = true;
        }
        if board.columns[idx].peek_top().and_then(Card::rank) == Some(1) {
            board.discard_column_top(idx);
            discarded = true;
        }
    }

    let lowest = LowestRanks::compute(board);

    for idx in 0..TOTAL_COLUMNS {
        if board.columns[idx].peek_top().is_some_and(|card| is_safe(card, &lowest)) {
            board.discard_column_top(idx);
            discarded = true;
        }
    }
    for idx in 0..TOTAL_CELLS {
        if board.cells[idx].card().is_some_and(|card| is_safe(card, &lowest)) {
            board.discard_cell(idx);
            discarded = true;
        }
    }

    (discarded, lowest)
}

fn is_safe(card: &Card, lowest: &LowestRanks) -> bool {
    match *card {
        Card::Suited(_, rank) if rank > 2 => rank <= lowest.floor(),
        Card::Suited(suit, 2) => lowest.get(suit) == 2,
        _ => false,
    }
}
