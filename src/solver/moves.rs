use super::helper::LowestRanks;
use crate::action::Action;
use crate::board::{Board, FreeCell};
use crate::card::{Card, DRAGON_COPIES, Dragon, TOTAL_DRAGONS, stackable};

use smallvec::SmallVec;

pub type PossibleMoves = SmallVec<[Action; 64]>;

/// Foundation sends, run transfers and dragon collapses.
pub fn column_actions(board: &Board, lowest: &LowestRanks, possible_moves: &mut PossibleMoves) {
    let mut exposed_dragons = [0usize; TOTAL_DRAGONS];

    for (src_idx, src_column) in board.columns.iter().enumerate() {
        let Some(&src_top_card) = src_column.peek_top() else {
            continue;
        };
        match src_top_card {
            Card::Dragon(dragon) => exposed_dragons[dragon.index()] += 1,
            Card::Suited(suit, rank) if lowest.get(suit) == rank => {
                possible_moves.push(Action::ColumnToFoundation(src_idx));
            }
            _ => {}
        }

        let src_len = src_column.len();
        let run_len = src_column.run_len();
        for count in 1..=run_len {
            let moved_card = src_column.cards[src_len - count];
            for (dest_idx, dest_column) in board.columns.iter().enumerate() {
                if dest_idx == src_idx {
                    continue;
                }
                let accepted = match dest_column.peek_top() {
                    Some(&dest_top_card) => stackable(moved_card, dest_top_card),
                    None => count != src_len,
                };
                if accepted {
                    possible_moves.push(Action::ColumnToColumn(src_idx, dest_idx, count));
                }
            }
        }
    }

    let mut has_empty_cell = false;
    let mut cell_holds = [false; TOTAL_DRAGONS];
    for cell in &board.cells {
        match cell {
            FreeCell::Empty => has_empty_cell = true,
            FreeCell::Holding(Card::Dragon(dragon)) => {
                exposed_dragons[dragon.index()] += 1;
                cell_holds[dragon.index()] = true;
            }
            _ => {}
        }
    }

    for dragon in Dragon::ALL {
        let idx = dragon.index();
        if exposed_dragons[idx] == DRAGON_COPIES && (has_empty_cell || cell_holds[idx]) {
            possible_moves.push(Action::CollapseDragons(dragon));
        }
    }
}

/// Moves into and out of the free cells.
pub fn cell_actions(board: &Board, possible_moves: &mut PossibleMoves) {
    for (src_idx, src_column) in board.columns.iter().enumerate() {
        if src_column.is_empty() {
            continue;
        }
        for (cell_idx, cell) in board.cells.iter().enumerate() {
            if cell.is_empty() {
                possible_moves.push(Action::ColumnToCell(src_idx, cell_idx));
            }
        }
    }

    for (cell_idx, cell) in board.cells.iter().enumerate() {
        let Some(&card) = cell.card() else {
            continue;
        };
        for (dest_idx, dest_column) in board.columns.iter().enumerate() {
            let accepted = match dest_column.peek_top() {
                Some(&dest_top_card) => stackable(card, dest_top_card),
                None => true,
            };
            if accepted {
                possible_moves.push(Action::CellToColumn(cell_idx, dest_idx));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::apply_action;
    use crate::solver::cascade::resolve;

    fn settled(content: &str) -> (Board, LowestRanks) {
        let mut board = Board::parse(content).unwrap();
        let cascade = resolve(&mut board).unwrap();
        (board, cascade.lowest)
    }

    fn columns_of(board: &Board, lowest: &LowestRanks) -> PossibleMoves {
        let mut moves = PossibleMoves::new();
        column_actions(board, lowest, &mut moves);
        moves
    }

    #[test]
    fn test_single_dragon_collapse() {
        let (board, lowest) = settled(
            "Column1: g2 R\nColumn2: b5 R\nColumn3: R\nColumn4: r7\nCells: R b9 _",
        );
        let moves = columns_of(&board, &lowest);
        let collapses: Vec<_> = moves
            .iter()
            .filter(|a| matches!(a, Action::CollapseDragons(_)))
            .collect();
        assert_eq!(collapses, [&Action::CollapseDragons(Dragon::Red)]);

        let mut next = board.clone();
        apply_action(&mut next, collapses[0]);
        assert_eq!(next.cleared, board.cleared + DRAGON_COPIES);
        assert_eq!(next.cells.iter().filter(|c| c.is_locked()).count(), 1);
        assert!(next.columns.iter().all(|c| c.peek_top() != Some(&Card::Dragon(Dragon::Red))));
    }

    #[test]
    fn test_no_collapse_without_cell() {
        let (board, lowest) = settled("Column1: g2 G\nColumn2: G\nColumn3: G\nColumn4: G\nCells: r5 X b6");
        let moves = columns_of(&board, &lowest);
        assert!(!moves.iter().any(|a| matches!(a, Action::CollapseDragons(_))));

        let (board, lowest) = settled("Column1: g2 G\nColumn2: G\nColumn3: G\nCells: G X b6");
        let moves = columns_of(&board, &lowest);
        assert!(moves.contains(&Action::CollapseDragons(Dragon::Green)));
    }

    #[test]
    fn test_foundation_send() {
        let (board, lowest) = settled("Column1: g2 r3\nColumn2: W g4\nColumn3: b2 W");
        let moves = columns_of(&board, &lowest);
        assert!(moves.contains(&Action::ColumnToFoundation(0)));
        assert!(!moves.contains(&Action::ColumnToFoundation(1)));
    }

    #[test]
    fn test_run_transfers() {
        let (board, lowest) = settled("Column1: g2 W b5 r4\nColumn2: g6\nColumn3: W g5");
        let moves = columns_of(&board, &lowest);
        assert!(moves.contains(&Action::ColumnToColumn(0, 1, 2)));
        assert!(moves.contains(&Action::ColumnToColumn(0, 2, 1)));
        assert!(moves.contains(&Action::ColumnToColumn(0, 3, 1)));
        assert!(moves.contains(&Action::ColumnToColumn(0, 3, 2)));
        assert!(!moves.contains(&Action::ColumnToColumn(0, 3, 3)));
        assert!(!moves.contains(&Action::ColumnToColumn(0, 1, 1)));
    }

    #[test]
    fn test_no_whole_column_back() {
        let (board, lowest) = settled("Column1: g9 b5 r4\nColumn3: g2 G");
        let mut next = board.clone();
        apply_action(&mut next, &Action::ColumnToColumn(0, 1, 2));
        resolve(&mut next).unwrap();

        let moves = columns_of(&next, &lowest);
        assert!(moves.contains(&Action::ColumnToColumn(1, 3, 1)));
        for action in &moves {
            if let Action::ColumnToColumn(1, to_idx, 2) = *action {
                assert!(!next.columns[to_idx].is_empty());
            }
        }
        assert!(!moves.contains(&Action::ColumnToColumn(1, 0, 2)));
    }

    #[test]
    fn test_cell_actions() {
        let (board, _) = settled("Column1: g2 b6\nColumn2: r7\nCells: r5 _ X");
        let mut moves = PossibleMoves::new();
        cell_actions(&board, &mut moves);
        assert_eq!(
            moves.as_slice(),
            [
                Action::ColumnToCell(0, 1),
                Action::ColumnToCell(1, 1),
                Action::CellToColumn(0, 0),
                Action::CellToColumn(0, 2),
                Action::CellToColumn(0, 3),
                Action::CellToColumn(0, 4),
                Action::CellToColumn(0, 5),
                Action::CellToColumn(0, 6),
                Action::CellToColumn(0, 7),
            ]
        );
    }
}
