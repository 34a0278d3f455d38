use crate::board::Board;
use crate::card::{Card, Dragon};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    ColumnToFoundation(usize),
    ColumnToColumn(usize, usize, usize), // (from_index, to_index, count)
    ColumnToCell(usize, usize),
    CellToColumn(usize, usize),
    CollapseDragons(Dragon),
}

pub fn format_actions(actions: &[Action]) -> String {
    let list: Vec<String> = actions
        .iter()
        .map(|action| match *action {
            Action::ColumnToFoundation(idx) => format!("C{}:F", idx + 1),
            Action::ColumnToColumn(from_idx, to_idx, count) => {
                let mut str = format!("C{}:C{}", from_idx + 1, to_idx + 1);
                if count > 1 {
                    str.push_str(&format!("@{count}"));
                }
                str
            }
            Action::ColumnToCell(from_idx, to_idx) => format!("C{}:S{}", from_idx + 1, to_idx + 1),
            Action::CellToColumn(from_idx, to_idx) => format!("S{}:C{}", from_idx + 1, to_idx + 1),
            Action::CollapseDragons(dragon) => format!("D:{}", dragon.letter()),
        })
        .collect();

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

/// Applies `action` mechanically; cascades are left to the caller.
pub fn apply_action(board: &mut Board, action: &Action) {
    match *action {
        Action::ColumnToFoundation(column_index) => {
            board.move_column_to_foundation(column_index);
        }
        Action::ColumnToColumn(from_index, to_index, count) => {
            board.move_column_to_column(from_index, to_index, count);
        }
        Action::ColumnToCell(column_index, cell_index) => {
            board.move_column_to_cell(column_index, cell_index);
        }
        Action::CellToColumn(cell_index, column_index) => {
            board.move_cell_to_column(cell_index, column_index);
        }
        Action::CollapseDragons(dragon) => {
            board.collapse_dragons(dragon);
        }
    }
}

pub fn describe_action(board: &Board, action: &Action) -> String {
    let format_card =
        |card: Option<&Card>| -> String { card.map(|c| c.pretty_print()).unwrap_or_default() };

    match *action {
        Action::ColumnToFoundation(column_index) => {
            let card = format_card(board.columns[column_index].peek_top());
            let slot = board.columns[column_index]
                .peek_top()
                .and_then(Card::suit)
                .and_then(|suit| board.foundations.slot(suit))
                .map(|slot| (slot + 1).to_string())
                .unwrap_or_else(|| "?".into());
            format!("(Column{}) {card} -> (Foundation{slot})", column_index + 1)
        }
        Action::ColumnToColumn(from_index, to_index, count) => {
            let from_column_cards = &board.columns[from_index].cards;
            let from_cards = from_column_cards
                .iter()
                .skip(from_column_cards.len() - count)
                .map(|c| c.pretty_print())
                .collect::<Vec<_>>()
                .join(" ");
            let to_card = format_card(board.columns[to_index].peek_top());
            format!(
                "(Column{}) {from_cards} -> (Column{}) {to_card}",
                from_index + 1,
                to_index + 1
            )
        }
        Action::ColumnToCell(column_index, cell_index) => {
            let card = format_card(board.columns[column_index].peek_top());
            format!(
                "(Column{}) {card} -> (Cell{})",
                column_index + 1,
                cell_index + 1
            )
        }
        Action::CellToColumn(cell_index, column_index) => {
            let card = format_card(board.cells[cell_index].card());
            let to_card = format_card(board.columns[column_index].peek_top());
            format!(
                "(Cell{}) {card} -> (Column{}) {to_card}",
                cell_index + 1,
                column_index + 1
            )
        }
        Action::CollapseDragons(dragon) => format!("Collapse {} dragons", dragon.letter()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FreeCell;

    #[test]
    fn test_format_actions() {
        let actions = [
            Action::ColumnToFoundation(0),
            Action::ColumnToColumn(1, 2, 1),
            Action::ColumnToColumn(3, 7, 3),
            Action::ColumnToCell(4, 0),
            Action::CellToColumn(2, 5),
            Action::CollapseDragons(Dragon::White),
        ];
        assert_eq!(
            format_actions(&actions),
            "C1:F    C2:C3   C4:C8@3 C5:S1   S3:C6   D:W     \n"
        );
    }

    #[test]
    fn test_apply_and_describe() {
        let mut board = Board::parse("Column1: g6 r5 b4\nColumn2: W\nCells: _ _ X\nFoundations: b _ _").unwrap();

        let action = Action::ColumnToColumn(0, 2, 2);
        assert_eq!(describe_action(&board, &action), "(Column1) r5 b4 -> (Column3) ");
        apply_action(&mut board, &action);
        assert_eq!(board.columns[0].len(), 1);
        assert_eq!(board.columns[2].len(), 2);

        let action = Action::ColumnToCell(1, 1);
        assert_eq!(describe_action(&board, &action), "(Column2) W -> (Cell2)");
        apply_action(&mut board, &action);
        assert_eq!(board.cells[1], FreeCell::Holding(Card::Dragon(Dragon::White)));

        let action = Action::ColumnToFoundation(2);
        assert_eq!(describe_action(&board, &action), "(Column3) b4 -> (Foundation1)");
        apply_action(&mut board, &action);
        assert_eq!(board.cleared, 1);
        assert_eq!(board.remaining_cards(), 3);

        let action = Action::CellToColumn(1, 0);
        assert_eq!(describe_action(&board, &action), "(Cell2) W -> (Column1) g6");
    }
}
