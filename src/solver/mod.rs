//! Best-first search over normalized boards.

mod cascade;
mod helper;
mod moves;

pub use self::cascade::{Cascade, MAX_PASSES, resolve};
pub use self::helper::{LowestRanks, SOLVED_PRIORITY, priority, stacked_bonus};
pub use self::moves::{PossibleMoves, cell_actions, column_actions};

use crate::action::{Action, apply_action};
use crate::board::Board;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
    time::{Duration, Instant},
};

pub const MAX_ITERATIONS: usize = 10_000;
const PROGRESS_INTERVAL: usize = 1_000;

pub fn solve(board: Board, max_iterations: usize) -> Result<SolveResult> {
    Solver::new().max_iterations(max_iterations).solve(board)
}

#[derive(Debug, Clone)]
pub struct Solver {
    max_iterations: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            cancel: None,
        }
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// The search gives up once `flag` is set; it is polled once per iteration.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn solve(&self, mut board: Board) -> Result<SolveResult> {
        board.validate().context("Invalid initial board state")?;
        let timer = Instant::now();

        let cascade = resolve(&mut board)?;
        let initial = board.clone();
        let mut search = Search::new(board, cascade);

        let mut iterations = 0;
        let mut solution_index = None;
        let mut possible_moves = PossibleMoves::new();

        while iterations < self.max_iterations {
            if self
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
            {
                tracing::debug!(iterations, "Search cancelled");
                break;
            }
            let Some(node) = search.open.pop() else {
                break;
            };
            iterations += 1;

            if node.board.is_solved() {
                solution_index = Some(node.index);
                break;
            }

            possible_moves.clear();
            column_actions(&node.board, &node.lowest, &mut possible_moves);
            if search.expand(&node, &possible_moves)? == 0 {
                possible_moves.clear();
                cell_actions(&node.board, &mut possible_moves);
                search.expand(&node, &possible_moves)?;
            }

            if iterations % PROGRESS_INTERVAL == 0 {
                tracing::debug!(
                    iterations,
                    states = search.closed.len(),
                    frontier = search.open.len(),
                    priority = node.priority,
                    "Searching"
                );
            }
        }

        let solution = solution_index.map(|index| Solution {
            initial,
            initial_passes: cascade.passes,
            steps: search.export_steps(index),
        });
        let elapsed = timer.elapsed();
        tracing::info!(
            solved = solution.is_some(),
            iterations,
            states = search.closed.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search finished"
        );

        Ok(SolveResult {
            solution,
            iterations,
            states: search.closed.len(),
            elapsed,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    pub action: Action,
    /// Auto-play passes that followed the action.
    pub passes: usize,
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// The deal after its own auto-play.
    pub initial: Board,
    pub initial_passes: usize,
    pub steps: Vec<Step>,
}

impl Solution {
    pub fn actions(&self) -> Vec<Action> {
        self.steps.iter().map(|step| step.action).collect()
    }

    /// The initial board followed by the board after each step.
    pub fn boards(&self) -> Result<Vec<Board>> {
        let mut boards = Vec::with_capacity(self.steps.len() + 1);
        let mut board = self.initial.clone();
        boards.push(board.clone());
        for step in &self.steps {
            apply_action(&mut board, &step.action);
            resolve(&mut board)?;
            boards.push(board.clone());
        }
        Ok(boards)
    }
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    /// `None` when the budget ran out or the frontier emptied.
    pub solution: Option<Solution>,
    pub iterations: usize,
    pub states: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Copy, Clone)]
struct SearchNode {
    parent: usize,
    step: Option<Step>,
}

struct OpenNode {
    priority: f64,
    seq: usize,
    index: usize,
    turn: u32,
    board: Board,
    lowest: LowestRanks,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

struct Search {
    open: BinaryHeap<OpenNode>,
    closed: FxHashSet<u64>,
    nodes: Vec<SearchNode>,
}

impl Search {
    fn new(board: Board, cascade: Cascade) -> Self {
        let mut closed = FxHashSet::default();
        closed.insert(board.canonical_hash());
        let mut open = BinaryHeap::new();
        open.push(OpenNode {
            priority: priority(&board, 0),
            seq: 0,
            index: 0,
            turn: 0,
            board,
            lowest: cascade.lowest,
        });
        Self {
            open,
            closed,
            nodes: vec![SearchNode {
                parent: 0,
                step: None,
            }],
        }
    }

    /// Enqueues the unseen successors of `node`, returning how many were added.
    fn expand(&mut self, node: &OpenNode, actions: &[Action]) -> Result<usize> {
        let mut added = 0;
        for &action in actions {
            let mut board = node.board.clone();
            apply_action(&mut board, &action);
            let cascade = resolve(&mut board)?;

            if !self.closed.insert(board.canonical_hash()) {
                continue;
            }

            let index = self.nodes.len();
            self.nodes.push(SearchNode {
                parent: node.index,
                step: Some(Step {
                    action,
                    passes: cascade.passes,
                }),
            });
            let turn = node.turn + 1;
            self.open.push(OpenNode {
                priority: priority(&board, turn),
                seq: index,
                index,
                turn,
                board,
                lowest: cascade.lowest,
            });
            added += 1;
        }
        Ok(added)
    }

    fn export_steps(&self, index: usize) -> Vec<Step> {
        let mut steps = vec![];
        let mut current = self.nodes[index];
        while let Some(step) = current.step {
            steps.push(step);
            current = self.nodes[current.parent];
        }
        steps.reverse();
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DECK_SIZE, TOTAL_COLUMNS};
    use crate::card::{Card, Dragon, Suit, stackable};

    #[test]
    fn test_solved_by_auto_play() {
        let mut columns = vec![vec![]; TOTAL_COLUMNS];
        columns[0] = vec![Card::suited(Suit::Red, 2), Card::suited(Suit::Green, 1)];
        let board = Board::from_columns(columns, [None; 3]).unwrap();

        let result = solve(board, MAX_ITERATIONS).unwrap();
        let solution = result.solution.unwrap();
        assert!(solution.steps.is_empty());
        assert!(solution.initial.is_solved());
        assert_eq!(solution.initial_passes, 1);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_solve_with_collapse() {
        let board = Board::parse("Column1: r2 R\nColumn2: R\nColumn3: R\nColumn4: R").unwrap();
        let result = solve(board, MAX_ITERATIONS).unwrap();
        let solution = result.solution.unwrap();
        assert_eq!(solution.actions(), [Action::CollapseDragons(Dragon::Red)]);
        assert_eq!(solution.steps[0].passes, 1);

        let boards = solution.boards().unwrap();
        let last = boards.last().unwrap();
        assert!(last.is_solved());
        assert_eq!(last.cells.iter().filter(|c| c.is_locked()).count(), 1);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_falls_back_to_cells() {
        const BOARD_STR: &str = r#"Column1: R r4 g2 r5
Column2: R
Column3: R
Column4: R
Column5: b2 b9
Column6: g9
Column7: g7
Column8: b5"#;

        let board = Board::parse(BOARD_STR).unwrap();
        let result = solve(board, MAX_ITERATIONS).unwrap();
        let solution = result.solution.unwrap();
        assert!(matches!(solution.steps[0].action, Action::ColumnToCell(..)));
        assert!(solution.boards().unwrap().last().unwrap().is_solved());
    }

    #[test]
    fn test_exhaustion_is_not_an_error() {
        let board = Board::parse("Column1: R\nColumn2: G").unwrap();
        let result = solve(board, MAX_ITERATIONS).unwrap();
        assert!(result.solution.is_none());
        assert!(result.iterations < MAX_ITERATIONS);
    }

    #[test]
    fn test_iteration_budget() {
        for seed in [7, 2024, 670334786] {
            let result = solve(Board::new_from_seed(seed), 50).unwrap();
            assert!(result.iterations <= 50);
            if let Some(solution) = result.solution {
                assert!(solution.boards().unwrap().last().unwrap().is_solved());
            }
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(solve(Board::new(), MAX_ITERATIONS).is_err());
        assert!(solve(Board::parse("Column1: r3 r3").unwrap(), MAX_ITERATIONS).is_err());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let result = Solver::new()
            .cancel_flag(flag)
            .solve(Board::new_from_seed(99))
            .unwrap();
        assert!(result.solution.is_none());
        assert_eq!(result.iterations, 0);
    }

    fn successors(board: &Board, lowest: &LowestRanks) -> Vec<(Action, Board)> {
        let mut possible_moves = PossibleMoves::new();
        column_actions(board, lowest, &mut possible_moves);
        cell_actions(board, &mut possible_moves);
        possible_moves
            .iter()
            .map(|&action| {
                let mut next = board.clone();
                apply_action(&mut next, &action);
                resolve(&mut next).unwrap();
                (action, next)
            })
            .collect()
    }

    #[test]
    fn test_conservation() {
        for seed in [3, 17, 4242] {
            let mut board = Board::new_from_seed(seed);
            let lowest = resolve(&mut board).unwrap().lowest;
            assert_eq!(board.remaining_cards() + board.cleared, DECK_SIZE);
            for (_, next) in successors(&board, &lowest) {
                assert_eq!(next.remaining_cards() + next.cleared, DECK_SIZE);
                let lowest = LowestRanks::compute(&next);
                for (_, next) in successors(&next, &lowest) {
                    assert_eq!(next.remaining_cards() + next.cleared, DECK_SIZE);
                }
            }
        }
    }

    #[test]
    fn test_run_transfers_are_stackable() {
        for seed in [5, 11, 31337, 670334786] {
            let mut board = Board::new_from_seed(seed);
            let lowest = resolve(&mut board).unwrap().lowest;
            let mut possible_moves = PossibleMoves::new();
            column_actions(&board, &lowest, &mut possible_moves);
            for action in &possible_moves {
                let Action::ColumnToColumn(from_idx, to_idx, count) = *action else {
                    continue;
                };
                let cards = &board.columns[from_idx].cards;
                let run = &cards[cards.len() - count..];
                assert!(run.windows(2).all(|pair| stackable(pair[1], pair[0])));
                match board.columns[to_idx].peek_top() {
                    Some(&top) => assert!(stackable(run[0], top)),
                    None => assert!(count < cards.len()),
                }
            }
        }
    }

    #[test]
    fn test_same_content_same_node() {
        let board = Board::parse("Column1: g2 b7\nColumn2: W r6\nColumn3: G").unwrap();

        let mut first = board.clone();
        apply_action(&mut first, &Action::ColumnToCell(0, 0));
        apply_action(&mut first, &Action::ColumnToCell(1, 1));
        resolve(&mut first).unwrap();

        let mut second = board.clone();
        apply_action(&mut second, &Action::ColumnToCell(1, 1));
        resolve(&mut second).unwrap();
        apply_action(&mut second, &Action::ColumnToCell(0, 0));
        resolve(&mut second).unwrap();

        assert_eq!(first.canonical_hash(), second.canonical_hash());

        second.foundations.open(Suit::Black);
        second.cleared += 5;
        assert_eq!(first.canonical_hash(), second.canonical_hash());
        assert_ne!(first.canonical_hash(), board.canonical_hash());
    }
}
