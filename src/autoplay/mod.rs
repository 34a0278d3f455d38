//! This module replays a solution on the game window using mouse drags and clicks.

mod window;

pub use self::window::{Point, Rect, Window};

use crate::{
    action::{Action, describe_action},
    board::Board,
    solver::Solution,
};

use anyhow::{Context, Result, bail};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::{thread::sleep, time::Duration};

/// Time the game spends animating one auto-play pass.
const PASS_DURATION_MS: u64 = 760;

pub fn autoplay(solution: &Solution, window: &Window, interval: u64) -> Result<()> {
    let mut enigo = Enigo::new(&Settings::default()).context("Failed to init enigo")?;
    let boards = solution.boards()?;

    sleep(wait_duration(interval, solution.initial_passes));

    let steps_count = solution.steps.len();
    for (index, (step, board)) in solution.steps.iter().zip(&boards).enumerate() {
        println!(
            "{:03}/{steps_count:03} {}",
            index + 1,
            describe_action(board, &step.action)
        );
        play_action(board, &step.action, &mut enigo, window)?;
        sleep(wait_duration(interval, step.passes));
    }
    Ok(())
}

fn wait_duration(interval: u64, passes: usize) -> Duration {
    Duration::from_millis(interval + PASS_DURATION_MS * passes as u64)
}

fn play_action(
    board: &Board,
    action: &Action,
    enigo: &mut impl Mouse,
    window: &Window,
) -> Result<()> {
    match *action {
        Action::ColumnToFoundation(column_index) => {
            let column = &board.columns[column_index];
            let Some(suit) = column.peek_top().and_then(|card| card.suit()) else {
                bail!("Column {} has no suited card to send home", column_index + 1);
            };
            let mut foundations = board.foundations.clone();
            foundations.open(suit);
            let Some(slot) = foundations.slot(suit) else {
                bail!("No foundation slot left for suit '{}'", suit.letter());
            };
            mouse_move(
                enigo,
                window.column_point(column_index, column.len() - 1),
                window.foundation_point(slot),
            )?;
        }
        Action::ColumnToColumn(from_index, to_index, count) => {
            let from_column = &board.columns[from_index];
            mouse_move(
                enigo,
                window.column_point(from_index, from_column.len() - count),
                window.column_point(to_index, board.columns[to_index].len()),
            )?;
        }
        Action::ColumnToCell(column_index, cell_index) => {
            let column = &board.columns[column_index];
            mouse_move(
                enigo,
                window.column_point(column_index, column.len() - 1),
                window.cell_point(cell_index),
            )?;
        }
        Action::CellToColumn(cell_index, column_index) => {
            mouse_move(
                enigo,
                window.cell_point(cell_index),
                window.column_point(column_index, board.columns[column_index].len()),
            )?;
        }
        Action::CollapseDragons(dragon) => {
            mouse_click(enigo, window.dragon_button_point(dragon))?;
        }
    }
    Ok(())
}

// The game ignores synthetic clicks, so a click is a press and a release.
fn mouse_click(enigo: &mut impl Mouse, point: Point) -> Result<()> {
    enigo.move_mouse(point.0, point.1, Coordinate::Abs)?;
    enigo.button(Button::Left, Direction::Press)?;
    sleep(Duration::from_millis(100));
    enigo.button(Button::Left, Direction::Release)?;
    sleep(Duration::from_millis(50));
    Ok(())
}

fn mouse_move(enigo: &mut impl Mouse, from_point: Point, to_point: Point) -> Result<()> {
    let (from_x, from_y) = from_point;
    let (to_x, to_y) = to_point;

    enigo.move_mouse(from_x, from_y, Coordinate::Abs)?;
    sleep(Duration::from_millis(50));
    enigo.button(Button::Left, Direction::Press)?;

    let steps = 20;
    let dx = (to_x - from_x) as f32 / steps as f32;
    let dy = (to_y - from_y) as f32 / steps as f32;
    for i in 1..=steps {
        let x = from_x as f32 + dx * i as f32;
        let y = from_y as f32 + dy * i as f32;
        enigo.move_mouse(x as i32, y as i32, Coordinate::Abs)?;
        sleep(Duration::from_millis(5));
    }

    enigo.button(Button::Left, Direction::Release)?;
    sleep(Duration::from_millis(50));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_duration() {
        assert_eq!(wait_duration(100, 0), Duration::from_millis(100));
        assert_eq!(wait_duration(100, 2), Duration::from_millis(1620));
    }
}
