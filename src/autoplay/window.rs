use crate::card::Dragon;

use anyhow::{Context, Result, bail};

const WINDOW_WIDTH: i32 = 1920;
const WINDOW_HEIGHT: i32 = 1080;
const COLUMN_LEFT_X: i32 = 460;
const COLUMN_TOP_Y: i32 = 464;
const COLUMN_OFFSET_X: i32 = 152;
const CARD_OFFSET_Y: i32 = 31;
const CELL_LEFT_X: i32 = 457;
const CELL_Y: i32 = 200;
const FOUNDATION_POINTS: [Point; 3] = [(1216, 234), (1370, 234), (1521, 234)];
const DRAGON_BUTTON_X: i32 = 888;

pub type Point = (i32, i32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Parses `LEFT,TOP,WIDTH,HEIGHT`.
    pub fn parse(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid window rectangle '{s}'"))?;
        let [left, top, width, height] = values[..] else {
            bail!("Expected LEFT,TOP,WIDTH,HEIGHT, got '{s}'");
        };
        if width <= 0 || height <= 0 {
            bail!("Window size must be positive, got {width}x{height}");
        }
        Ok(Rect {
            left,
            top,
            right: left + width,
            bottom: top + height,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Window {
    rect: Rect,
    factor_x: f32,
    factor_y: f32,
}

impl Window {
    pub fn new(rect: Rect) -> Self {
        let width = rect.right - rect.left;
        let height = rect.bottom - rect.top;
        let factor_x = width as f32 / WINDOW_WIDTH as f32;
        let factor_y = height as f32 / WINDOW_HEIGHT as f32;
        Window {
            rect,
            factor_x,
            factor_y,
        }
    }

    /// Point on the card at `row` (0 = bottom) of a column.
    pub fn column_point(&self, column_index: usize, row: usize) -> Point {
        self.transform(
            COLUMN_LEFT_X + column_index as i32 * COLUMN_OFFSET_X,
            COLUMN_TOP_Y + row as i32 * CARD_OFFSET_Y,
        )
    }

    pub fn cell_point(&self, cell_index: usize) -> Point {
        self.transform(CELL_LEFT_X + cell_index as i32 * COLUMN_OFFSET_X, CELL_Y)
    }

    pub fn foundation_point(&self, slot: usize) -> Point {
        let (x, y) = FOUNDATION_POINTS[slot];
        self.transform(x, y)
    }

    pub fn dragon_button_point(&self, dragon: Dragon) -> Point {
        let y = match dragon {
            Dragon::Red => 217,
            Dragon::Green => 303,
            Dragon::White => 385,
        };
        self.transform(DRAGON_BUTTON_X, y)
    }

    fn transform(&self, x: i32, y: i32) -> Point {
        (
            (x as f32 * self.factor_x) as i32 + self.rect.left,
            (y as f32 * self.factor_y) as i32 + self.rect.top,
        )
    }
}
