use crate::card::{Card, DRAGON_COPIES, Dragon, MAX_RANK, Suit, TOTAL_DRAGONS, TOTAL_SUITS, stackable};

use anyhow::{Context, Result, bail};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

pub const TOTAL_COLUMNS: usize = 8;
pub const TOTAL_CELLS: usize = 3;
pub const TOTAL_FOUNDATIONS: usize = 3;
pub const DECK_SIZE: usize = TOTAL_SUITS * MAX_RANK as usize + TOTAL_DRAGONS * DRAGON_COPIES + 1;
const COLUMN_SIZE: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub columns: [Column; TOTAL_COLUMNS],
    pub cells: [FreeCell; TOTAL_CELLS],
    pub foundations: Foundations,
    /// Cards taken out of play so far, whether discarded, sent home or collapsed.
    pub cleared: usize,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(
        columns: Vec<Vec<Card>>,
        foundations: [Option<u8>; TOTAL_FOUNDATIONS],
    ) -> Result<Self> {
        if columns.len() != TOTAL_COLUMNS {
            bail!(
                "Expected {TOTAL_COLUMNS} columns, got {}",
                columns.len()
            );
        }
        let mut board = Board::new();
        for (column, cards) in board.columns.iter_mut().zip(columns) {
            *column = Column::new(cards);
        }
        board.foundations = Foundations::new(foundations)?;
        Ok(board)
    }

    /// Shuffles a full deck with the Park-Miller generator and deals five cards per column.
    pub fn new_from_seed(seed: u32) -> Self {
        let mut current_seed = (seed as u64 % 0x7fff_fffe) as u32 + 1;
        let mut rnd = || {
            current_seed = ((current_seed as u64 * 16807) % 0x7fffffff) as u32;
            current_seed
        };

        let mut deck: Vec<Card> = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            deck.extend((1..=MAX_RANK).map(|rank| Card::suited(suit, rank)));
        }
        for dragon in Dragon::ALL {
            deck.extend(std::iter::repeat_n(Card::Dragon(dragon), DRAGON_COPIES));
        }
        deck.push(Card::Flower);

        for _ in 0..7 {
            for j in 0..DECK_SIZE {
                let k = (rnd() as usize) % DECK_SIZE;
                deck.swap(j, k);
            }
        }

        let mut board = Board::new();
        let per_column = DECK_SIZE / TOTAL_COLUMNS;
        for (column, chunk) in board.columns.iter_mut().zip(deck.chunks(per_column)) {
            column.cards.extend_from_slice(chunk);
        }
        board
    }

    /// Cards still on the table, in columns or held by free cells.
    pub fn remaining_cards(&self) -> usize {
        let in_columns: usize = self.columns.iter().map(Column::len).sum();
        let in_cells = self.cells.iter().filter(|c| c.card().is_some()).count();
        in_columns + in_cells
    }

    pub fn is_solved(&self) -> bool {
        self.remaining_cards() == 0
    }

    /// Content-only fingerprint: columns and free cells, ignoring foundations and counters.
    pub fn canonical_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.columns.hash(&mut hasher);
        self.cells.hash(&mut hasher);
        hasher.finish()
    }

    pub fn validate(&self) -> Result<()> {
        let mut suited = [[false; MAX_RANK as usize]; TOTAL_SUITS];
        let mut dragons = [0usize; TOTAL_DRAGONS];
        let mut flowers = 0;
        let mut count = 0;

        let cards = self
            .columns
            .iter()
            .flat_map(|column| column.cards.iter())
            .chain(self.cells.iter().filter_map(FreeCell::card));
        for card in cards {
            count += 1;
            match *card {
                Card::Suited(suit, rank) => {
                    if rank == 0 || rank > MAX_RANK {
                        bail!("Invalid rank in card {}", card.pretty_print());
                    }
                    let seen = &mut suited[suit.index()][rank as usize - 1];
                    if *seen {
                        bail!("Duplicate card {}", card.pretty_print());
                    }
                    *seen = true;
                }
                Card::Dragon(dragon) => {
                    dragons[dragon.index()] += 1;
                    if dragons[dragon.index()] > DRAGON_COPIES {
                        bail!("More than {DRAGON_COPIES} copies of dragon {}", dragon.letter());
                    }
                }
                Card::Flower => {
                    flowers += 1;
                    if flowers > 1 {
                        bail!("More than one flower");
                    }
                }
            }
        }

        if count == 0 {
            bail!("The board has no cards");
        }
        Ok(())
    }

    pub fn move_column_to_foundation(&mut self, idx: usize) {
        let card = self.columns[idx].pop_unchecked();
        let suit = card.suit().expect("Only suited cards go to a foundation");
        self.foundations.open(suit);
        self.cleared += 1;
    }

    pub fn move_column_to_column(&mut self, from_idx: usize, to_idx: usize, count: usize) {
        let cards = self.columns[from_idx].drain_unchecked(count);
        self.columns[to_idx].cards.extend(cards);
    }

    pub fn move_column_to_cell(&mut self, column_idx: usize, cell_idx: usize) {
        assert!(
            self.cells[cell_idx].is_empty(),
            "Free cell {cell_idx} is not available"
        );
        let card = self.columns[column_idx].pop_unchecked();
        self.cells[cell_idx] = FreeCell::Holding(card);
    }

    pub fn move_cell_to_column(&mut self, cell_idx: usize, column_idx: usize) {
        let card = self.cells[cell_idx]
            .take()
            .expect("Free cell must hold a card");
        self.columns[column_idx].push(card);
    }

    /// Removes every exposed copy of `dragon` and locks one free cell.
    pub fn collapse_dragons(&mut self, dragon: Dragon) {
        let target = Card::Dragon(dragon);
        for column in self.columns.iter_mut() {
            if column.peek_top() == Some(&target) {
                column.pop_unchecked();
                self.cleared += 1;
            }
        }
        for cell in self.cells.iter_mut() {
            if cell.card() == Some(&target) {
                *cell = FreeCell::Empty;
                self.cleared += 1;
            }
        }
        let cell = self
            .cells
            .iter_mut()
            .find(|cell| cell.is_empty())
            .expect("Dragon collapse needs a free cell");
        *cell = FreeCell::Locked;
    }

    /// Takes the exposed card of a column out of play.
    pub fn discard_column_top(&mut self, idx: usize) -> Card {
        let card = self.columns[idx].pop_unchecked();
        if let Some(suit) = card.suit() {
            self.foundations.open(suit);
        }
        self.cleared += 1;
        card
    }

    /// Takes the card of a free cell out of play.
    pub fn discard_cell(&mut self, idx: usize) -> Card {
        let card = self.cells[idx].take().expect("Free cell must hold a card");
        if let Some(suit) = card.suit() {
            self.foundations.open(suit);
        }
        self.cleared += 1;
        card
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut board = Board::new();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Failed to parse at '{line}'");
            if let Some(rest) = line.strip_prefix("Column") {
                let mut parts = rest.splitn(2, ':');
                let idx = parts
                    .next()
                    .unwrap_or("")
                    .trim()
                    .parse::<usize>()
                    .context("Invalid column index")
                    .with_context(line_context)?;
                if !(1..=TOTAL_COLUMNS).contains(&idx) {
                    bail!("Column index {idx} out of range; {}", line_context());
                }
                let cards = Self::parse_cards(parts.next().unwrap_or("")).with_context(line_context)?;
                board.columns[idx - 1] = Column::new(cards);
            } else if let Some(rest) = line.strip_prefix("Cells:") {
                let tokens: Vec<_> = rest.split_whitespace().collect();
                if tokens.len() != TOTAL_CELLS {
                    bail!("Expected {TOTAL_CELLS} free cells; {}", line_context());
                }
                for (cell, token) in board.cells.iter_mut().zip(tokens) {
                    *cell = match token {
                        "_" => FreeCell::Empty,
                        "X" => FreeCell::Locked,
                        _ => FreeCell::Holding(Card::parse(token).with_context(line_context)?),
                    };
                }
            } else if let Some(rest) = line.strip_prefix("Foundations:") {
                let tokens: Vec<_> = rest.split_whitespace().collect();
                if tokens.len() != TOTAL_FOUNDATIONS {
                    bail!("Expected {TOTAL_FOUNDATIONS} foundations; {}", line_context());
                }
                let mut opened = [None; TOTAL_SUITS];
                for (slot, token) in tokens.into_iter().enumerate() {
                    if token == "_" {
                        continue;
                    }
                    let suit = token
                        .chars()
                        .next()
                        .filter(|_| token.len() == 1)
                        .and_then(Suit::from_letter)
                        .with_context(|| format!("Invalid suit '{token}'"))
                        .with_context(line_context)?;
                    if opened[suit.index()].is_some() {
                        bail!("Suit '{token}' listed twice; {}", line_context());
                    }
                    opened[suit.index()] = Some(slot as u8);
                }
                board.foundations = Foundations::new(opened).with_context(line_context)?;
            } else {
                bail!("Unknown line '{line}'");
            }
        }

        Ok(board)
    }

    fn parse_cards(s: &str) -> Result<Vec<Card>> {
        s.split_whitespace().map(Card::parse).collect()
    }

    pub fn pretty_print(&self) -> String {
        let mut lines = vec![];

        for (i, column) in self.columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let cards: Vec<_> = column.cards.iter().map(Card::pretty_print).collect();
            lines.push(format!("Column{}: {}", i + 1, cards.join(" ")));
        }

        if self.cells.iter().any(|cell| !cell.is_empty()) {
            let cells: Vec<_> = self.cells.iter().map(FreeCell::pretty_print).collect();
            lines.push(format!("Cells: {}", cells.join(" ")));
        }

        if self.foundations.opened_count() > 0 {
            let mut slots = ["_"; TOTAL_FOUNDATIONS].map(String::from);
            for suit in Suit::ALL {
                if let Some(slot) = self.foundations.slot(suit) {
                    slots[slot] = suit.letter().to_string();
                }
            }
            lines.push(format!("Foundations: {}", slots.join(" ")));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Column {
    pub cards: SmallVec<[Card; COLUMN_SIZE]>,
}

impl Column {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.cards.last()
    }

    /// Length of the longest stackable run ending at the exposed card.
    pub fn run_len(&self) -> usize {
        if self.cards.is_empty() {
            return 0;
        }
        1 + self
            .cards
            .windows(2)
            .rev()
            .take_while(|pair| stackable(pair[1], pair[0]))
            .count()
    }

    pub fn pop_unchecked(&mut self) -> Card {
        self.cards.pop().expect("Column must not be empty")
    }

    pub fn drain_unchecked(&mut self, count: usize) -> SmallVec<[Card; COLUMN_SIZE]> {
        let len = self.cards.len();
        assert!(count <= len, "Cannot take {count} cards from a column of {len}");
        self.cards.drain(len - count..).collect()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FreeCell {
    #[default]
    Empty,
    Holding(Card),
    /// Spent by a dragon collapse; never holds a card again.
    Locked,
}

impl FreeCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, FreeCell::Empty)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, FreeCell::Locked)
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            FreeCell::Holding(card) => Some(card),
            _ => None,
        }
    }

    pub fn take(&mut self) -> Option<Card> {
        match *self {
            FreeCell::Holding(card) => {
                *self = FreeCell::Empty;
                Some(card)
            }
            _ => None,
        }
    }

    pub fn pretty_print(&self) -> String {
        match self {
            FreeCell::Empty => "_".to_string(),
            FreeCell::Locked => "X".to_string(),
            FreeCell::Holding(card) => card.pretty_print(),
        }
    }
}

/// Which on-screen foundation slot each suit was given when it first opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Foundations([Option<u8>; TOTAL_SUITS]);

impl Foundations {
    pub fn new(opened: [Option<u8>; TOTAL_SUITS]) -> Result<Self> {
        let mut used = [false; TOTAL_FOUNDATIONS];
        for slot in opened.iter().flatten() {
            let slot = *slot as usize;
            if slot >= TOTAL_FOUNDATIONS {
                bail!("Foundation slot {slot} out of range");
            }
            if used[slot] {
                bail!("Foundation slot {slot} assigned twice");
            }
            used[slot] = true;
        }
        Ok(Self(opened))
    }

    pub fn slot(&self, suit: Suit) -> Option<usize> {
        self.0[suit.index()].map(|slot| slot as usize)
    }

    pub fn opened_count(&self) -> usize {
        self.0.iter().flatten().count()
    }

    /// Gives `suit` the lowest free slot unless it already has one.
    pub fn open(&mut self, suit: Suit) {
        if self.0[suit.index()].is_some() {
            return;
        }
        let free = (0..TOTAL_FOUNDATIONS as u8).find(|slot| !self.0.contains(&Some(*slot)));
        self.0[suit.index()] = free;
    }
}
