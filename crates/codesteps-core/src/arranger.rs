//! Working order of a fragment puzzle.
//!
//! [`TileArranger`] owns the current tile sequence and an optional active
//! (selected) index. Every reordering goes through [`TileArranger::move_tile`];
//! drag and keyboard input are translated into it by the adapters in
//! [`crate::input`].

use rand::Rng;

use crate::puzzle;

/// Shuffles `items` in place with Fisher–Yates.
///
/// Every permutation is equally likely given a uniform `rng`.
pub fn shuffle_fragments<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Interactive fragment ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileArranger {
    /// Fragments as authored; reshuffles start from here.
    source: Vec<String>,
    tiles: Vec<String>,
    active: Option<usize>,
}

impl TileArranger {
    /// Creates an arranger holding a random permutation of `parts`.
    pub fn new<R: Rng + ?Sized>(parts: &[String], rng: &mut R) -> Self {
        let mut arranger = Self::in_order(parts.to_vec());
        arranger.shuffle(rng);
        arranger
    }

    /// Creates an arranger that keeps `parts` in the given order.
    #[must_use]
    pub fn in_order(parts: Vec<String>) -> Self {
        Self {
            source: parts.clone(),
            tiles: parts,
            active: None,
        }
    }

    /// Replaces the working order with a fresh permutation of the authored
    /// fragments and clears the selection.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut tiles = self.source.clone();
        shuffle_fragments(&mut tiles, rng);
        self.tiles = tiles;
        self.active = None;
    }

    /// Moves the tile at `from` so that it ends up at `to`.
    ///
    /// No-op (returns `false`) when `from == to` or either index is outside
    /// the sequence. A real move makes `to` the active index.
    pub fn move_tile(&mut self, from: usize, to: usize) -> bool {
        let len = self.tiles.len();
        if from == to || from >= len || to >= len {
            return false;
        }

        let tile = self.tiles.remove(from);
        self.tiles.insert(to, tile);
        self.active = Some(to);
        true
    }

    /// Moves the tile at `idx` one position left. No-op at the left end.
    pub fn step_left(&mut self, idx: usize) -> bool {
        idx.checked_sub(1).is_some_and(|to| self.move_tile(idx, to))
    }

    /// Moves the tile at `idx` one position right. No-op at the right end.
    pub fn step_right(&mut self, idx: usize) -> bool {
        idx.checked_add(1).is_some_and(|to| self.move_tile(idx, to))
    }

    /// Makes `idx` the active tile. Out-of-range indices are ignored.
    pub fn select(&mut self, idx: usize) -> bool {
        if idx >= self.tiles.len() {
            return false;
        }
        self.active = Some(idx);
        true
    }

    /// Clears the active tile.
    pub fn deselect(&mut self) {
        self.active = None;
    }

    /// Current tile order.
    #[must_use]
    pub fn tiles(&self) -> &[String] {
        &self.tiles
    }

    /// Active tile index, if any.
    #[must_use]
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns `true` if there are no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Concatenation of the tiles in their current order.
    #[must_use]
    pub fn assembled(&self) -> String {
        self.tiles.concat()
    }

    /// Checks the current order against `canonical_answer`.
    #[must_use]
    pub fn check(&self, canonical_answer: &str) -> bool {
        puzzle::check(&self.tiles, canonical_answer)
    }
}
