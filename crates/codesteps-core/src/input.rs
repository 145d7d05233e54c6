//! Input adapters for the tile arranger.
//!
//! Adapters translate pointer drags, key presses and per-tile step buttons
//! into [`TileArranger`] calls. They never touch the tile sequence directly.

use std::str::FromStr;

use crate::arranger::TileArranger;

/// Tracks one pointer drag across tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragAdapter {
    source: Option<usize>,
    target: Option<usize>,
}

impl DragAdapter {
    /// Creates an idle adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            source: None,
            target: None,
        }
    }

    /// Starts dragging the tile at `idx` and selects it.
    pub fn start(&mut self, arranger: &mut TileArranger, idx: usize) {
        self.source = Some(idx);
        self.target = None;
        arranger.select(idx);
    }

    /// Records `idx` as the hovered drop target. Ignored when not dragging.
    pub fn enter(&mut self, idx: usize) {
        if self.source.is_some() {
            self.target = Some(idx);
        }
    }

    /// Drops the dragged tile onto `idx`. Returns `true` if tiles moved.
    ///
    /// A drop without a started drag does nothing.
    pub fn drop_on(&mut self, arranger: &mut TileArranger, idx: usize) -> bool {
        let from = self.source.take();
        self.target = None;
        from.is_some_and(|from| arranger.move_tile(from, idx))
    }

    /// Cancels the drag.
    pub fn end(&mut self) {
        self.source = None;
        self.target = None;
    }

    /// Index being dragged.
    #[must_use]
    pub const fn source(&self) -> Option<usize> {
        self.source
    }

    /// Index currently hovered as a drop target.
    #[must_use]
    pub const fn target(&self) -> Option<usize> {
        self.target
    }

    /// Returns `true` while a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.source.is_some()
    }
}

/// Keys understood by the puzzle board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Select the previous tile.
    Up,
    /// Select the next tile.
    Down,
    /// Move the selected tile left.
    Left,
    /// Move the selected tile right.
    Right,
    /// Check the arrangement.
    Enter,
    /// Clear the selection.
    Escape,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "arrowup" | "k" => Ok(Self::Up),
            "down" | "arrowdown" | "j" => Ok(Self::Down),
            "left" | "arrowleft" | "h" => Ok(Self::Left),
            "right" | "arrowright" | "l" => Ok(Self::Right),
            "enter" | "check" => Ok(Self::Enter),
            "esc" | "escape" => Ok(Self::Escape),
            other => Err(format!("unknown key '{other}'")),
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing happened.
    Ignored,
    /// The selection moved to this index.
    Selected(usize),
    /// The selection was cleared.
    Deselected,
    /// A tile moved.
    Moved {
        /// Former index.
        from: usize,
        /// New index, now active.
        to: usize,
    },
    /// The learner asked for the arrangement to be checked.
    CheckRequested,
}

/// Keyboard navigation over the board.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardAdapter;

impl KeyboardAdapter {
    /// Applies one key press.
    pub fn handle(arranger: &mut TileArranger, key: Key) -> KeyOutcome {
        if arranger.is_empty() {
            return KeyOutcome::Ignored;
        }

        match key {
            Key::Enter => return KeyOutcome::CheckRequested,
            Key::Escape => {
                arranger.deselect();
                return KeyOutcome::Deselected;
            }
            _ => {}
        }

        let Some(selected) = arranger.active() else {
            return match key {
                Key::Up | Key::Down => {
                    arranger.select(0);
                    KeyOutcome::Selected(0)
                }
                _ => KeyOutcome::Ignored,
            };
        };

        let last = arranger.len() - 1;
        match key {
            Key::Up if selected > 0 => {
                arranger.select(selected - 1);
                KeyOutcome::Selected(selected - 1)
            }
            Key::Down if selected < last => {
                arranger.select(selected + 1);
                KeyOutcome::Selected(selected + 1)
            }
            Key::Left if arranger.step_left(selected) => KeyOutcome::Moved {
                from: selected,
                to: selected - 1,
            },
            Key::Right if arranger.step_right(selected) => KeyOutcome::Moved {
                from: selected,
                to: selected + 1,
            },
            _ => KeyOutcome::Ignored,
        }
    }
}

/// The per-tile left/right buttons.
///
/// Pressing one steps the tile, then selects the neighbour in that direction
/// (clamped to the board) so focus follows the tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepButtons;

impl StepButtons {
    /// Presses the left button of tile `idx`. Returns `true` if tiles moved.
    pub fn left(arranger: &mut TileArranger, idx: usize) -> bool {
        if idx >= arranger.len() {
            return false;
        }
        let moved = arranger.step_left(idx);
        arranger.select(idx.saturating_sub(1));
        moved
    }

    /// Presses the right button of tile `idx`. Returns `true` if tiles moved.
    pub fn right(arranger: &mut TileArranger, idx: usize) -> bool {
        let len = arranger.len();
        if idx >= len {
            return false;
        }
        let moved = arranger.step_right(idx);
        arranger.select((idx + 1).min(len - 1));
        moved
    }
}
