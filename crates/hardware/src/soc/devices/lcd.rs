//! Character LCD.
//!
//! A `width × height` grid of single-character cells (16×2 by default) with a
//! backlight flag. Writes are clipped per character: anything that would land
//! outside the grid is dropped, never reported as an error.

use serde::Serialize;

use crate::common::constants::LCD_BLANK;

/// Character LCD frame buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lcd {
    /// Columns per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Row-major cells; every row holds exactly `width` characters.
    pub buffer: Vec<Vec<char>>,
    /// Backlight state.
    pub backlight: bool,
}

impl Lcd {
    /// Creates a blank display.
    pub fn new(width: usize, height: usize, backlight: bool) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![LCD_BLANK; width]; height],
            backlight,
        }
    }

    /// Blanks every cell in place.
    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.clear();
            row.resize(self.width, LCD_BLANK);
        }
    }

    /// Writes `text` into `row` starting at column `col`.
    ///
    /// Characters are copied until the text ends or the row's right edge is
    /// reached; characters whose column is negative are skipped. Returns
    /// `true` if any cell changed; a missing `row` leaves the buffer untouched.
    pub fn print(&mut self, row: usize, col: i64, text: &str) -> bool {
        let width = self.width;
        let Some(cells) = self.buffer.get_mut(row) else {
            return false;
        };
        let mut changed = false;
        for (offset, ch) in text.chars().enumerate() {
            let target = col.saturating_add(offset as i64);
            if target < 0 {
                continue;
            }
            let Ok(target) = usize::try_from(target) else {
                break;
            };
            if target >= width {
                break;
            }
            changed |= cells[target] != ch;
            cells[target] = ch;
        }
        changed
    }

    /// Returns one row as a string, or `None` if the row does not exist.
    pub fn row_text(&self, row: usize) -> Option<String> {
        self.buffer.get(row).map(|cells| cells.iter().collect())
    }

    /// Returns every row as a string.
    pub fn lines(&self) -> Vec<String> {
        self.buffer.iter().map(|cells| cells.iter().collect()).collect()
    }

    /// Returns `true` if every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.buffer.iter().flatten().all(|&c| c == LCD_BLANK)
    }
}
