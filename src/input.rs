//! Editable text buffer for the requirement input.

use unicode_width::UnicodeWidthChar;

/// Text plus a cursor measured in characters (not bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    text: String,
    cursor: usize,
}

impl InputField {
    pub fn text(&self) -> &str {
        &self.text
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Insert a whole string at the cursor (used for paste).
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete_char_at(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Hard-wraps the text into rows of at most `width` columns and returns
    /// the rows together with the cursor's (column, row).
    ///
    /// Explicit newlines start a new row. Wide characters never straddle a row break.
    pub fn layout(&self, width: u16) -> (Vec<String>, (u16, u16)) {
        let width = width.max(1) as usize;
        let mut rows = vec![String::new()];
        let mut col = 0usize;
        let mut cursor_pos = None;

        for (i, c) in self.text.chars().enumerate() {
            let w = if c == '\n' { 0 } else { c.width().unwrap_or(0) };
            if c != '\n' && col + w > width {
                rows.push(String::new());
                col = 0;
            }
            if i == self.cursor {
                cursor_pos = Some((col, rows.len() - 1));
            }
            if c == '\n' {
                rows.push(String::new());
                col = 0;
            } else if let Some(row) = rows.last_mut() {
                row.push(c);
                col += w;
            }
        }

        let (cx, cy) = cursor_pos.unwrap_or_else(|| {
            if col >= width {
                (0, rows.len())
            } else {
                (col, rows.len() - 1)
            }
        });
        let to_u16 = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
        (rows, (to_u16(cx), to_u16(cy)))
    }
}

#[cfg(test)]
impl InputField {
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
