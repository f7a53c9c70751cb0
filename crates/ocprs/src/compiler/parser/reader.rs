// Character source for the parser.
// Tracks line/column and lets the parser hand back the last character it read.

pub struct Reader {
    chars: Vec<char>,
    pos: usize,
}

/// Line and column of a character, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Reader {
    pub fn new(text: &str) -> Self {
        Reader {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_char(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// Read one character
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.pos += 1;
        Some(ch)
    }

    /// Un-read the character returned by the last `next_char`
    pub fn push_back(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos = self.pos.saturating_sub(1);
    }

    pub fn bump(&mut self) {
        if !self.is_eof() {
            self.pos += 1;
        }
    }

    /// Consume `ch` if it is next
    pub fn eat(&mut self, ch: char) -> bool {
        if self.current_char() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_while(&mut self, func: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if !func(ch) {
                break;
            }
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skip whitespace and `%` comments
    pub fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.current_char() == Some('%') {
                self.eat_while(|ch| ch != '\n');
            } else {
                break;
            }
        }
    }

    /// Skip past the next `;` (or to end of input) after a syntax error
    pub fn recover_to_semicolon(&mut self) {
        self.eat_while(|ch| ch != ';');
        self.bump();
    }

    /// Characters `[start, current)` as a string
    pub fn slice_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Location of the character at `offset`
    pub fn location_of(&self, offset: usize) -> Location {
        let mut line = 1;
        let mut column = 1;
        for &ch in self.chars.iter().take(offset) {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Location { line, column }
    }

    /// Location of the next unread character
    pub fn location(&self) -> Location {
        self.location_of(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_tracks_lines() {
        let mut reader = Reader::new("ab\ncd");
        reader.eat_while(|ch| ch != 'd');
        assert_eq!(reader.location(), Location { line: 2, column: 2 });
    }

    #[test]
    fn test_push_back_rereads() {
        let mut reader = Reader::new("xy");
        assert_eq!(reader.next_char(), Some('x'));
        reader.push_back();
        assert_eq!(reader.next_char(), Some('x'));
        assert_eq!(reader.next_char(), Some('y'));
        assert_eq!(reader.next_char(), None);
    }

    #[test]
    fn test_skip_trivia_skips_comments() {
        let mut reader = Reader::new("  % note\n  \"a\"");
        reader.skip_trivia();
        assert_eq!(reader.current_char(), Some('"'));
    }
}
