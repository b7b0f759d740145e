//! Position-tracking reader over one source file.

/// Reads characters from a source file, keeping the byte offset, line and
/// column of the next unread character.
///
/// Columns are 1-based and count bytes, so a multi-byte character moves the
/// column by its encoded length. This is how [`atypical_core::Span`]s are
/// rendered.
pub struct Cursor<'src> {
    source: &'src str,
    /// Unread suffix of `source`.
    rest: &'src str,
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Next character, not consumed.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        match self.rest.as_bytes().first() {
            Some(&byte) if byte.is_ascii() => Some(char::from(byte)),
            Some(_) => self.rest.chars().next(),
            None => None,
        }
    }

    /// The character after [`peek`](Self::peek). Used to tell `1.5` from a
    /// member access on `1`.
    #[inline]
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest.chars();
        chars.next()?;
        chars.next()
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume one character.
    ///
    /// A newline moves to column 1 of the next line; anything else moves the
    /// column by its UTF-8 length.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        let matched = self.peek() == Some(ch);
        if matched {
            self.advance();
        }
        matched
    }

    /// Consume the longest run of characters satisfying `f`.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset;
        while self.check(&f) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Text from byte offset `start` up to the cursor.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Identifiers are ASCII: a letter or `_`, then letters, digits or `_`.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_reset_the_column() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
        assert_eq!(cursor.offset(), 3);
    }

    #[test]
    fn eat_while_returns_the_run() {
        let mut cursor = Cursor::new("count1;");
        assert_eq!(cursor.eat_while(is_ident_continue), "count1");
        assert!(!cursor.eat(','));
        assert!(cursor.eat(';'));
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn multibyte_characters_advance_by_their_length() {
        let mut cursor = Cursor::new("é;");
        assert_eq!(cursor.peek(), Some('é'));
        cursor.advance();
        assert_eq!((cursor.offset(), cursor.column()), (2, 3));
        assert_eq!(cursor.peek(), Some(';'));
    }

    #[test]
    fn second_character_lookahead() {
        let mut cursor = Cursor::new("1.5");
        cursor.advance();
        assert_eq!(cursor.peek_second(), Some('5'));
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.peek_second(), None);
        assert_eq!(cursor.slice_from(0), "1.5");
    }
}
