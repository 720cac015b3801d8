//! Text <-> Morse codec
//!
//! Textual Morse uses `.` and `-` for elements, a single space between
//! letters and `/` as the word separator token.

use heapless::String;

/// Token standing in for a space between words
pub const WORD_SEPARATOR: &str = "/";

/// Delimiter between the patterns of consecutive symbols
pub const LETTER_SEPARATOR: char = ' ';

/// Number of letters (A-Z) at the head of the table
pub const LETTER_COUNT: usize = 26;

/// Longest text line the trainer accepts
pub const MAX_TEXT_LEN: usize = 64;

/// Capacity of an encoded pattern: five elements plus a separator per symbol
pub const MAX_PATTERN_LEN: usize = MAX_TEXT_LEN * 6;

/// Owned Morse pattern in textual form
pub type MorseString = String<MAX_PATTERN_LEN>;

// Letters first so a letter index is also a table index.
const MORSE_TABLE: [(char, &str); 37] = [
    ('A', ".-"), ('B', "-..."), ('C', "-.-."), ('D', "-.."), ('E', "."),
    ('F', "..-."), ('G', "--."), ('H', "...."), ('I', ".."), ('J', ".---"),
    ('K', "-.-"), ('L', ".-.."), ('M', "--"), ('N', "-."), ('O', "---"),
    ('P', ".--."), ('Q', "--.-"), ('R', ".-."), ('S', "..."), ('T', "-"),
    ('U', "..-"), ('V', "...-"), ('W', ".--"), ('X', "-..-"), ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"), ('1', ".----"), ('2', "..---"), ('3', "...--"), ('4', "....-"),
    ('5', "....."), ('6', "-...."), ('7', "--..."), ('8', "---.."), ('9', "----."),
    (' ', WORD_SEPARATOR),
];

/// One of the 37 encodable symbols: A-Z, 0-9 and space
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Symbol(u8);

impl Symbol {
    /// Number of defined symbols
    pub const COUNT: usize = MORSE_TABLE.len();

    /// Look up a character, case-insensitively
    pub fn from_char(c: char) -> Option<Symbol> {
        let upper = c.to_ascii_uppercase();
        MORSE_TABLE
            .iter()
            .position(|(ch, _)| *ch == upper)
            .map(|index| Symbol(index as u8))
    }

    /// The letter at `index` in A-Z
    pub const fn letter(index: usize) -> Option<Symbol> {
        if index < LETTER_COUNT {
            Some(Symbol(index as u8))
        } else {
            None
        }
    }

    /// The letter at `index` reduced modulo 26
    pub const fn letter_wrapping(index: usize) -> Symbol {
        Symbol((index % LETTER_COUNT) as u8)
    }

    /// Iterate every defined symbol in table order
    pub fn all() -> impl Iterator<Item = Symbol> {
        (0..Self::COUNT as u8).map(Symbol)
    }

    pub const fn as_char(&self) -> char {
        MORSE_TABLE[self.0 as usize].0
    }

    /// Morse pattern, or the word separator token for space
    pub const fn pattern(&self) -> &'static str {
        MORSE_TABLE[self.0 as usize].1
    }

    pub const fn is_letter(&self) -> bool {
        (self.0 as usize) < LETTER_COUNT
    }
}

/// Codec errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Encoded output does not fit in `MAX_PATTERN_LEN`
    PatternTooLong,
}

#[cfg(feature = "std")]
impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::PatternTooLong => write!(f, "Encoded pattern exceeds {} bytes", MAX_PATTERN_LEN),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// Result of encoding a text line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoded {
    /// Patterns of the recognized characters, one space apart
    pub pattern: MorseString,
    /// Characters with no symbol, dropped from the pattern
    pub skipped: usize,
}

impl Encoded {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

/// Encode text to Morse.
///
/// Characters outside the symbol table are dropped and counted in
/// `Encoded::skipped`; they never produce an error.
pub fn encode(text: &str) -> Result<Encoded, CodecError> {
    let mut pattern = MorseString::new();
    let mut skipped = 0;

    for c in text.chars() {
        let Some(symbol) = Symbol::from_char(c) else {
            skipped += 1;
            continue;
        };

        if !pattern.is_empty() {
            pattern
                .push(LETTER_SEPARATOR)
                .map_err(|_| CodecError::PatternTooLong)?;
        }
        pattern
            .push_str(symbol.pattern())
            .map_err(|_| CodecError::PatternTooLong)?;
    }

    #[cfg(feature = "defmt")]
    if skipped > 0 {
        defmt::warn!("⚠️ Encode dropped {} unrecognized chars", skipped);
    }

    Ok(Encoded { pattern, skipped })
}

/// Decode a single symbol's pattern.
///
/// Leading and trailing whitespace is ignored; the rest must equal one
/// symbol's pattern exactly. Multi-letter input never matches.
pub fn decode(pattern: &str) -> Option<Symbol> {
    let trimmed = pattern.trim();
    Symbol::all().find(|symbol| symbol.pattern() == trimmed)
}

/// Returns true if every character is `.`, `-` or a space
pub fn is_valid_morse_text(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '.' | '-' | ' '))
}
