//! Phonetic encoding of product names
//!
//! A Soundex-family code: the first ASCII letter of the name, uppercased,
//! followed by three digits describing the consonant sounds that follow it.
//!
//! # Character policy
//!
//! Only ASCII letters take part in encoding. Digits, punctuation, whitespace
//! and non-ASCII characters (including accented letters) are removed before
//! the anchor letter is chosen, so `"7 Up"` encodes like `"Up"` and `"Ñandú"`
//! like `"and"`. After the anchor, `h`, `w` and `y` have no sound class and
//! are skipped entirely: they neither emit a digit nor separate two equal
//! digits. A name with no ASCII letter at all encodes to the empty code.

use serde::Serialize;
use std::fmt;

/// Length of every non-empty code
pub const CODE_LEN: usize = 4;

/// Derived phonetic code for a name
///
/// Either empty (the name has no ASCII letters) or exactly four characters:
/// an uppercase letter followed by three digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PhoneticCode(String);

impl PhoneticCode {
    /// The code shared by every name without ASCII letters
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Accept a code produced elsewhere (e.g. by a database function)
    ///
    /// Returns `None` unless the text is empty or one ASCII letter followed
    /// by three ASCII digits. The letter is uppercased.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return Some(Self::empty());
        }

        let bytes = text.as_bytes();
        let well_formed = bytes.len() == CODE_LEN
            && bytes[0].is_ascii_alphabetic()
            && bytes[1..].iter().all(u8::is_ascii_digit);

        well_formed.then(|| Self(text.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PhoneticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sound class of a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundClass {
    /// a, e, i, o, u: emits nothing but breaks runs of equal digits
    Vowel,
    /// Consonant group, stored as its ASCII digit
    Digit(u8),
}

/// Classify a character; `None` means it has no class and is skipped
pub fn classify(c: char) -> Option<SoundClass> {
    match c.to_ascii_lowercase() {
        'a' | 'e' | 'i' | 'o' | 'u' => Some(SoundClass::Vowel),
        'b' | 'f' | 'p' | 'v' => Some(SoundClass::Digit(b'1')),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some(SoundClass::Digit(b'2')),
        'd' | 't' => Some(SoundClass::Digit(b'3')),
        'l' => Some(SoundClass::Digit(b'4')),
        'm' | 'n' => Some(SoundClass::Digit(b'5')),
        'r' => Some(SoundClass::Digit(b'6')),
        _ => None,
    }
}

/// Encode a name into its phonetic code. Never fails.
pub fn encode(name: &str) -> PhoneticCode {
    let mut letters = name
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase());

    let Some(anchor) = letters.next() else {
        return PhoneticCode::empty();
    };

    let mut code = String::with_capacity(CODE_LEN);
    code.push(anchor.to_ascii_uppercase());

    // The anchor's own class suppresses an identical first digit
    let mut previous = classify(anchor);
    for class in letters.filter_map(classify) {
        if Some(class) != previous {
            if let SoundClass::Digit(digit) = class {
                code.push(char::from(digit));
                if code.len() == CODE_LEN {
                    break;
                }
            }
        }
        previous = Some(class);
    }

    while code.len() < CODE_LEN {
        code.push('0');
    }

    PhoneticCode(code)
}
