//! Hierarchical card label ordering.
//!
//! Zettelkasten cards are numbered with mixed numeric/letter labels such as
//! `1-5A1c3`, where every position descends one level into the branch of the
//! card before it. Sorting those labels as plain strings scrambles the
//! archive (`1-10` before `1-9`, `1-5A` before `1-5a`), so this module maps
//! each label to a [`TokenSequence`] whose `Ord` is the archive order:
//!
//! - numbers compare by value, letters by character code;
//! - at the same position a number sorts before a lowercase letter, which
//!   sorts before an uppercase letter;
//! - a label that is a strict prefix of another sorts first.
//!
//! # Example
//!
//! ```
//! use zettel_harvester::label::order;
//!
//! let keys = vec!["ZK_1_NB_1-5A1c_V", "ZK_1_NB_1-5_V", "ZK_1_NB_1-5A_V"];
//! assert_eq!(
//!     order(keys),
//!     vec!["ZK_1_NB_1-5_V", "ZK_1_NB_1-5A_V", "ZK_1_NB_1-5A1c_V"]
//! );
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Leading marker of card identifiers in the first Zettelkasten.
pub const CARD_PREFIX: &str = "ZK_1_NB_";

/// Trailing marker of card identifiers (the recto side, "Vorderseite").
pub const CARD_SUFFIX: &str = "_V";

/// Prefix and suffix surrounding the label inside an opaque key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPattern {
    /// Stripped from the start of the final path segment, if present.
    pub prefix: String,

    /// Stripped from the end of the final path segment, if present.
    pub suffix: String,
}

impl Default for LabelPattern {
    fn default() -> Self {
        Self::new(CARD_PREFIX, CARD_SUFFIX)
    }
}

impl LabelPattern {
    /// Create a pattern from a prefix and suffix.
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Extract the raw label from a URL or filename.
    ///
    /// Takes the final `/`-separated segment, then strips the suffix and the
    /// prefix when present. Keys without the markers come back unchanged.
    ///
    /// # Examples
    /// ```
    /// use zettel_harvester::label::LabelPattern;
    ///
    /// let pattern = LabelPattern::default();
    /// assert_eq!(
    ///     pattern.extract("https://niklas-luhmann-archiv.de/bestand/zettelkasten/zettel/ZK_1_NB_1-5A1c_V"),
    ///     "1-5A1c"
    /// );
    /// assert_eq!(pattern.extract("no-markers"), "no-markers");
    /// ```
    #[must_use]
    pub fn extract<'a>(&self, key: &'a str) -> &'a str {
        let segment = key.rsplit('/').next().unwrap_or(key);
        let segment = segment
            .strip_suffix(self.suffix.as_str())
            .unwrap_or(segment);
        segment
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(segment)
    }
}

/// Extract the raw label from a key using the archive's card markers.
///
/// # Examples
/// ```
/// use zettel_harvester::label::extract_label;
///
/// assert_eq!(extract_label("ZK_1_NB_1-5A1c_V"), "1-5A1c");
/// ```
#[must_use]
pub fn extract_label(key: &str) -> String {
    LabelPattern::default().extract(key).to_string()
}

/// One typed unit of a card label.
///
/// Variant order is the type rank: numbers before lowercase letters before
/// uppercase letters. The derived `Ord` compares the rank first and the
/// value second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// A maximal run of ASCII digits, by value.
    Number(u64),

    /// A single lowercase ASCII letter.
    LowerLetter(char),

    /// A single uppercase ASCII letter.
    UpperLetter(char),
}

impl Token {
    /// Precedence class used between tokens of different kinds.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::LowerLetter(_) => 1,
            Self::UpperLetter(_) => 2,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::LowerLetter(c) | Self::UpperLetter(c) => write!(f, "{c}"),
        }
    }
}

/// Ordered decomposition of a label, used as a sort key.
///
/// Compares position by position; a strict prefix sorts first and the empty
/// sequence sorts before everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenSequence(Vec<Token>);

impl TokenSequence {
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Token>> for TokenSequence {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

impl fmt::Display for TokenSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Split a raw label into tokens.
///
/// Digit runs become [`Token::Number`], each ASCII letter becomes its own
/// letter token. Hyphens separate tokens without producing one, so `1-5`
/// is `[1, 5]` while `15` is `[15]`. Every other character, non-ASCII
/// digits and letters included, is dropped and also ends a digit run. Digit
/// runs too large for `u64` saturate.
///
/// # Examples
/// ```
/// use zettel_harvester::label::{tokenize, Token};
///
/// let tokens = tokenize("1-5A1c3");
/// assert_eq!(
///     tokens.tokens(),
///     &[
///         Token::Number(1),
///         Token::Number(5),
///         Token::UpperLetter('A'),
///         Token::Number(1),
///         Token::LowerLetter('c'),
///         Token::Number(3),
///     ]
/// );
/// ```
#[must_use]
pub fn tokenize(label: &str) -> TokenSequence {
    let mut tokens = Vec::new();
    let mut chars = label.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            let mut value = u64::from(c as u8 - b'0');
            let mut saturated = false;
            while let Some(next) = chars.peek().copied().filter(char::is_ascii_digit) {
                chars.next();
                let digit = u64::from(next as u8 - b'0');
                match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                    Some(v) => value = v,
                    None => {
                        value = u64::MAX;
                        saturated = true;
                    }
                }
            }
            if saturated {
                tracing::debug!(label, "Numeric label component saturated at u64::MAX");
            }
            tokens.push(Token::Number(value));
        } else if c.is_ascii_lowercase() {
            tokens.push(Token::LowerLetter(c));
        } else if c.is_ascii_uppercase() {
            tokens.push(Token::UpperLetter(c));
        }
        // Hyphens and anything else: no token.
    }

    TokenSequence(tokens)
}

/// Three-way comparison of two token sequences in archive order.
#[must_use]
pub fn compare(a: &TokenSequence, b: &TokenSequence) -> Ordering {
    a.cmp(b)
}

/// Sort key of an opaque key under the default card pattern.
#[must_use]
pub fn sort_key(key: &str) -> TokenSequence {
    tokenize(LabelPattern::default().extract(key))
}

/// Order keys by the archive position of their labels.
///
/// Stable: keys whose labels tokenize identically keep their input order.
#[must_use]
pub fn order<S: AsRef<str>>(keys: Vec<S>) -> Vec<S> {
    order_by(keys, &LabelPattern::default())
}

/// Order keys by label, extracting labels with a custom pattern.
///
/// Each key is tokenized once; the sort then compares the cached sequences.
#[must_use]
pub fn order_by<S: AsRef<str>>(keys: Vec<S>, pattern: &LabelPattern) -> Vec<S> {
    order_items_by(keys, pattern, |key| key.as_ref())
}

/// Order arbitrary items by the label of the key string `key` selects.
#[must_use]
pub fn order_items_by<T, F>(mut items: Vec<T>, pattern: &LabelPattern, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| tokenize(pattern.extract(key(item))));
    items
}
