//! Text cleanup applied to every rendered string.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_TRAILING_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}-$").unwrap());

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Expand ligature code points (U+FB00..U+FB06)
    pub fix_ligatures: bool,

    /// Remove soft hyphens (U+00AD)
    pub remove_soft_hyphens: bool,

    /// Remove the Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse whitespace runs to a single space
    pub collapse_whitespace: bool,

    /// Join a word hyphenated across two lines of one paragraph
    pub dehyphenate: bool,
}

impl CleanupOptions {
    /// Create options with the default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that only trim.
    pub fn none() -> Self {
        Self {
            normalize_unicode: false,
            fix_ligatures: false,
            remove_soft_hyphens: false,
            remove_replacement_char: false,
            collapse_whitespace: false,
            dehyphenate: false,
        }
    }

    /// Enable or disable dehyphenation across lines.
    pub fn with_dehyphenate(mut self, enabled: bool) -> Self {
        self.dehyphenate = enabled;
        self
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_soft_hyphens: true,
            remove_replacement_char: true,
            collapse_whitespace: true,
            dehyphenate: false,
        }
    }
}

/// Clean a piece of text for rendering.
pub fn clean_text(text: &str, options: &CleanupOptions) -> String {
    let mut result: String = if options.normalize_unicode {
        text.nfc().collect()
    } else {
        text.to_string()
    };

    if options.fix_ligatures || options.remove_soft_hyphens || options.remove_replacement_char {
        let mut out = String::with_capacity(result.len());
        for c in result.chars() {
            match c {
                '\u{00AD}' if options.remove_soft_hyphens => {}
                '\u{FFFD}' if options.remove_replacement_char => {}
                _ if options.fix_ligatures => match LIGATURES.iter().find(|(l, _)| *l == c) {
                    Some((_, expanded)) => out.push_str(expanded),
                    None => out.push(c),
                },
                _ => out.push(c),
            }
        }
        result = out;
    }

    if options.collapse_whitespace {
        result = RE_WHITESPACE.replace_all(&result, " ").into_owned();
    }

    result.trim().to_string()
}

/// Join the lines of one paragraph with single spaces.
///
/// With `dehyphenate` set, a line ending in a letter followed by `-` is glued
/// to a next line that starts with a lowercase letter, dropping the hyphen.
pub fn join_lines<S: AsRef<str>>(lines: &[S], options: &CleanupOptions) -> String {
    let mut result = String::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if result.is_empty() {
            result.push_str(line);
            continue;
        }
        let continues_word = options.dehyphenate
            && RE_TRAILING_HYPHEN.is_match(&result)
            && line.chars().next().is_some_and(char::is_lowercase);
        if continues_word {
            result.pop();
        } else {
            result.push(' ');
        }
        result.push_str(line);
    }
    clean_text(&result, options)
}

/// Collapse runs of three or more newlines to one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    RE_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}
