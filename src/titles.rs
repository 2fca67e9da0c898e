//! Title pattern tables and comparison helpers.
//! Used by the title identity resolver to classify qualifier clauses and to
//! compare spellings of the same song.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// VOCABULARY
// ============================================================================

/// Terms marking an alternate version, grouped by script.
pub const ALTERNATE_TERMS_LATIN: &[&str] = &[
    "acapella",
    "acoustic",
    "demo",
    "ext",
    "extended",
    "inst",
    "instrumental",
    "live",
    "mix",
    "piano",
    "radio",
    "remix",
    "remixed",
    "ver",
    "version",
];

pub const ALTERNATE_TERMS_CYRILLIC: &[&str] = &["акустика", "версия", "инструментал", "радио"];

/// Qualifier clauses that name a part of a work rather than a version of it.
pub const STRUCTURAL_TERMS: &[&str] = &["intro", "interlude"];

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Any qualifier clause: a dash-delimited suffix ("Song - Something") or a
/// bracketed clause ("Song (Something)").
pub static QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+[-\x{2010}-\x{2015}]\s+.*|\s*\p{Ps}.+\p{Pe}").unwrap()
});

/// Qualifier clause containing an alternate-version term as a whole word:
/// "Song (Live)", "Song (Radio Edit)", "Song - Acoustic Version".
pub static ALTERNATE: Lazy<Regex> = Lazy::new(|| {
    let terms = ALTERNATE_TERMS_LATIN
        .iter()
        .chain(ALTERNATE_TERMS_CYRILLIC)
        .copied()
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)\s+[-\x{{2010}}-\x{{2015}}].*\PL(?:{terms})(?:\PL|$).*|\s+\p{{Ps}}(?:.*\PL)?(?:{terms})(?:\PL.*)?\p{{Pe}}"
    ))
    .unwrap()
});

/// Qualifier clause made only of a structural term: "Song - Intro", "(Interlude)".
pub static STRUCTURAL: Lazy<Regex> = Lazy::new(|| {
    let terms = STRUCTURAL_TERMS.join("|");
    Regex::new(&format!(
        r"(?i)\s+[-\x{{2010}}-\x{{2015}}]\s+(?:{terms})$|\s*\p{{Ps}}(?:{terms})\p{{Pe}}$"
    ))
    .unwrap()
});

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// What a title's qualifier clause says about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// No qualifier clause at all.
    Plain,
    /// Qualifier names a structural part (intro, interlude); never an alternate.
    Structural,
    /// Qualifier contains a known alternate-version term.
    Alternate,
    /// Qualifier present but not recognized; needs confirmation.
    Unknown,
}

/// A vocabulary term anywhere in the qualifiers wins over a trailing structural clause.
pub fn classify_qualifier(title: &str) -> Qualifier {
    if !QUALIFIER.is_match(title) {
        Qualifier::Plain
    } else if ALTERNATE.is_match(title) {
        Qualifier::Alternate
    } else if STRUCTURAL.is_match(title) {
        Qualifier::Structural
    } else {
        Qualifier::Unknown
    }
}

/// Title with every qualifier clause removed.
/// e.g., "Creep (Acoustic)" → "Creep", "Karma Police - Live" → "Karma Police"
pub fn root_title(title: &str) -> String {
    QUALIFIER.replace_all(title, "").trim().to_string()
}

// ============================================================================
// COMPARISON
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Lowercase and strip diacritics via NFKD decomposition. Other scripts are
/// left as they are.
/// e.g., "Café" → "cafe", "naïve" → "naive", "愛の歌" → "愛の歌"
pub fn fold_diacritics(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Clean a title for comparability without changing its meaning.
/// Lowercases, straightens quotes, spells out "&", drops commas and folds diacritics.
pub fn clean_title(title: &str) -> String {
    let result = title
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('&', " and ")
        .replace(',', "");
    let folded = fold_diacritics(&result);
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

/// Case-insensitive normalized Levenshtein similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

// ============================================================================
// TESTS
// ============================================================================
