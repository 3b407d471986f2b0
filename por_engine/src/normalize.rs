// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query and field normalization.
//!
//! Every string that enters the full-text index, and every query that is matched against it, goes
//! through the same folding: lower-casing, diacritic removal and punctuation stripping. Matching is
//! then a plain comparison of folded tokens, and the corrected query the resolver reports back is
//! rebuilt from folded tokens as well.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// An ordered list of normalized words.
pub type WordList = Vec<String>;

/// Folds a raw string: NFD-decompose, drop combining marks, lower-case, and replace every
/// non-alphanumeric character with a space.
pub fn fold(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

/// Tokenizes a raw string into a [`WordList`], preserving word order.
pub fn tokenize(raw: &str) -> WordList {
    fold(raw)
        .split_whitespace()
        .map(|word| word.to_string())
        .collect()
}

/// Joins a slice of words back into the canonical single-space-separated form.
pub fn join(words: &[String]) -> String {
    words.join(" ")
}
