// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Partition enumeration.
//!
//! A query of `n` tokens has `2^(n-1)` ordered partitions into contiguous, non-empty word groups.
//! Enumeration is by cut-point mask: for mask `m`, a cut is placed after token `i` iff bit `i` of
//! `m` is set, and masks run from `0` to `2^(n-1) - 1`. The enumeration is lazy so the resolver
//! can stop at a deadline without paying for the remaining partitions.

use crate::normalize::{self, WordList};

/// An ordered list of contiguous word groups covering one tokenized query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringSet {
    groups: Vec<String>,
}

impl StringSet {
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The canonical textual form: each group bracketed, e.g. `[rio de][janeiro]`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            out.push('[');
            out.push_str(group);
            out.push(']');
        }
        out
    }
}

/// Lazy enumeration of every [`StringSet`] of a token list.
#[derive(Clone, Debug)]
pub struct StringPartition {
    tokens: WordList,
}

impl StringPartition {
    pub fn new(tokens: WordList) -> Self {
        Self { tokens }
    }

    /// The number of partitions this enumeration will yield: `2^(n-1)`, or 0 for no tokens.
    pub fn count(&self) -> u64 {
        match self.tokens.len() {
            0 => 0,
            n => 1 << (n - 1),
        }
    }

    pub fn iter(&self) -> PartitionIter<'_> {
        PartitionIter {
            tokens: &self.tokens,
            next_mask: 0,
            end_mask: self.count(),
        }
    }
}

pub struct PartitionIter<'a> {
    tokens: &'a [String],
    next_mask: u64,
    end_mask: u64,
}

impl Iterator for PartitionIter<'_> {
    type Item = StringSet;

    fn next(&mut self) -> Option<StringSet> {
        if self.next_mask >= self.end_mask {
            return None;
        }
        let mask = self.next_mask;
        self.next_mask += 1;

        let mut groups = Vec::new();
        let mut start = 0usize;
        for i in 0..self.tokens.len() {
            let cut_here = i + 1 == self.tokens.len() || mask & (1 << i) != 0;
            if cut_here {
                groups.push(normalize::join(&self.tokens[start..=i]));
                start = i + 1;
            }
        }
        Some(StringSet::new(groups))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end_mask - self.next_mask) as usize;
        (remaining, Some(remaining))
    }
}
