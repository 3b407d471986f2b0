// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{borrow::Cow, fmt::Display};

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Indicates that the query tokenized to zero words.
    ///
    /// This error is returned to the caller; there is nothing to resolve.
    EmptyQuery,

    /// Indicates a failure in the full-text index backend during matching or document insertion.
    ///
    /// The query (or build) aborts. The details should be available in [`Error::source`](std::error::Error::source).
    IndexError,

    /// Indicates a failure in the POR store backend during select or insert.
    ///
    /// The query (or build) aborts. The details should be available in [`Error::source`](std::error::Error::source).
    StoreError,

    /// Indicates that an insert would overwrite an existing row with the same composite key.
    DuplicateKey,

    /// Indicates that a select or update addressed a composite key absent from the store.
    NotFound,

    /// Indicates that an index document's data blob could not be parsed.
    ///
    /// The blob is written by the index builder, so this error is not recoverable at query time:
    /// the index must be rebuilt.
    MalformedIndexDocument,

    /// Indicates that a full-text hit references a composite key absent from the POR store.
    ///
    /// The index is built from the store, so this error means the two on-disk artifacts come from
    /// different builds. It is not recoverable at query time: the index must be rebuilt.
    IndexStoreOutOfSync,

    /// Indicates a malformed row in the POR or PageRank CSV.
    ///
    /// In lenient build mode the row is logged and skipped; in strict mode the build aborts.
    CsvParse,

    /// Indicates that the per-query deadline elapsed before the resolver finished.
    DeadlineExceeded,

    /// Indicates that a build was attempted while another build holds the build lock.
    BuildConflict,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ErrorKind::EmptyQuery => write!(f, "query contains no words"),
            ErrorKind::IndexError => write!(f, "full-text index backend error"),
            ErrorKind::StoreError => write!(f, "POR store backend error"),
            ErrorKind::DuplicateKey => write!(f, "composite key already present in the store"),
            ErrorKind::NotFound => write!(f, "composite key not found in the store"),
            ErrorKind::MalformedIndexDocument => write!(f, "malformed index document data blob"),
            ErrorKind::IndexStoreOutOfSync => {
                write!(f, "full-text index is not in sync with the POR store")
            }
            ErrorKind::CsvParse => write!(f, "malformed CSV row"),
            ErrorKind::DeadlineExceeded => write!(f, "query deadline exceeded"),
            ErrorKind::BuildConflict => write!(f, "another build holds the build lock"),
        }
    }
}

impl ErrorKind {
    pub fn with_source(self, source: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(self).with_source(source)
    }

    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Error {
        Error::from(self).with_message(message)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    message: Option<Cow<'static, str>>,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            message: None,
        }
    }
}

impl Error {
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn into_source(self) -> Option<Box<dyn std::error::Error + Send + Sync>> {
        self.source
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = self.source.as_ref()?;
        Some(&**source)
    }
}
