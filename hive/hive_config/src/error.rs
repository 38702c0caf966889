//! Configuration errors.

use std::fmt;

use thiserror::Error;

/// Line and column in a configuration text, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Location of byte `offset` within `text`. Offsets past the end map to
    /// the end of the text.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

/// A codec failed to decode or encode a tree.
#[derive(Debug, Clone, Error)]
#[error("{message}{}", at(.location))]
pub struct CodecError {
    pub message: String,
    pub location: Option<Location>,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// What went wrong while expanding a template action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateErrorKind {
    #[error("unclosed action")]
    Unclosed,

    #[error("empty action")]
    Empty,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("undefined path {0}")]
    UndefinedPath(String),

    #[error("function {0:?} not defined (known: {known})", known = crate::template::FUNCTIONS.join(", "))]
    UnknownFunction(String),

    #[error("wrong arguments for {function}: {message}")]
    BadArguments {
        function: &'static str,
        message: String,
    },

    #[error("{0}: division by zero")]
    DivisionByZero(&'static str),

    #[error("{0}: integer overflow")]
    Overflow(&'static str),

    #[error("action evaluates to null")]
    Null,
}

/// A template action failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {location}")]
pub struct TemplateError {
    /// Where the offending action starts
    pub location: Location,
    pub kind: TemplateErrorKind,
}

/// Loading a configuration failed. No declarations are returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {origin}: {source}")]
    Fetch {
        origin: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{origin}{}: {message}", at(.location))]
    Decode {
        origin: String,
        location: Option<Location>,
        message: String,
    },

    #[error("{origin}: template {source}")]
    Template {
        origin: String,
        #[source]
        source: TemplateError,
    },

    #[error("{origin}: component #{index} has no Name")]
    MissingName { origin: String, index: usize },

    #[error("failed to encode configuration as {codec}: {source}")]
    Encode {
        codec: &'static str,
        #[source]
        source: CodecError,
    },
}

impl ConfigError {
    /// Location in the original text, when the error has one.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Decode { location, .. } => *location,
            Self::Template { source, .. } => Some(source.location),
            _ => None,
        }
    }
}
