//! Pluggable configuration codecs.
//!
//! JSON is the canonical format. Any other format is supported by a codec
//! that decodes into a generic tree; the loader re-encodes that tree as
//! canonical JSON and decodes the typed document from it.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::error::{CodecError, Location};

/// A decode/encode function pair for one configuration format.
#[derive(Clone, Copy)]
pub struct Codec {
    /// Format name, as accepted by `--format`
    pub name: &'static str,

    /// Text to generic tree
    pub decode: fn(&str) -> Result<Value, CodecError>,

    /// Generic tree to text
    pub encode: fn(&Value) -> Result<String, CodecError>,
}

impl Codec {
    /// The canonical format.
    pub const JSON: Codec = Codec {
        name: "json",
        decode: json_decode,
        encode: json_encode,
    };

    pub const TOML: Codec = Codec {
        name: "toml",
        decode: toml_decode,
        encode: toml_encode,
    };

    pub const YAML: Codec = Codec {
        name: "yaml",
        decode: yaml_decode,
        encode: yaml_encode,
    };

    /// All built-in codecs.
    pub const ALL: &'static [Codec] = &[Codec::JSON, Codec::TOML, Codec::YAML];

    /// Look a codec up by format name, case-insensitively. `yml` is an
    /// alias for `yaml`.
    pub fn by_name(name: &str) -> Option<Codec> {
        if name.eq_ignore_ascii_case("yml") {
            return Some(Self::YAML);
        }
        Self::ALL
            .iter()
            .find(|codec| codec.name.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Pick a codec from a file extension.
    pub fn from_extension(path: &Path) -> Option<Codec> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::by_name)
    }

    /// Whether this is the canonical format.
    pub fn is_canonical(&self) -> bool {
        self.name == Self::JSON.name
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::JSON
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Codec").field(&self.name).finish()
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Codec {}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) fn json_error(err: &serde_json::Error) -> CodecError {
    let error = CodecError::new(strip_position(&err.to_string()));
    if err.line() == 0 {
        error
    } else {
        error.at(Location::new(err.line(), err.column()))
    }
}

// serde_json appends " at line L column C"; the location is kept separately.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}

fn json_decode(text: &str) -> Result<Value, CodecError> {
    serde_json::from_str(text).map_err(|err| json_error(&err))
}

fn json_encode(value: &Value) -> Result<String, CodecError> {
    serde_json::to_string_pretty(value).map_err(|err| json_error(&err))
}

fn toml_decode(text: &str) -> Result<Value, CodecError> {
    toml::from_str::<Value>(text).map_err(|err| {
        let error = CodecError::new(err.message().trim_end());
        match err.span() {
            Some(span) => error.at(Location::from_offset(text, span.start)),
            None => error,
        }
    })
}

fn toml_encode(value: &Value) -> Result<String, CodecError> {
    toml::to_string_pretty(value).map_err(|err| CodecError::new(err.to_string()))
}

fn yaml_decode(text: &str) -> Result<Value, CodecError> {
    serde_yaml::from_str::<Value>(text).map_err(|err| {
        let error = CodecError::new(strip_position(&err.to_string()));
        match err.location() {
            Some(location) => error.at(Location::from_offset(text, location.index())),
            None => error,
        }
    })
}

fn yaml_encode(value: &Value) -> Result<String, CodecError> {
    serde_yaml::to_string(value).map_err(|err| CodecError::new(err.to_string()))
}
