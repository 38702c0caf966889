//! # Hive Config
//!
//! Turns configuration text into an ordered list of component declarations.
//!
//! The pipeline is:
//!
//! 1. read the text from a file, standard input or a URL;
//! 2. drop full-line `//` comments, remembering where each line came from;
//! 3. optionally expand `{{ }}` template actions against the `Context` value;
//! 4. decode with the selected codec (JSON natively, other formats by
//!    transcoding through a generic tree);
//! 5. validate: every declaration needs a `Name`, and `UUID` defaults to it.
//!
//! Errors carry the line and column in the text the user wrote.

pub mod codec;
pub mod decomment;
pub mod document;
pub mod error;
pub mod loader;
pub mod template;

pub use codec::Codec;
pub use decomment::{decomment, Decommented};
pub use document::{Declaration, Document};
pub use error::{CodecError, ConfigError, Location, TemplateError, TemplateErrorKind};
pub use loader::{encode_document, load, parse, LoaderOptions, Source};
