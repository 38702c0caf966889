//! Loading pipeline: read, decomment, expand templates, decode, validate.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::codec::{json_error, Codec};
use crate::decomment::{decomment, Decommented};
use crate::document::Document;
use crate::error::{CodecError, ConfigError, TemplateError};
use crate::template;

/// Where configuration text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local file
    Path(PathBuf),

    /// Standard input, written as `-`
    Stdin,

    /// An `http://` or `https://` URL
    Url(String),
}

impl Source {
    /// Interpret a command line argument.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Codec suggested by the source's file extension.
    pub fn codec_hint(&self) -> Option<Codec> {
        match self {
            Self::Path(path) => Codec::from_extension(path),
            Self::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                Codec::from_extension(std::path::Path::new(path))
            }
            Self::Stdin => None,
        }
    }

    /// Read the whole text.
    pub async fn read(&self) -> Result<String, ConfigError> {
        let origin = self.to_string();
        match self {
            Self::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read { origin, source }),
            Self::Stdin => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .map_err(|source| ConfigError::Read { origin, source })?;
                Ok(text)
            }
            Self::Url(url) => {
                let fetch = async {
                    reqwest::get(url)
                        .await?
                        .error_for_status()?
                        .text()
                        .await
                };
                fetch
                    .await
                    .map_err(|source| ConfigError::Fetch { origin, source })
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Knobs of the loading pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Expand `{{ }}` actions; when off they stay literal text
    pub enable_template: bool,

    /// Format of the text
    pub codec: Codec,
}

impl LoaderOptions {
    pub fn with_template(mut self, enable: bool) -> Self {
        self.enable_template = enable;
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }
}

/// Read and parse a configuration.
///
/// # Arguments
///
/// * `source` - Where to read the text from.
/// * `options` - Template flag and codec.
///
/// # Returns
///
/// The validated document, with every declaration's UUID filled in.
pub async fn load(source: &Source, options: LoaderOptions) -> Result<Document, ConfigError> {
    let text = source.read().await?;
    parse(&text, &source.to_string(), options)
}

/// Parse configuration text. `origin` names the text in errors.
pub fn parse(text: &str, origin: &str, options: LoaderOptions) -> Result<Document, ConfigError> {
    let stripped = decomment(text);

    let body = if options.enable_template {
        let first = decode(&stripped, stripped.text(), origin, options.codec)?;
        let rendered = template::render(stripped.text(), &first.context).map_err(|err| {
            ConfigError::Template {
                origin: origin.to_string(),
                source: TemplateError {
                    location: stripped.relocate(err.location),
                    kind: err.kind,
                },
            }
        })?;
        Cow::Owned(rendered)
    } else {
        Cow::Borrowed(stripped.text())
    };

    let mut document = decode(&stripped, &body, origin, options.codec)?;
    validate(&mut document, origin)?;

    debug!(
        origin,
        format = options.codec.name,
        components = document.components.len(),
        "configuration loaded"
    );
    Ok(document)
}

/// Encode a document with `codec`, e.g. for printing.
pub fn encode_document(document: &Document, codec: Codec) -> Result<String, ConfigError> {
    let encode_error = |source: CodecError| ConfigError::Encode {
        codec: codec.name,
        source,
    };
    let tree = serde_json::to_value(document).map_err(|err| encode_error(json_error(&err)))?;
    (codec.encode)(&tree).map_err(encode_error)
}

fn decode(
    stripped: &Decommented,
    text: &str,
    origin: &str,
    codec: Codec,
) -> Result<Document, ConfigError> {
    let decode_error = |err: CodecError| ConfigError::Decode {
        origin: origin.to_string(),
        location: err.location.map(|location| stripped.relocate(location)),
        message: err.message,
    };

    if codec.is_canonical() {
        return serde_json::from_str(text).map_err(|err| decode_error(json_error(&err)));
    }

    // Transcode: generic tree, canonical text, typed document
    let tree = (codec.decode)(text).map_err(decode_error)?;
    let canonical = (Codec::JSON.encode)(&tree).map_err(decode_error)?;
    serde_json::from_str(&canonical).map_err(|err| {
        decode_error(CodecError::new(format!(
            "{} (in {} document)",
            json_error(&err).message,
            codec.name
        )))
    })
}

fn validate(document: &mut Document, origin: &str) -> Result<(), ConfigError> {
    for (index, declaration) in document.components.iter_mut().enumerate() {
        if declaration.name.trim().is_empty() {
            return Err(ConfigError::MissingName {
                origin: origin.to_string(),
                index,
            });
        }
        if declaration.uuid.is_empty() {
            declaration.uuid = declaration.name.clone();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Location, TemplateErrorKind};
    use serde_json::json;

    const JSON: LoaderOptions = LoaderOptions {
        enable_template: false,
        codec: Codec::JSON,
    };

    #[test]
    fn test_source_parse() {
        assert_eq!(Source::parse("-"), Source::Stdin);
        assert_eq!(
            Source::parse("https://example.com/app.toml?x=1"),
            Source::Url("https://example.com/app.toml?x=1".into())
        );
        assert_eq!(
            Source::parse("https://example.com/app.toml?x=1").codec_hint(),
            Some(Codec::TOML)
        );
        assert_eq!(Source::parse("app.json"), Source::Path("app.json".into()));
        assert_eq!(Source::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn test_parse_fills_uuid_and_keeps_order() {
        let text = r#"
        // two loggers, distinct UUIDs
        {
            "Components": [
                { "Name": "logger" },
                { "Name": "logger", "UUID": "audit" },
                { "Name": "eventsystem" }
            ]
        }"#;
        let document = parse(text, "inline", JSON).unwrap();
        let uuids: Vec<_> = document.components.iter().map(|d| d.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["logger", "audit", "eventsystem"]);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let text = r#"{ "Components": [{ "Name": "a" }, { "UUID": "b" }] }"#;
        let err = parse(text, "inline", JSON).unwrap_err();
        assert!(matches!(err, ConfigError::MissingName { index: 1, .. }));
    }

    #[test]
    fn test_decode_error_points_at_original_line() {
        let text = "// comment\n// comment\n{\n  \"Components\": [,]\n}\n";
        let err = parse(text, "inline", JSON).unwrap_err();
        assert_eq!(err.location().map(|l| l.line), Some(4));
    }

    #[test]
    fn test_actions_are_literal_without_template() {
        let text = r#"{ "Components": [{ "Name": "x", "Options": { "Addr": "{{ .Port }}" } }] }"#;
        let document = parse(text, "inline", JSON).unwrap();
        assert_eq!(document.components[0].options, json!({ "Addr": "{{ .Port }}" }));
    }

    #[test]
    fn test_template_expansion() {
        let text = r#"{
            "Context": { "Port": 8080 },
            "Components": [
                // the port is shifted by one
                { "Name": "httpserver", "Options": { "Addr": ":{{ .Port | add 1 }}" } }
            ]
        }"#;
        let document = parse(text, "inline", JSON.with_template(true)).unwrap();
        assert_eq!(document.components[0].options, json!({ "Addr": ":8081" }));
    }

    #[test]
    fn test_template_undefined_path_location() {
        let text = "// header\n{\n  \"Components\": [\n    { \"Name\": \"{{ .Nope }}\" }\n  ]\n}\n";
        let err = parse(text, "inline", JSON.with_template(true)).unwrap_err();
        match err {
            ConfigError::Template { source, .. } => {
                assert_eq!(source.kind, TemplateErrorKind::UndefinedPath(".Nope".into()));
                assert_eq!(source.location, Location::new(4, 16));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_toml_is_transcoded() {
        let text = "\
# logging first
[[Components]]
Name = \"logger\"
[Components.Options]
Level = \"debug\"

[[Components]]
Name = \"auth\"
UUID = \"auth-1\"
[Components.Refs]
EventSystem = \"events\"
";
        let options = LoaderOptions::default().with_codec(Codec::TOML);
        let document = parse(text, "inline.toml", options).unwrap();
        assert_eq!(document.components[0].options, json!({ "Level": "debug" }));
        assert_eq!(document.components[1].uuid, "auth-1");
        assert_eq!(document.components[1].refs["EventSystem"], "events");
    }

    #[test]
    fn test_yaml_is_transcoded() {
        let text = "\
# logging first
Components:
  - Name: logger
    Options:
      Level: debug
  - Name: auth
    UUID: auth-1
    Refs:
      EventSystem: events
";
        let options = LoaderOptions::default().with_codec(Codec::YAML);
        let document = parse(text, "inline.yaml", options).unwrap();
        assert_eq!(document.components[0].options, json!({ "Level": "debug" }));
        assert_eq!(document.components[1].uuid, "auth-1");
        assert_eq!(document.components[1].refs["EventSystem"], "events");

        let encoded = encode_document(&document, Codec::YAML).unwrap();
        let reparsed = parse(&encoded, "encoded", JSON.with_codec(Codec::YAML)).unwrap();
        assert_eq!(reparsed, document);
    }

    #[test]
    fn test_encode_document_round_trips_through_toml() {
        let text = r#"{ "Components": [{ "Name": "logger", "Options": { "Level": "info" } }] }"#;
        let document = parse(text, "inline", JSON).unwrap();
        let encoded = encode_document(&document, Codec::TOML).unwrap();
        let reparsed = parse(&encoded, "encoded", JSON.with_codec(Codec::TOML)).unwrap();
        assert_eq!(reparsed, document);
    }
}
