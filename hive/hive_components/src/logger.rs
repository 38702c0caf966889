//! Logger
//!
//! Installs the process-wide `tracing` subscriber. Declare it first so every
//! later component logs through it.

use std::str::FromStr;

use async_trait::async_trait;
use hive_core::{Base, Component, Context, LogLevel, NoRefs};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const NAME: &str = "logger";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggerOptions {
    /// One JSON object per record instead of plain text
    #[serde(rename = "JSON")]
    pub json: bool,

    /// Least severe level recorded
    pub level: LogLevel,

    /// `stderr`, `stdout`, or empty to discard
    pub output: String,
}

/// Where records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Stderr,
    Stdout,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported output {0:?} (expected \"stderr\", \"stdout\" or \"\")")]
pub struct UnsupportedOutput(pub String);

impl FromStr for Output {
    type Err = UnsupportedOutput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stderr" => Ok(Self::Stderr),
            "stdout" => Ok(Self::Stdout),
            "" => Ok(Self::Discard),
            other => Err(UnsupportedOutput(other.to_string())),
        }
    }
}

impl Output {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Discard => BoxMakeWriter::new(std::io::sink),
        }
    }
}

pub struct LoggerComponent {
    base: Base<LoggerOptions>,
}

impl LoggerComponent {
    pub fn new(base: Base<LoggerOptions>) -> Self {
        Self { base }
    }
}

#[async_trait]
impl Component for LoggerComponent {
    type Options = LoggerOptions;
    type Refs = NoRefs;

    fn base(&self) -> &Base<LoggerOptions> {
        &self.base
    }

    async fn init(&self, _ctx: &Context) -> anyhow::Result<()> {
        let options = self.base.options();
        let output: Output = options.output.parse()?;
        let level = options.level.to_level_filter();

        let installed = if options.json {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(level)
                .with_writer(output.make_writer())
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(output.make_writer())
                .try_init()
        };

        match installed {
            Ok(()) => self.base.logger().debug(format_args!(
                "logging at {} to {output:?}",
                options.level.as_str()
            )),
            Err(err) => self
                .base
                .logger()
                .warn(format_args!("keeping the existing subscriber: {err}")),
        }
        Ok(())
    }
}
