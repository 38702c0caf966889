//! Runtime Configuration
//!
//! Settings of the runtime itself, as opposed to the component
//! configuration it loads.

use std::time::Duration;

use hive_config::{Codec, LoaderOptions, Source};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Deadline given to each shutdown and uninit hook (seconds)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u32,

    /// Expand `{{ }}` template actions in the component configuration
    #[serde(default)]
    pub enable_template: bool,

    /// Configuration format; inferred from the source when absent, else JSON
    #[serde(default)]
    pub format: Option<String>,
}

fn default_shutdown_timeout() -> u32 {
    30
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: default_shutdown_timeout(),
            enable_template: false,
            format: None,
        }
    }
}

impl RuntimeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.shutdown_timeout == 0 {
            return Err(Error::InvalidConfig(
                "shutdown timeout cannot be zero".to_string(),
            ));
        }

        if let Some(format) = &self.format {
            if Codec::by_name(format).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "unknown configuration format {format:?}"
                )));
            }
        }

        if self.shutdown_timeout > 600 {
            warn!(
                seconds = self.shutdown_timeout,
                "shutdown timeout is unusually long"
            );
        }

        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.shutdown_timeout))
    }

    /// Codec for `source`: the explicit format, else the source's extension,
    /// else JSON.
    pub fn codec_for(&self, source: &Source) -> Result<Codec, Error> {
        match &self.format {
            Some(format) => Codec::by_name(format).ok_or_else(|| {
                Error::InvalidConfig(format!("unknown configuration format {format:?}"))
            }),
            None => Ok(source.codec_hint().unwrap_or_default()),
        }
    }

    /// Loader options for `source`.
    pub fn loader_options(&self, source: &Source) -> Result<LoaderOptions, Error> {
        Ok(LoaderOptions::default()
            .with_template(self.enable_template)
            .with_codec(self.codec_for(source)?))
    }
}
