//! Block Exit
//!
//! Keeps the process alive: `start` returns only on Ctrl-C or once a stop is
//! requested through the service's stop handle.

use async_trait::async_trait;
use hive_core::{Base, Component, Context};
use serde::Deserialize;

pub const NAME: &str = "blockexit";

/// No options; an empty mapping is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockExitOptions {}

pub struct BlockExit {
    base: Base<BlockExitOptions>,
}

impl BlockExit {
    pub fn new(base: Base<BlockExitOptions>) -> Self {
        Self { base }
    }
}

#[async_trait]
impl Component for BlockExit {
    type Options = BlockExitOptions;
    type Refs = hive_core::NoRefs;

    fn base(&self) -> &Base<BlockExitOptions> {
        &self.base
    }

    async fn start(&self, ctx: &Context) -> anyhow::Result<()> {
        let logger = self.base.logger();
        logger.info("Waiting for interrupt signal");
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                logger.info("Received interrupt signal");
            }
            _ = ctx.stopped() => logger.info("Stop requested"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::{Identity, NoRefs, StopHandle};
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_returns_on_stop_request() {
        let block = BlockExit::new(Base::new(
            Identity::new(NAME, ""),
            BlockExitOptions::default(),
            NoRefs {},
        ));
        let stop = StopHandle::new();
        let ctx = stop.context();

        let stopper = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.stop();
        });

        tokio::time::timeout(Duration::from_secs(5), block.start(&ctx))
            .await
            .expect("start did not return after stop")
            .unwrap();
    }
}
