//! Bridge settings and their validation.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Runtime settings for the bridge daemon.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address both engine endpoints listen on.
    pub listen: SocketAddr,

    /// Every `frame_skip`-th eligible poll is dropped. 0 disables skipping.
    pub frame_skip: u32,

    /// Upper bound on a single snapshot wait. `None` waits forever.
    pub wait_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            frame_skip: 0,
            wait_timeout: None,
        }
    }
}

impl BridgeConfig {
    /// Reject settings that would stall the handshake.
    pub fn validate(&self) -> Result<()> {
        check_frame_skip(self.frame_skip)?;
        if self.wait_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("wait timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// A skip of 1 would drop every eligible poll and stall the handshake.
pub(crate) fn check_frame_skip(frame_skip: u32) -> Result<()> {
    if frame_skip == 1 {
        return Err(Error::InvalidConfig(
            "frame skip of 1 drops every poll; use 0 to disable or >= 2".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        BridgeConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_degenerate_frame_skip() {
        let cfg = BridgeConfig {
            frame_skip: 1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = BridgeConfig {
            frame_skip: 2,
            ..Default::default()
        };
        cfg.validate().unwrap();
    }
}
