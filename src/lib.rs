// lib.rs
#![warn(clippy::large_futures)]

pub use std::{
    net,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

pub use anyhow::bail;
pub use serde::{Deserialize, Serialize};
pub use tokio::{
    sync::RwLock,
    time::{sleep, Duration, Instant},
};

mod config;
pub use config::*;

mod error;
pub use error::*;

mod sampler;
pub use sampler::*;

#[cfg(target_os = "espidf")]
mod measure;
#[cfg(target_os = "espidf")]
pub use measure::*;

mod simpin;
pub use simpin::*;

mod indicator;
pub use indicator::*;

mod session;
pub use session::*;

mod recording;
pub use recording::*;

mod command;
pub use command::*;

mod broadcast;
pub use broadcast::*;

mod device;
pub use device::*;

mod state;
pub use state::*;

mod apiserver;
pub use apiserver::*;

#[cfg(target_os = "espidf")]
mod wifi;
#[cfg(target_os = "espidf")]
pub use wifi::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIMESTAMP: &str = match option_env!("SOURCE_TIMESTAMP") {
    Some(ts) => ts,
    None => "-",
};

/// Depth of the queue from the socket tasks to the control loop.
pub const EVENT_QUEUE_LEN: usize = 32;

/// Snapshot published by the control loop for the read-only status endpoint.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeviceStatus {
    pub device: String,
    pub timestamp: i64,
    pub last_update: String,
    pub uptime: u32,
    pub temperature: Option<f32>,
    pub connected: bool,
    pub recording: bool,
    pub alerting: bool,
    pub samples: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Uptime {
    pub uptime: u32,
    pub uptime_s: String,
}

impl Uptime {
    pub fn new(uptime: u32) -> Self {
        let (days, rem) = (uptime / 86400, uptime % 86400);
        Uptime {
            uptime,
            uptime_s: format!(
                "{days}d {:02}:{:02}:{:02}",
                rem / 3600,
                rem % 3600 / 60,
                rem % 60
            ),
        }
    }
}

/// Count seconds of uptime for the status endpoints.
pub async fn poll_uptime(state: Arc<MyState>) -> anyhow::Result<()> {
    let mut uptime: u32 = 0;
    loop {
        sleep(Duration::from_secs(2)).await;

        uptime += 2;
        *(state.uptime.write().await) = uptime;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_text() {
        assert_eq!(Uptime::new(0).uptime_s, "0d 00:00:00");
        assert_eq!(Uptime::new(90061).uptime_s, "1d 01:01:01");
    }
}

// EOF
