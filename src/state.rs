// state.rs

use std::net::{self, Ipv4Addr};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};

use crate::*;

/// State shared between the async tasks. Device state proper lives in the
/// control loop; this only carries what the other tasks need to see.
pub struct MyState {
    pub config: MyConfig,
    pub api_cnt: AtomicU32,
    pub next_client: AtomicU64,
    pub uptime: RwLock<u32>,
    pub wifi_up: RwLock<bool>,
    pub ip_addr: RwLock<Ipv4Addr>,
    pub myid: RwLock<String>,
    pub status: RwLock<DeviceStatus>,
    pub events: mpsc::Sender<ChannelEvent>,
}

impl MyState {
    pub fn new(config: MyConfig, events: mpsc::Sender<ChannelEvent>) -> Self {
        MyState {
            config,
            api_cnt: AtomicU32::new(0),
            next_client: AtomicU64::new(1),
            uptime: RwLock::new(0),
            wifi_up: RwLock::new(false),
            ip_addr: RwLock::new(net::Ipv4Addr::new(0, 0, 0, 0)),
            myid: RwLock::new("esp32tempmon".into()),
            status: RwLock::new(DeviceStatus::default()),
            events,
        }
    }

    pub fn next_client_id(&self) -> ClientId {
        ClientId::new(self.next_client.fetch_add(1, Ordering::Relaxed))
    }
}

// EOF
