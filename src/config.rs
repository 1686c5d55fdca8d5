// config.rs

use std::net;

use anyhow::bail;
use crc::{Crc, CRC_32_ISCSI};
use log::*;
use serde::{Deserialize, Serialize};

pub const NVS_BUF_SIZE: usize = 256;

const DEFAULT_API_PORT: u16 = 80;
const DEFAULT_SAMPLE_DELAY_MS: u64 = 1000;
const DEFAULT_RECORD_LIMIT: u32 = 3600;

#[cfg(target_os = "espidf")]
const CONFIG_NAME: &str = "cfg";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MyConfig {
    pub port: u16,
    pub sample_delay_ms: u64,
    pub record_limit: u32,

    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub v4dhcp: bool,
    pub v4addr: net::Ipv4Addr,
    pub v4mask: u8,
    pub v4gw: net::Ipv4Addr,
    pub dns1: net::Ipv4Addr,
    pub dns2: net::Ipv4Addr,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            port: option_env!("API_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_API_PORT),
            sample_delay_ms: DEFAULT_SAMPLE_DELAY_MS,
            record_limit: DEFAULT_RECORD_LIMIT,

            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("password").into(),

            v4dhcp: true,
            v4addr: net::Ipv4Addr::new(0, 0, 0, 0),
            v4mask: 0,
            v4gw: net::Ipv4Addr::new(0, 0, 0, 0),
            dns1: net::Ipv4Addr::new(0, 0, 0, 0),
            dns2: net::Ipv4Addr::new(0, 0, 0, 0),
        }
    }
}

impl MyConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_delay_ms == 0 {
            bail!("Sample delay must be at least 1 ms");
        }
        if self.record_limit == 0 {
            bail!("Record limit must be at least 1 sample");
        }
        if self.v4mask > 30 {
            bail!("IPv4 mask error: bits must be between 0..30");
        }
        Ok(())
    }

    /// Encode into `buf` as postcard with a CRC-32 trailer.
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> anyhow::Result<&'a mut [u8]> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        match postcard::to_slice_crc32(self, buf, digest) {
            Ok(d) => Ok(d),
            Err(e) => bail!("Cannot encode config to buffer {e:?}"),
        }
    }

    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        match postcard::from_bytes_crc32::<MyConfig>(b, digest) {
            Ok(c) => {
                info!("Successfully parsed config.");
                Some(c)
            }
            Err(e) => {
                error!("Cannot parse config: {e:?}");
                None
            }
        }
    }
}

#[cfg(target_os = "espidf")]
mod nvs_store {
    use esp_idf_svc::nvs;

    use super::*;

    impl MyConfig {
        pub fn from_nvs(nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> Option<Self> {
            let mut nvsbuf = [0u8; NVS_BUF_SIZE];
            info!("Reading up to {sz} bytes from nvs...", sz = NVS_BUF_SIZE);
            let b = match nvs.get_raw(CONFIG_NAME, &mut nvsbuf) {
                Err(e) => {
                    error!("Nvs read error {e:?}");
                    return None;
                }
                Ok(Some(b)) => b,
                _ => {
                    error!("Nvs key not found");
                    return None;
                }
            };
            info!("Got {sz} bytes from nvs. Parsing config...", sz = b.len());
            Self::from_bytes(b)
        }

        pub fn to_nvs(&self, nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> anyhow::Result<()> {
            let mut nvsbuf = [0u8; NVS_BUF_SIZE];
            let nvsdata = self.to_bytes(&mut nvsbuf)?;
            info!(
                "Encoded config to {sz} bytes. Saving to nvs...",
                sz = nvsdata.len()
            );

            match nvs.set_raw(CONFIG_NAME, nvsdata) {
                Ok(_) => {
                    info!("Config saved.");
                    Ok(())
                }
                Err(e) => bail!("Cannot save to nvs: {e:?}"),
            }
        }
    }
}


// EOF
