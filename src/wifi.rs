// wifi.rs

use std::sync::Arc;

use anyhow::bail;
use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_svc::{
    eventloop::{EspEventLoop, System},
    ipv4,
    netif::{self, EspNetif},
    timer::{EspTimerService, Task},
    wifi::{AsyncWifi, EspWifi, WifiDriver},
};
use log::*;
use tokio::time::{sleep, Duration};

use crate::*;

const INITIAL_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Station-mode network bring-up. The API server waits for `wifi_up`
/// before it starts listening.
pub struct WifiLoop<'a> {
    pub state: Arc<MyState>,
    pub wifi: Option<AsyncWifi<EspWifi<'a>>>,
}

impl<'a> WifiLoop<'a> {
    pub fn new(state: Arc<MyState>) -> Self {
        Self { state, wifi: None }
    }

    pub async fn run(
        mut self,
        wifidriver: WifiDriver<'a>,
        sysloop: EspEventLoop<System>,
        timer: EspTimerService<Task>,
    ) -> anyhow::Result<()> {
        info!("Initializing Wi-Fi...");
        let config = &self.state.config;

        let ipv4_config = if config.v4dhcp {
            ipv4::ClientConfiguration::DHCP(ipv4::DHCPClientSettings::default())
        } else {
            ipv4::ClientConfiguration::Fixed(ipv4::ClientSettings {
                ip: config.v4addr,
                subnet: ipv4::Subnet {
                    gateway: config.v4gw,
                    mask: ipv4::Mask(config.v4mask),
                },
                dns: Some(config.dns1),
                secondary_dns: Some(config.dns2),
            })
        };

        let net_if = EspNetif::new_with_conf(&netif::NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Client(ipv4_config)),
            ..netif::NetifConfiguration::wifi_default_client()
        })?;

        let mac = net_if.get_mac()?;
        *self.state.myid.write().await = format!(
            "esp32tempmon-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5],
        );

        let espwifi = EspWifi::wrap_all(wifidriver, net_if, EspNetif::new(netif::NetifStack::Ap)?)?;
        let mut wifi = AsyncWifi::wrap(espwifi, sysloop, timer)?;

        info!("WiFi setting credentials...");
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSID too long"))?,
            password: config
                .wifi_pass
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("Password too long"))?,
            ..Default::default()
        }))?;

        info!("WiFi driver starting...");
        Box::pin(wifi.start()).await?;
        self.wifi = Some(wifi);

        Box::pin(self.connect_loop(true)).await?;

        let ip_info = match &self.wifi {
            Some(wifi) => wifi.wifi().sta_netif().get_ip_info()?,
            None => bail!("WiFi driver missing"),
        };
        info!("WiFi up, address {}", ip_info.ip);
        *self.state.ip_addr.write().await = ip_info.ip;
        *self.state.wifi_up.write().await = true;

        Box::pin(self.connect_loop(false)).await
    }

    // Initial: give up after a timeout so main() can restart the chip.
    // Otherwise: wait for a drop and reconnect, forever.
    async fn connect_loop(&mut self, initial: bool) -> anyhow::Result<()> {
        let Some(wifi) = self.wifi.as_mut() else {
            bail!("WiFi driver missing");
        };
        loop {
            let timeout = initial.then_some(INITIAL_CONNECT_TIMEOUT);
            Box::pin(wifi.wifi_wait(|w| w.is_up(), timeout)).await.ok();

            info!("WiFi connecting...");
            Box::pin(wifi.connect()).await.ok();

            info!("WiFi waiting for association...");
            if let Err(e) = Box::pin(wifi.ip_wait_while(|w| w.is_up().map(|s| !s), None)).await {
                error!("WiFi error: {e:?}");
                if initial {
                    bail!(e);
                }
            }

            info!("WiFi connected.");
            if initial {
                return Ok(());
            }
        }
    }
}

// EOF
