// bin/esp32tempmon.rs

#![warn(clippy::large_futures)]

use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use esp32tempmon::*;
use log::*;
use tokio::sync::mpsc;

fn main() -> anyhow::Result<()> {
    platform::run()
}

async fn run_tasks<S, P>(state: Arc<MyState>, device: Device<S, P>, events: mpsc::Receiver<ChannelEvent>)
where
    S: Sampler,
    P: OutputPin,
{
    info!("Entering main loop...");
    tokio::select! {
        _ = Box::pin(run_control_loop(state.clone(), device, events)) => { error!("run_control_loop() ended."); }
        _ = Box::pin(run_api_server(state.clone())) => { error!("run_api_server() ended."); }
        _ = Box::pin(poll_uptime(state.clone())) => { error!("poll_uptime() ended."); }
    };
}

#[cfg(target_os = "espidf")]
mod platform {
    use super::*;

    use anyhow::anyhow;
    use esp_idf_hal::{
        delay::FreeRtos,
        gpio::{IOPin, OutputPin as _, PinDriver, Pull},
        prelude::Peripherals,
    };
    use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs, timer::EspTaskTimerService, wifi::WifiDriver};
    use esp_idf_sys::{esp, esp_app_desc};
    use one_wire_bus::OneWire;

    esp_app_desc!();

    pub fn run() -> anyhow::Result<()> {
        esp_idf_sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        // eventfd is needed by our mio poll implementation.  Note you should set max_fds
        // higher if you have other code that may need eventfd.
        #[allow(clippy::needless_update)]
        let eventfd_config = esp_idf_sys::esp_vfs_eventfd_config_t {
            max_fds: 1,
            ..Default::default()
        };
        esp! { unsafe { esp_idf_sys::esp_vfs_eventfd_register(&eventfd_config) } }?;

        info!("esp32tempmon {FW_VERSION} built {BUILD_TIMESTAMP}");

        let sysloop = EspSystemEventLoop::take()?;
        let timer = EspTaskTimerService::new()?;
        let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;

        let ns = env!("CARGO_BIN_NAME");
        let mut nvs = nvs::EspNvs::new(nvs_default_partition.clone(), ns, true)
            .map_err(|e| anyhow!("Could not get namespace {ns}: {e:?}"))?;
        info!("Got namespace {ns:?} from default partition");

        #[cfg(feature = "reset_settings")]
        let config = {
            let c = MyConfig::default();
            c.to_nvs(&mut nvs)?;
            c
        };

        #[cfg(not(feature = "reset_settings"))]
        let config = match MyConfig::from_nvs(&mut nvs).filter(|c| c.validate().is_ok()) {
            None => {
                error!("Could not read nvs config, using defaults");
                let c = MyConfig::default();
                c.to_nvs(&mut nvs)?;
                info!("Successfully saved default config to nvs.");
                c
            }
            Some(c) => c,
        };
        info!("My config:\n{config:#?}");

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        #[cfg(feature = "esp32c3")]
        let (onewire_pin, led_pins) = (
            pins.gpio4.downgrade(),
            [
                pins.gpio5.downgrade_output(),
                pins.gpio6.downgrade_output(),
                pins.gpio7.downgrade_output(),
                pins.gpio10.downgrade_output(),
            ],
        );

        #[cfg(all(feature = "esp32s", not(feature = "esp32c3")))]
        let (onewire_pin, led_pins) = (
            pins.gpio4.downgrade(),
            [
                pins.gpio18.downgrade_output(),
                pins.gpio19.downgrade_output(),
                pins.gpio21.downgrade_output(),
                pins.gpio22.downgrade_output(),
            ],
        );

        let [conn_pin, read_pin, rec_pin, alert_pin] = led_pins;
        let indicators = Indicators::new(
            PinDriver::output(conn_pin)?,
            PinDriver::output(read_pin)?,
            PinDriver::output(rec_pin)?,
            PinDriver::output(alert_pin)?,
        );

        info!("Scanning 1-wire bus...");
        let mut pin_drv = PinDriver::input_output_od(onewire_pin)?;
        pin_drv.set_pull(Pull::Up)?;
        let bus = OneWire::new(pin_drv).map_err(|e| anyhow!("1-wire init failed: {e:?}"))?;
        let sampler = match Ds18b20Sampler::new(bus) {
            Ok(s) => s,
            Err(e) => {
                error!("No usable DS18B20: {e:?}, rebooting.");
                FreeRtos::delay_ms(3000);
                esp_idf_hal::reset::restart();
            }
        };

        let wifidriver = WifiDriver::new(peripherals.modem, sysloop.clone(), Some(nvs_default_partition))?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_LEN);
        let shared_state = Arc::new(MyState::new(config, events_tx));

        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(Box::pin(async move {
                let device = Device::new(&shared_state.config, sampler, indicators, Instant::now());
                let wifi_loop = WifiLoop::new(shared_state.clone());

                tokio::select! {
                    _ = Box::pin(run_tasks(shared_state.clone(), device, events_rx)) => {}
                    _ = Box::pin(wifi_loop.run(wifidriver, sysloop, timer)) => { error!("wifi_loop.run() ended."); }
                };
            }));

        // not actually returning from main() but we reboot instead
        info!("main() finished, reboot.");
        FreeRtos::delay_ms(3000);
        esp_idf_hal::reset::restart();
    }
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        info!("esp32tempmon {FW_VERSION} built {BUILD_TIMESTAMP}, simulated hardware");

        let config = MyConfig::default();
        config.validate()?;
        info!("My config:\n{config:#?}");

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_LEN);
        let shared_state = Arc::new(MyState::new(config, events_tx));

        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(Box::pin(async move {
                let indicators = Indicators::new(
                    SimPin::new("connection"),
                    SimPin::new("read"),
                    SimPin::new("recording"),
                    SimPin::new("alert"),
                );
                let device = Device::new(&shared_state.config, SimSampler::default(), indicators, Instant::now());

                // the host network is already there
                *shared_state.wifi_up.write().await = true;
                run_tasks(shared_state, device, events_rx).await;
            }));

        info!("main() finished.");
        Ok(())
    }
}

// EOF
