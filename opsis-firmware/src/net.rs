//! Wi-Fi association
//!
//! Brings the station interface up during boot and afterwards only
//! answers the liveness question for the outer loop. Association loss is
//! handled by the loop (device restart), not here.

use core::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::info;

use opsis_core::config::WifiConfig;
use opsis_core::traits::NetworkLink;

/// Station-mode Wi-Fi association
pub struct EspNetwork {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl EspNetwork {
    /// Associate with the configured access point, blocking until the
    /// interface is up
    pub fn connect(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sys_loop.clone(), Some(nvs))?,
            sys_loop,
        )?;

        let ssid: heapless::String<32> = config
            .ssid
            .as_str()
            .try_into()
            .map_err(|()| anyhow::anyhow!("ssid longer than 32 bytes"))?;
        let password: heapless::String<64> = config
            .password
            .as_str()
            .try_into()
            .map_err(|()| anyhow::anyhow!("password longer than 64 bytes"))?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        }))?;

        info!("Connecting to WiFi {}", config.ssid);
        wifi.start()?;
        wifi.connect()?;
        wifi.wait_netif_up()?;

        Ok(Self { wifi })
    }
}

impl NetworkLink for EspNetwork {
    fn is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn local_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }
}
