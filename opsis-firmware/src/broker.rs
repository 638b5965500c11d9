//! MQTT broker link
//!
//! The ESP-IDF MQTT client runs its own internal task; its event callback
//! only flips the liveness flag and queues (topic, payload) pairs. The
//! outer loop drains the queue from the single thread of control, so
//! dispatch and panel redraws stay strictly ordered by arrival.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use esp_idf_svc::sys::EspError;
use log::{info, warn};
use thiserror::Error;

use opsis_core::config::BrokerConfig;
use opsis_core::traits::BrokerLink;

/// How long one connect attempt waits for the CONNECTED event
const CONNECT_WAIT_MS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("esp-idf: {0}")]
    Esp(#[from] EspError),
    #[error("no live broker session")]
    NotConnected,
    #[error("broker did not accept the connection in time")]
    ConnectTimeout,
}

/// Broker link over the ESP-IDF MQTT client
pub struct EspBroker {
    url: String,
    client: Option<EspMqttClient<'static>>,
    connected: Arc<AtomicBool>,
    rx: Receiver<(String, Vec<u8>)>,
    tx: Sender<(String, Vec<u8>)>,
}

impl EspBroker {
    pub fn new(config: &BrokerConfig) -> Self {
        let (tx, rx) = channel();
        Self {
            url: format!("mqtt://{}:{}", config.host, config.port),
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            rx,
            tx,
        }
    }
}

impl BrokerLink for EspBroker {
    type Error = BrokerError;

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Relaxed)
    }

    fn connect(&mut self, client_id: &str) -> Result<(), BrokerError> {
        // Drop any dead session before building a fresh one
        self.client = None;
        self.connected.store(false, Ordering::Relaxed);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let connected = Arc::clone(&self.connected);
        let tx = self.tx.clone();

        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    connected.store(true, Ordering::Relaxed);
                }
                EventPayload::Disconnected => {
                    connected.store(false, Ordering::Relaxed);
                }
                EventPayload::Received { topic, data, .. } => {
                    if let Some(topic) = topic {
                        if tx.send((topic.to_string(), data.to_vec())).is_err() {
                            warn!("inbound message dropped, queue receiver gone");
                        }
                    }
                }
                _ => {}
            }
        })?;
        self.client = Some(client);

        // The CONNECTED event arrives from the client task; wait for it so
        // the caller's is_connected() gate sees a settled answer
        let mut waited = 0u32;
        while !self.connected.load(Ordering::Relaxed) {
            if waited >= CONNECT_WAIT_MS {
                self.client = None;
                return Err(BrokerError::ConnectTimeout);
            }
            FreeRtos::delay_ms(100);
            waited += 100;
        }
        info!("broker session established at {}", self.url);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client.subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    fn service(&mut self, sink: &mut dyn FnMut(&str, &[u8])) -> Result<(), BrokerError> {
        while let Ok((topic, payload)) = self.rx.try_recv() {
            sink(&topic, &payload);
        }
        Ok(())
    }
}
