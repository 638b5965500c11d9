//! Outer loop
//!
//! A single-threaded cooperative loop alternates one round of broker
//! message servicing with one camera fetch/decode/render cycle. All
//! suspension is blocking I/O inside the collaborators; nothing here is
//! concurrent, which is what makes the shared buffer and display safe.
//!
//! Liveness, evaluated once per iteration:
//! - broker session dead: blocking reconnect-and-resubscribe with a fixed
//!   5 s backoff, unbounded retries
//! - network association down: full device restart, no graceful degradation
//! - otherwise: service messages, then one camera cycle

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{debug, info, warn};

use crate::buffer::StreamBuffer;
use crate::config::Config;
use crate::fetch::{fetch_image, CameraClient, FetchLimits};
use crate::panel;
use crate::pipeline::{self, PipelineError};
use crate::surface;
use crate::telemetry::TelemetryState;
use crate::traits::{BrokerLink, NetworkLink, Platform};

/// Wait between broker connection attempts
pub const RECONNECT_BACKOFF_MS: u32 = 5_000;

/// What one loop iteration did, for supervision and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Serviced messages and ran a camera cycle
    Ran,
    /// Network loss escalated to a device restart
    Restarted,
}

/// Application state owned across loop iterations
pub struct App {
    camera_url: String,
    client_id: String,
    topics: crate::telemetry::TopicSet,
    limits: FetchLimits,
    telemetry: TelemetryState,
    buffer: StreamBuffer,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            camera_url: config.camera_url(),
            client_id: config.broker.client_id.clone(),
            topics: config.topic_set(),
            limits: config.fetch_limits(),
            telemetry: TelemetryState::default(),
            buffer: StreamBuffer::new(),
        }
    }

    /// Run forever. Only a device restart exits, and that re-enters
    /// initialization from scratch.
    pub fn run<B, N, C, P, D>(
        &mut self,
        broker: &mut B,
        network: &N,
        camera: &mut C,
        platform: &mut P,
        display: &mut D,
    ) where
        B: BrokerLink,
        N: NetworkLink,
        C: CameraClient,
        P: Platform,
        D: DrawTarget<Color = Rgb565>,
        D::Error: core::fmt::Debug,
    {
        loop {
            self.run_iteration(broker, network, camera, platform, display);
        }
    }

    /// One turn of the cooperative loop
    pub fn run_iteration<B, N, C, P, D>(
        &mut self,
        broker: &mut B,
        network: &N,
        camera: &mut C,
        platform: &mut P,
        display: &mut D,
    ) -> IterationOutcome
    where
        B: BrokerLink,
        N: NetworkLink,
        C: CameraClient,
        P: Platform,
        D: DrawTarget<Color = Rgb565>,
        D::Error: core::fmt::Debug,
    {
        if !broker.is_connected() {
            self.reconnect_broker(broker, platform);
        }

        if !network.is_up() {
            warn!("network association lost, restarting device");
            platform.restart();
            return IterationOutcome::Restarted;
        }

        let telemetry = &mut self.telemetry;
        let topics = &self.topics;
        let mut sink = |topic: &str, payload: &[u8]| {
            debug!("message on {topic} ({} bytes)", payload.len());
            if telemetry.apply(topics, topic, payload).is_none() {
                debug!("no matching field for {topic}");
            }
            // Redraw unconditionally, dispatched or not
            if let Err(e) = panel::draw_panel(telemetry, display) {
                warn!("panel redraw failed: {e:?}");
            }
        };
        if let Err(e) = broker.service(&mut sink) {
            warn!("broker service round failed: {e}");
        }

        self.camera_cycle(camera, display);
        IterationOutcome::Ran
    }

    /// Blocking reconnect-and-resubscribe. Retries indefinitely with a
    /// fixed backoff; nothing else can usefully run without the broker.
    fn reconnect_broker<B, P>(&self, broker: &mut B, platform: &mut P)
    where
        B: BrokerLink,
        P: Platform,
    {
        while !broker.is_connected() {
            info!("attempting broker connection as {}", self.client_id);
            match broker.connect(&self.client_id) {
                Ok(()) => {
                    info!("broker connected");
                    for topic in self.topics.iter() {
                        if let Err(e) = broker.subscribe(topic) {
                            warn!("subscribe to {topic} failed: {e}");
                        }
                    }
                }
                Err(e) => {
                    warn!("broker connect failed ({e}), retry in {RECONNECT_BACKOFF_MS} ms");
                    platform.sleep_ms(RECONNECT_BACKOFF_MS);
                }
            }
        }
    }

    /// One fetch + decode + render cycle. Every failure abandons the cycle
    /// with a log line; the next iteration re-fetches independently.
    fn camera_cycle<C, D>(&mut self, camera: &mut C, display: &mut D)
    where
        C: CameraClient,
        D: DrawTarget<Color = Rgb565>,
        D::Error: core::fmt::Debug,
    {
        let len = match fetch_image(camera, &self.camera_url, &mut self.buffer, &self.limits) {
            Ok(len) => len,
            Err(e) => {
                warn!("camera fetch failed: {e}");
                return;
            }
        };
        debug!("camera stream read successful ({len} bytes)");

        let mut region = display.clipped(&surface::camera_region());
        match pipeline::render_jpeg(self.buffer.as_slice(), &mut region) {
            Ok(()) => {}
            Err(PipelineError::TooWide { width, max }) => {
                warn!("picture is {width}px wide, must be <= {max}px");
            }
            Err(e) => warn!("camera frame dropped: {e}"),
        }
    }
}
