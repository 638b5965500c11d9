//! Board services for the main loop

use esp_idf_hal::delay::FreeRtos;

use opsis_core::traits::Platform;

/// FreeRTOS-backed delay and reset
pub struct EspPlatform;

impl Platform for EspPlatform {
    fn sleep_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }

    fn restart(&mut self) {
        esp_idf_hal::reset::restart();
    }
}
