//! Mocked entities (useful for tests mostly).

use std::collections::HashMap;

use crate::io::{IoData, Pin, PinMode, PinModeId};

pub mod io_protocol;

/// Pins supporting PWM on the mocked board (same as an Arduino UNO).
pub const PWM_PINS: [u16; 6] = [3, 5, 6, 9, 10, 11];

fn mode(id: PinModeId, resolution: u8) -> PinMode {
    PinMode { id, resolution }
}

/// Creates a digital pin (named "D{id}"), configured as OUTPUT.
pub fn create_digital_pin(id: u16) -> Pin {
    let mut supported_modes = vec![
        mode(PinModeId::INPUT, 1),
        mode(PinModeId::OUTPUT, 1),
        mode(PinModeId::PULLUP, 1),
    ];
    if PWM_PINS.contains(&id) {
        supported_modes.push(mode(PinModeId::PWM, 8));
    }
    Pin {
        id,
        name: format!("D{}", id),
        mode: mode(PinModeId::OUTPUT, 1),
        supported_modes,
        ..Default::default()
    }
}

/// Creates an analog pin (named "A{id}") mapped to the given analog `channel`.
pub fn create_analog_pin(id: u16, channel: u8) -> Pin {
    Pin {
        id,
        name: format!("A{}", id),
        mode: mode(PinModeId::ANALOG, 10),
        supported_modes: vec![
            mode(PinModeId::INPUT, 1),
            mode(PinModeId::OUTPUT, 1),
            mode(PinModeId::ANALOG, 10),
        ],
        channel: Some(channel),
        ..Default::default()
    }
}

/// Creates the [`IoData`] of the mocked board: digital pins 0-13 and analog pins 14-19.
pub fn create_test_io_data() -> IoData {
    let mut pins = HashMap::new();
    for id in 0..14 {
        pins.insert(id, create_digital_pin(id));
    }
    for (channel, id) in (14..20).enumerate() {
        pins.insert(id, create_analog_pin(id, channel as u8));
    }
    IoData {
        pins,
        firmware_name: String::from("Fake firmware"),
        firmware_version: String::from("fake.1.0"),
        connected: false,
    }
}
