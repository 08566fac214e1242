//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, queue sizing, and protocol identifiers live
//! here so they can be tuned in one place.

// Scheduling

/// Minimum spacing between two characters typed from the text queue (ms).
/// Faster than this and some hosts start dropping injected keystrokes.
pub const CHAR_PACING_MS: u32 = 2;

/// Status display refresh interval (ms).
pub const DISPLAY_REFRESH_MS: u32 = 50;

/// Bounds of the randomised idle delay between two pointer nudges (ms, inclusive).
pub const MOTION_DELAY_MIN_MS: u32 = 7_000;
pub const MOTION_DELAY_MAX_MS: u32 = 60_000;

/// Size of a single pointer nudge in pixels (moved right, then back left).
pub const MOTION_STEP_PX: i8 = 1;

/// How long the display highlights a fresh pointer nudge (ms).
pub const MOTION_FLASH_MS: u32 = 500;

/// Fixed yield of the main polling loop (ms).
pub const LOOP_YIELD_MS: u64 = 1;

// Text relay

/// Ring size of the text queue. One slot stays reserved, so at most
/// `TEXT_QUEUE_CAPACITY - 1` characters can be pending.
pub const TEXT_QUEUE_CAPACITY: usize = 4096;

/// Number of characters of the latest text write kept for the display.
pub const TEXT_PREVIEW_LEN: usize = 12;

// BLE

/// GAP device name, also sent in the scan response.
pub const BLE_DEVICE_NAME: &str = "KeyBridge";

/// KeyBridge GATT service. Repeated as a literal in `ble::server`
/// because the GATT macros only accept string literals.
pub const BLE_SERVICE_UUID: u128 = 0x4fafc201_1fb5_459e_8fcc_c5c9c331914b;

/// Service UUID in over-the-air (little-endian) byte order for advertising.
pub const BLE_SERVICE_UUID_LE: [u8; 16] = BLE_SERVICE_UUID.to_le_bytes();

/// Negotiated ATT MTU. Writes carry at most `MTU - 3` bytes.
pub const BLE_ATT_MTU: u16 = 247;
pub const BLE_MAX_WRITE_LEN: usize = BLE_ATT_MTU as usize - 3;

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const BLE_ADV_INTERVAL: u32 = 160;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "keybridge";
pub const USB_PRODUCT: &str = "KeyBridge + Mouse Mover";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms). 1 ms = 1000 Hz for lowest latency.
pub const USB_HID_POLL_MS: u8 = 1;

/// Depth of the report channel between the relay paths and the USB writer.
pub const HID_REPORT_QUEUE_DEPTH: usize = 32;

// GPIO pin assignments (nRF52840-DK defaults)
//
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_uuid_matches_gatt_literal() {
        let hex: heapless::String<32> = "4fafc201-1fb5-459e-8fcc-c5c9c331914b"
            .chars()
            .filter(|c| *c != '-')
            .collect();
        assert_eq!(u128::from_str_radix(&hex, 16), Ok(BLE_SERVICE_UUID));
    }

    #[test]
    fn advertised_uuid_is_little_endian() {
        assert_eq!(BLE_SERVICE_UUID_LE[0], 0x4b);
        assert_eq!(BLE_SERVICE_UUID_LE[15], 0x4f);
    }

    #[test]
    fn write_len_fits_negotiated_mtu() {
        assert_eq!(BLE_MAX_WRITE_LEN, 244);
    }
}
