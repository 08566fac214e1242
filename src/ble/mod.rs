//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Advertiser** - connectable advertising of the KeyBridge service,
//!    restarted after every disconnect.
//! 2. **GATT server** - two write characteristics: free text (queued and
//!    typed by the dispatcher) and raw key events (relayed on the spot).
//!
//! Link edges are posted to [`LINK_EVENTS`]; the main loop consumes at
//! most one per tick.

pub mod server;

use core::mem;

use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use keybridge::config::{BLE_ATT_MTU, BLE_DEVICE_NAME};
use keybridge::dispatch::LinkEvent;
use nrf_softdevice::{raw, SocEvent, Softdevice};

// POWER.USBREGSTATUS bits.
const USBREGSTATUS_VBUSDETECT: u32 = 1 << 0;
const USBREGSTATUS_OUTPUTRDY: u32 = 1 << 1;

/// Connect / disconnect edges for the dispatcher.
pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, 4> = Channel::new();

/// SoftDevice configuration: one peripheral link, large MTU for text writes.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: BLE_ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: BLE_DEVICE_NAME.as_ptr() as _,
            current_len: BLE_DEVICE_NAME.len() as u16,
            max_len: BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// SoftDevice event pump. Also forwards USB power events to the USB driver,
/// since the SoftDevice owns the POWER peripheral.
#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice, vbus: &'static SoftwareVbusDetect) -> ! {
    unsafe {
        raw::sd_power_usbpwrrdy_enable(1);
        raw::sd_power_usbdetected_enable(1);
        raw::sd_power_usbremoved_enable(1);
    }

    // Cable may already be plugged in at boot: no event for that.
    let mut usb_reg: u32 = 0;
    unsafe { raw::sd_power_usbregstatus_get(&mut usb_reg) };
    if usb_reg & USBREGSTATUS_VBUSDETECT != 0 {
        vbus.detected(true);
    }
    if usb_reg & USBREGSTATUS_OUTPUTRDY != 0 {
        vbus.ready();
    }

    sd.run_with_callback(|event: SocEvent| match event {
        SocEvent::PowerUsbRemoved => {
            defmt::info!("USB power removed");
            vbus.detected(false);
        }
        SocEvent::PowerUsbDetected => vbus.detected(true),
        SocEvent::PowerUsbPowerReady => vbus.ready(),
        _ => {}
    })
    .await
}
