//! KeyBridge GATT service and the advertise / serve loop.

use defmt::{info, warn};
use embassy_time::Timer;
use heapless::Vec;
use keybridge::config::{
    BLE_ADV_INTERVAL, BLE_DEVICE_NAME, BLE_MAX_WRITE_LEN, BLE_SERVICE_UUID_LE, TEXT_QUEUE_CAPACITY,
};
use keybridge::counters::Counters;
use keybridge::dispatch::LinkEvent;
use keybridge::error::{BleError, Error};
use keybridge::hid::ReportOutput;
use keybridge::queue::{text_preview, TextWriter};
use keybridge::relay;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::peripheral::AdvertiseError;
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

use super::LINK_EVENTS;
use crate::ui;
use crate::usb::ChannelSink;

// The GATT macros only take string literals; the service UUID must match
// BLE_SERVICE_UUID in config.
#[nrf_softdevice::gatt_service(uuid = "4fafc201-1fb5-459e-8fcc-c5c9c331914b")]
pub struct KeyBridgeService {
    /// UTF-8 text, typed on the host one character at a time.
    #[characteristic(uuid = "beb5483e-36e1-4688-b7f5-ea07361b26a8", write, write_without_response)]
    pub text: Vec<u8, BLE_MAX_WRITE_LEN>,

    /// `[modifiers, usage, ..]`, relayed immediately. Trailing bytes are ignored.
    #[characteristic(uuid = "beb5483e-36e1-4688-b7f5-ea07361b26a9", write, write_without_response)]
    pub raw_key: Vec<u8, BLE_MAX_WRITE_LEN>,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bridge: KeyBridgeService,
}

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[BLE_SERVICE_UUID_LE])
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(BLE_DEVICE_NAME)
    .build();

/// Register the GATT server with the SoftDevice.
pub fn register(sd: &mut Softdevice) -> Result<Server, Error> {
    Server::new(sd).map_err(|e| {
        warn!("GATT server registration failed: {}", e);
        BleError::ServerRegistration.into()
    })
}

/// Connectable advertising until a central connects.
async fn advertise(sd: &Softdevice, config: &peripheral::Config) -> Result<Connection, Error> {
    info!("Advertising as \"{}\"", BLE_DEVICE_NAME);
    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: &ADV_DATA,
        scan_data: &SCAN_DATA,
    };
    peripheral::advertise_connectable(sd, adv, config)
        .await
        .map_err(|e| match e {
            AdvertiseError::Raw(raw) => BleError::Raw(raw as u32).into(),
            _ => BleError::AdvertiseFailed.into(),
        })
}

/// Advertise, serve one peer until it leaves, repeat.
#[embassy_executor::task]
pub async fn ble_task(
    sd: &'static Softdevice,
    server: &'static Server,
    mut text: TextWriter<'static, TEXT_QUEUE_CAPACITY>,
    counters: &'static Counters,
) -> ! {
    let mut raw_out = ReportOutput::new(ChannelSink::new());
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let conn = match advertise(sd, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Advertising failed: {}", e);
                Timer::after_secs(1).await;
                continue;
            }
        };

        info!("Peer connected");
        LINK_EVENTS.send(LinkEvent::Connected).await;

        let reason = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Bridge(KeyBridgeServiceEvent::TextWrite(data)) => {
                text.enqueue_text(&data);
                let preview = text_preview(&data);
                if !preview.is_empty() {
                    ui::set_last_text(preview);
                }
            }
            ServerEvent::Bridge(KeyBridgeServiceEvent::RawKeyWrite(data)) => {
                if let Err(e) = relay::relay_raw_write(&mut raw_out, &data, counters) {
                    warn!("Raw key write rejected: {}", e);
                }
            }
        })
        .await;

        info!("Peer disconnected: {}", reason);
        LINK_EVENTS.send(LinkEvent::Disconnected).await;
    }
}
