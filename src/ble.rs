//! Bluetooth LE transport for printers exposed over a GATT serial bridge.

use std::time::Duration;

use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Manager, Peripheral};
use futures::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::printer::{FrameSink, ADDRESS_PREFIX};

/// Conservative MTU-3; btleplug does not expose the negotiated MTU.
pub const CHUNK_SIZE: usize = 182;

const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Which advertisement to connect to, and which characteristic to write.
#[derive(Debug, Clone)]
pub struct BleTarget {
    pub address_prefix: String,
    pub name_pattern: Option<Regex>,
    /// UUID of the write characteristic. Without one, the first characteristic
    /// advertising `WRITE` is used, which on a device exposing several
    /// services may not be the printer's data channel.
    pub write_char_uuid: Option<String>,
}

impl Default for BleTarget {
    fn default() -> Self {
        Self {
            address_prefix: ADDRESS_PREFIX.to_string(),
            name_pattern: None,
            write_char_uuid: None,
        }
    }
}

impl BleTarget {
    fn matches(&self, address: &str, name: Option<&str>) -> bool {
        let by_address = address
            .get(..self.address_prefix.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(&self.address_prefix));
        let by_name = match (&self.name_pattern, name) {
            (Some(re), Some(name)) => re.is_match(name),
            _ => false,
        };
        by_address || by_name
    }

    fn accepts_characteristic(&self, uuid: &str, properties: CharPropFlags) -> bool {
        if !properties.contains(CharPropFlags::WRITE) {
            return false;
        }
        match &self.write_char_uuid {
            Some(wanted) => uuid.eq_ignore_ascii_case(wanted),
            None => true,
        }
    }
}

/// A connected printer. Owns a private Tokio runtime so that callers stay
/// synchronous.
pub struct BleSink {
    runtime: Runtime,
    peripheral: Peripheral,
    write_char: Characteristic,
}

fn bt<E: std::fmt::Display>(e: E) -> Error {
    Error::Bluetooth(e.to_string())
}

impl BleSink {
    /// Scan for up to ten seconds and connect to the first match.
    pub fn connect(target: &BleTarget) -> Result<Self> {
        let runtime = Runtime::new()?;
        let (peripheral, write_char) = runtime.block_on(scan_and_connect(target))?;
        Ok(Self {
            runtime,
            peripheral,
            write_char,
        })
    }

    pub fn disconnect(self) -> Result<()> {
        info!("Disconnecting...");
        self.runtime
            .block_on(self.peripheral.disconnect())
            .map_err(bt)
    }
}

impl FrameSink for BleSink {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        info!("Sending frame ({} bytes) over BLE", frame.len());
        let result = self
            .runtime
            .block_on(write_chunked(&self.peripheral, &self.write_char, frame));
        if let Err(e) = &result {
            error!("Print error: {}", e);
        } else {
            info!("Print complete");
        }
        result
    }
}

async fn scan_and_connect(target: &BleTarget) -> Result<(Peripheral, Characteristic)> {
    let manager = Manager::new().await.map_err(bt)?;
    // Let the platform stack settle before scanning
    tokio::time::sleep(Duration::from_millis(200)).await;

    let adapter = manager
        .adapters()
        .await
        .map_err(bt)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Bluetooth("No Bluetooth adapter found".into()))?;

    info!("Scanning for printers ({}s)...", SCAN_TIMEOUT.as_secs());
    adapter.start_scan(ScanFilter::default()).await.map_err(bt)?;
    let mut events = adapter.events().await.map_err(bt)?;
    let deadline = tokio::time::Instant::now() + SCAN_TIMEOUT;

    let mut found = None;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, events.next()).await {
            Ok(Some(CentralEvent::DeviceDiscovered(id))) => {
                let peripheral = adapter.peripheral(&id).await.map_err(bt)?;
                if let Ok(Some(props)) = peripheral.properties().await {
                    let address = props.address.to_string();
                    debug!("Discovered {} {:?}", address, props.local_name);
                    if target.matches(&address, props.local_name.as_deref()) {
                        info!("Found: {}", address);
                        found = Some(peripheral);
                        break;
                    }
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    adapter.stop_scan().await.ok();

    let peripheral =
        found.ok_or_else(|| Error::Bluetooth("No compatible printer found nearby".into()))?;

    peripheral.connect().await.map_err(bt)?;
    peripheral.discover_services().await.map_err(bt)?;

    let write_char = peripheral
        .characteristics()
        .into_iter()
        .find(|c| target.accepts_characteristic(&c.uuid.to_string(), c.properties))
        .ok_or_else(|| Error::Bluetooth("Write characteristic not found".into()))?;
    info!(
        "Connected, writing to {} (chunk size: {} bytes)",
        write_char.uuid, CHUNK_SIZE
    );

    Ok((peripheral, write_char))
}

/// Write `data` in [`CHUNK_SIZE`] pieces with write-with-response, stopping at
/// the first failed chunk.
async fn write_chunked(
    peripheral: &Peripheral,
    write_char: &Characteristic,
    data: &[u8],
) -> Result<()> {
    let total = data.len();
    for (i, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
        peripheral
            .write(write_char, chunk, WriteType::WithResponse)
            .await
            .map_err(bt)?;
        if i % 4 == 0 {
            debug!("Sent {}/{} bytes", ((i + 1) * CHUNK_SIZE).min(total), total);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_matches_address_prefix() {
        let target = BleTarget::default();
        assert!(target.matches("42:21:BB:2C:01:02", None));
        assert!(target.matches("42:21:bb:2c:01:02", Some("anything")));
        assert!(!target.matches("42:21:BB:2D:01:02", None));
        assert!(!target.matches("42:21", None));
    }

    #[test]
    fn test_target_matches_name_pattern() {
        let target = BleTarget {
            address_prefix: "00:00".into(),
            name_pattern: Some(Regex::new(r"(?i)^sticker").unwrap()),
            write_char_uuid: None,
        };
        assert!(target.matches("11:22:33:44:55:66", Some("Sticker-P1")));
        assert!(!target.matches("11:22:33:44:55:66", Some("Headphones")));
        assert!(!target.matches("11:22:33:44:55:66", None));
    }

    #[test]
    fn test_write_characteristic_selection() {
        const DATA: &str = "49535343-8841-43f4-a8d4-ecbe34729bb3";
        const OTHER: &str = "00002a00-0000-1000-8000-00805f9b34fb";

        let any = BleTarget::default();
        assert!(any.accepts_characteristic(OTHER, CharPropFlags::WRITE));
        assert!(!any.accepts_characteristic(DATA, CharPropFlags::READ | CharPropFlags::NOTIFY));

        let pinned = BleTarget {
            write_char_uuid: Some(DATA.to_uppercase()),
            ..BleTarget::default()
        };
        assert!(pinned.accepts_characteristic(DATA, CharPropFlags::WRITE | CharPropFlags::READ));
        assert!(!pinned.accepts_characteristic(OTHER, CharPropFlags::WRITE));
        assert!(!pinned.accepts_characteristic(DATA, CharPropFlags::WRITE_WITHOUT_RESPONSE));
    }

    #[test]
    fn test_frame_splits_into_whole_chunks() {
        let frame = [0u8; crate::protocol::FRAME_LEN];
        let chunks: Vec<usize> = frame.chunks(CHUNK_SIZE).map(|c| c.len()).collect();
        assert_eq!(chunks.len(), 16);
        assert_eq!(chunks[15], 2892 - 15 * CHUNK_SIZE);
    }
}
