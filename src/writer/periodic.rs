//! Periodic encrypted-snapshot writer (spec.md §4.F).

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::aggregator::Aggregator;
use crate::codec;

use super::{format_row, CSV_HEADER};

/// Spawns the periodic writer thread. Wakes every `interval` seconds, takes
/// a snapshot of `aggregator`, and rewrites `path` from scratch with one
/// encrypted, framed record per row (spec.md §4.F).
pub fn spawn(
    aggregator: Arc<Aggregator>,
    path: PathBuf,
    key: [u8; 32],
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("periodic-writer".into())
        .spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                if let Err(e) = write_snapshot(&aggregator, &path, &key) {
                    tracing::warn!("periodic writer failed this tick, will retry: {e}");
                }
            }
        })
        .expect("failed to spawn periodic writer thread")
}

fn write_snapshot(aggregator: &Aggregator, path: &std::path::Path, key: &[u8; 32]) -> Result<(), crate::error::CodecError> {
    let file = File::create(path)?; // truncate-and-rewrite, per spec.md §4.F
    let mut out = BufWriter::new(file);

    codec::write_record(&mut out, key, CSV_HEADER.as_bytes())?;

    let now = SystemTime::now();
    for (key_row, stats) in aggregator.snapshot() {
        let line = format_row(&key_row, &stats, now);
        codec::write_record(&mut out, key, line.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FlowKey, PacketObservation, Transport};
    use std::io::Read;

    #[test]
    fn writes_header_then_one_record_per_flow() {
        let agg = Arc::new(Aggregator::new());
        agg.update(
            FlowKey {
                interface_label: "eth0".to_string(),
                peer_address: "10.0.0.1".to_string(),
                transport: Transport::Udp,
            },
            &PacketObservation {
                wire_len: 64,
                src_port: Some(1234),
                dst_port: Some(53),
                app_name: Some("example.com"),
                link_kind: "Ethernet II",
                now: SystemTime::now(),
            },
        );

        let dir = std::env::temp_dir();
        let path = dir.join(format!("netsentry-periodic-test-{:?}", std::thread::current().id()));
        let key = [5u8; 32];
        write_snapshot(&agg, &path, &key).unwrap();

        let mut bytes = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut bytes).unwrap();
        let mut cursor = std::io::Cursor::new(bytes);
        let header = codec::read_record(&mut cursor, &key).unwrap().unwrap();
        assert_eq!(header, CSV_HEADER.as_bytes());
        let row = codec::read_record(&mut cursor, &key).unwrap().unwrap();
        assert!(String::from_utf8(row).unwrap().contains("example.com"));
        assert!(codec::read_record(&mut cursor, &key).unwrap().is_none());

        let _ = std::fs::remove_file(&path);
    }
}
