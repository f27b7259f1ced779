//! `pcap`-crate-backed [`CaptureDriver`] (spec.md §6), the direct analogue
//! of `original_source`'s `<pcap.h>` usage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pcap::{Active, Capture, Device};

use crate::config::{CAPTURE_SNAPLEN, CAPTURE_TIMEOUT_MS};
use crate::error::CaptureError;

use super::{CaptureDriver, CaptureSession, InterfaceDescriptor};

pub struct PcapDriver;

impl CaptureDriver for PcapDriver {
    type Session = PcapSession;

    fn enumerate_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, CaptureError> {
        let devices = Device::list().map_err(|e| CaptureError::Enumerate(e.to_string()))?;
        Ok(devices
            .into_iter()
            .map(|d| InterfaceDescriptor {
                human_description: d.desc.clone().unwrap_or_else(|| d.name.clone()),
                system_name: d.name,
            })
            .collect())
    }

    fn open_live(&self, name: &str) -> Result<Self::Session, CaptureError> {
        let device = Device::from(name);
        let capture = Capture::from_device(device)
            .map_err(|e| CaptureError::Open {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .promisc(true)
            .snaplen(CAPTURE_SNAPLEN)
            .timeout(CAPTURE_TIMEOUT_MS)
            .open()
            .map_err(|e| CaptureError::Open {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(PcapSession {
            name: name.to_string(),
            capture,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    fn compile_and_set_filter(&self, session: &mut Self::Session, bpf_text: &str) -> Result<(), CaptureError> {
        session
            .capture
            .filter(bpf_text, true)
            .map_err(|e| CaptureError::FilterCompile {
                name: session.name.clone(),
                filter: bpf_text.to_string(),
                reason: e.to_string(),
            })
    }
}

pub struct PcapSession {
    name: String,
    capture: Capture<Active>,
    shutdown: Arc<AtomicBool>,
}

impl CaptureSession for PcapSession {
    fn read_loop(&mut self, on_frame: &mut dyn FnMut(u64, &[u8])) -> Result<(), CaptureError> {
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.capture.next_packet() {
                Ok(packet) => on_frame(packet.header.len as u64, packet.data),
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => return Ok(()),
                Err(e) => {
                    return Err(CaptureError::Read {
                        name: self.name.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn break_loop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    fn breaker(&self) -> Arc<dyn Fn() + Send + Sync> {
        let shutdown = Arc::clone(&self.shutdown);
        Arc::new(move || shutdown.store(true, Ordering::Relaxed))
    }
}
