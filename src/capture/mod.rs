//! Packet-capture driver abstraction (spec.md §4.E, §6) and capture worker
//! threads, in the style of the teacher's background-thread services.

pub mod pcap_driver;
pub mod worker;

use std::sync::Arc;

use crate::error::CaptureError;

/// One enumerated capture-capable interface.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    pub system_name: String,
    pub human_description: String,
}

/// A live, filtered capture handle on one interface.
pub trait CaptureSession: Send {
    /// Blocks reading frames until the session is asked to break out, calling
    /// `on_frame(wire_len, captured_bytes)` for each one.
    fn read_loop(&mut self, on_frame: &mut dyn FnMut(u64, &[u8])) -> Result<(), CaptureError>;

    /// Requests the in-progress (or next) `read_loop` call to return.
    fn break_loop(&self);

    /// A cloneable handle that calls [`CaptureSession::break_loop`], obtained
    /// before the session is moved into its worker thread (spec.md §4.H).
    fn breaker(&self) -> Arc<dyn Fn() + Send + Sync>;
}

/// External collaborator: the OS packet-capture library (spec.md §6).
pub trait CaptureDriver {
    type Session: CaptureSession;

    fn enumerate_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, CaptureError>;

    fn open_live(&self, name: &str) -> Result<Self::Session, CaptureError>;

    fn compile_and_set_filter(&self, session: &mut Self::Session, bpf_text: &str) -> Result<(), CaptureError>;
}

/// A restricted BPF filter preset, composed as the boolean OR of
/// `udp port P` / `tcp port P` atoms (spec.md §4.E). `None` means "capture
/// everything" — the all-protocols binary installs no filter.
#[derive(Debug, Clone)]
pub struct BpfPreset {
    ports: Vec<u16>,
}

impl BpfPreset {
    pub fn ports(ports: &[u16]) -> Self {
        BpfPreset {
            ports: ports.to_vec(),
        }
    }

    /// The VPN/IKE/WireGuard preset used by `capture-vpn` (spec.md §2).
    pub fn vpn() -> Self {
        Self::ports(&[500, 4500, 51820])
    }

    /// The DNS+BGP preset used by `capture-dns-bgp` (spec.md §2).
    pub fn dns_bgp() -> Self {
        Self::ports(&[53, 179])
    }

    pub fn filter_expression(&self) -> String {
        self.ports
            .iter()
            .map(|p| format!("udp port {p} or tcp port {p}"))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
