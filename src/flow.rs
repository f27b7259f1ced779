//! Flow identity and per-flow accumulator (spec.md §3, §4.C).

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

/// Transport-layer label. `Other` covers non-TCP/UDP IP payloads (ICMP, ESP, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
    Other,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "TCP",
            Transport::Udp => "UDP",
            Transport::Other => "OTHER",
        }
    }
}

/// Canonical flow identity: (capture interface, source address, transport).
///
/// Destination and source ports are intentionally excluded from the key —
/// they accumulate in [`FlowStats`] instead, so an N:1 server-side pattern
/// collapses onto a single row (spec.md §4.C).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub interface_label: String,
    pub peer_address: String,
    pub transport: Transport,
}

/// Mutable per-flow accumulator, owned by the [`crate::aggregator::Aggregator`].
#[derive(Debug, Clone)]
pub struct FlowStats {
    pub packet_count: u64,
    pub byte_count: u64,
    pub src_ports: BTreeSet<String>,
    pub dst_ports: BTreeSet<String>,
    pub first_seen: SystemTime,
    pub last_seen: SystemTime,
    pub month_anchor: SystemTime,
    pub hours_seen: BTreeSet<u8>,
    pub app_name: String,
    pub link_kind: String,
}

/// The result of decoding one packet, handed from a capture worker to the
/// aggregator's [`FlowStats::apply`] (spec.md §4.C step list).
pub struct PacketObservation<'a> {
    pub wire_len: u64,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub app_name: Option<&'a str>,
    pub link_kind: &'a str,
    pub now: SystemTime,
}

impl FlowStats {
    fn new_at(now: SystemTime) -> Self {
        FlowStats {
            packet_count: 0,
            byte_count: 0,
            src_ports: BTreeSet::new(),
            dst_ports: BTreeSet::new(),
            first_seen: now,
            last_seen: now,
            month_anchor: start_of_month(now),
            hours_seen: BTreeSet::new(),
            app_name: String::new(),
            link_kind: String::new(),
        }
    }

    /// Creates a freshly-seen flow's stats, applying the first observation.
    pub fn first(obs: &PacketObservation) -> Self {
        let mut stats = FlowStats::new_at(obs.now);
        stats.apply(obs);
        stats
    }

    /// Folds one packet observation into an existing flow (spec.md §4.C
    /// update steps 3-7). `first_seen`/`month_anchor` are untouched here —
    /// they are set once at creation by [`FlowStats::first`].
    pub fn apply(&mut self, obs: &PacketObservation) {
        self.last_seen = obs.now;
        self.packet_count += 1;
        self.byte_count += obs.wire_len;
        if let Some(port) = obs.src_port {
            self.src_ports.insert(port.to_string());
        }
        if let Some(port) = obs.dst_port {
            self.dst_ports.insert(port.to_string());
        }
        self.hours_seen.insert(local_hour(obs.now));
        if let Some(name) = obs.app_name {
            if !name.is_empty() {
                self.app_name = name.to_string();
            }
        }
        self.link_kind = obs.link_kind.to_string();
    }

    /// `packet_count / max(1, now - month_anchor)`, per spec.md §4.F.
    pub fn monthly_avg_pps(&self, now: SystemTime) -> f64 {
        let elapsed = now
            .duration_since(self.month_anchor)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.packet_count as f64 / elapsed.max(1) as f64
    }
}

fn local_hour(t: SystemTime) -> u8 {
    to_local(t).hour() as u8
}

fn start_of_month(t: SystemTime) -> SystemTime {
    let local = to_local(t);
    let anchor = Local
        .with_ymd_and_hms(local.year(), local.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(local);
    UNIX_EPOCH + std::time::Duration::from_secs(anchor.timestamp().max(0) as u64)
}

fn to_local(t: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(t)
}
