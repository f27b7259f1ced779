//! CSV row formatting shared by the periodic and on-demand writers
//! (spec.md §4.F, §4.G).

pub mod ondemand;
pub mod periodic;

use std::time::SystemTime;

use crate::flow::{FlowKey, FlowStats};

pub const CSV_HEADER: &str =
    "Hours,Device,IP,Domain,Src Ports,Dest Ports,Protocol,EthType,MonthlyAvgFreq/s,MonthlyTotalFreq,MonthlyTotalBytes,mdns_dns_name";

fn join_or_na(values: impl Iterator<Item = String>) -> String {
    let joined = values.collect::<Vec<_>>().join(";");
    if joined.is_empty() {
        "n/a".to_string()
    } else {
        joined
    }
}

/// Formats one aggregator row as a CSV line, matching the column order and
/// `"n/a"` sentinel behaviour of `original_source/BG-Realtime-Parsing.cpp`'s
/// `write_encrypted_csv_line` caller (spec.md §4.F).
pub fn format_row(key: &FlowKey, stats: &FlowStats, now: SystemTime) -> String {
    let hours = join_or_na(stats.hours_seen.iter().map(|h| format!("{h:02}")));
    let src_ports = join_or_na(stats.src_ports.iter().cloned());
    let dst_ports = join_or_na(stats.dst_ports.iter().cloned());
    let domain = if stats.app_name.is_empty() {
        "n/a".to_string()
    } else {
        stats.app_name.clone()
    };
    let avg_pps = stats.monthly_avg_pps(now);

    format!(
        "{hours},{device},{ip},{domain},{src_ports},{dst_ports},{protocol},{eth_type},{avg_pps},{packet_count},{byte_count},{domain_again}",
        hours = hours,
        device = key.interface_label,
        ip = key.peer_address,
        domain = domain,
        src_ports = src_ports,
        dst_ports = dst_ports,
        protocol = key.transport.as_str(),
        eth_type = stats.link_kind,
        avg_pps = avg_pps,
        packet_count = stats.packet_count,
        byte_count = stats.byte_count,
        domain_again = domain,
    )
}
