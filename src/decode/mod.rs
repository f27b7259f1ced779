//! Layer-decoder orchestration (spec.md §4.B): Ethernet/VLAN through
//! application-layer name extraction, composed into one `decode_packet`
//! entry point used by every capture worker.

pub mod dns;
pub mod ethernet;
pub mod http;
pub mod ikev2;
pub mod ip;
pub mod tls;
pub mod transport;

use crate::byte_reader::PacketCursor;
use crate::flow::Transport;
use ethernet::{parse_ethernet, ETHERTYPE_IPV4, ETHERTYPE_IPV6};
use ikev2::{parse_ikev2_header, strip_non_esp_marker};
use ip::{parse_ip, IpProto};
use transport::{parse_tcp, parse_udp};

const PORT_MDNS: u16 = 5353;
const PORT_DNS: u16 = 53;
const PORT_TLS: u16 = 443;
const PORT_HTTP: u16 = 80;
const PORT_IKE: u16 = 500;
const PORT_IKE_NATT: u16 = 4500;

/// The outcome of decoding one captured frame, ready to fold into the
/// Aggregator as a [`crate::flow::PacketObservation`].
pub struct DecodedPacket {
    pub src_addr: String,
    pub transport: Transport,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub app_name: Option<String>,
    pub link_kind: &'static str,
    /// Set when this packet is recognised IKEv2/NAT-T traffic on UDP
    /// ports 500/4500 (spec.md §4.B). Not folded into flow stats; no
    /// special IKEv2 field is required there.
    pub ike_exchange: Option<&'static str>,
}

/// Decodes one frame from Ethernet through application-layer name
/// extraction. Returns `None` (not an error) for anything not worth a flow
/// update: unrecognised link/network layers, or IP traffic whose transport
/// decode also fails.
pub fn decode_packet(buf: &[u8]) -> Option<DecodedPacket> {
    let cur = PacketCursor::new(buf);
    let (eth, cur) = parse_ethernet(cur).ok()?;
    if eth.ethertype != ETHERTYPE_IPV4 && eth.ethertype != ETHERTYPE_IPV6 {
        return None;
    }
    let (ip_hdr, cur) = parse_ip(cur).ok()?;

    let (transport, src_port, dst_port, payload) = match ip_hdr.proto {
        IpProto::Tcp => {
            let (hdr, rest) = parse_tcp(cur).ok()?;
            (Transport::Tcp, Some(hdr.src_port), Some(hdr.dst_port), rest)
        }
        IpProto::Udp => {
            let (hdr, rest) = parse_udp(cur).ok()?;
            (Transport::Udp, Some(hdr.src_port), Some(hdr.dst_port), rest)
        }
        IpProto::Other(_) => (Transport::Other, None, None, cur),
    };

    let app_name = extract_app_name(transport, src_port, dst_port, payload.as_slice());
    let ike_exchange = recognize_ikev2(transport, src_port, dst_port, payload.as_slice());

    Some(DecodedPacket {
        src_addr: ip_hdr.src_addr.to_string(),
        transport,
        src_port,
        dst_port,
        app_name,
        link_kind: eth.link_kind.as_str(),
        ike_exchange,
    })
}

/// IKEv2/NAT-T recognition on UDP ports 500/4500 (spec.md §4.B). Port 4500
/// carries a 4-byte all-zero non-ESP marker ahead of the IKEv2 header;
/// port 500 carries the header directly.
fn recognize_ikev2(
    transport: Transport,
    src_port: Option<u16>,
    dst_port: Option<u16>,
    payload: &[u8],
) -> Option<&'static str> {
    if transport != Transport::Udp {
        return None;
    }
    let header_bytes = if port_matches(src_port, dst_port, PORT_IKE_NATT) {
        strip_non_esp_marker(payload)?
    } else if port_matches(src_port, dst_port, PORT_IKE) {
        payload
    } else {
        return None;
    };
    let cur = PacketCursor::new(header_bytes);
    let header = parse_ikev2_header(cur).ok()?;
    if header.major_version != 2 {
        return None;
    }
    Some(header.exchange_type_name())
}

fn port_matches(src: Option<u16>, dst: Option<u16>, port: u16) -> bool {
    src == Some(port) || dst == Some(port)
}

/// Application-name extraction policy: mDNS, then DNS, then TLS SNI, then
/// HTTP Host, stopping at the first non-empty result (spec.md §4.B).
fn extract_app_name(
    transport: Transport,
    src_port: Option<u16>,
    dst_port: Option<u16>,
    payload: &[u8],
) -> Option<String> {
    if transport == Transport::Udp && port_matches(src_port, dst_port, PORT_MDNS) {
        if let Ok(name) = dns::extract_mdns_name(payload) {
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    if transport == Transport::Udp && port_matches(src_port, dst_port, PORT_DNS) {
        if let Ok(name) = dns::parse_dns_query(payload) {
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    if transport == Transport::Tcp && port_matches(src_port, dst_port, PORT_TLS) {
        if let Ok(name) = tls::parse_client_hello_sni(payload) {
            return Some(name);
        }
    }
    if transport == Transport::Tcp && port_matches(src_port, dst_port, PORT_HTTP) {
        if let Ok(name) = http::parse_http_host(payload) {
            return Some(name);
        }
    }
    None
}
