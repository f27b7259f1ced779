//! End-to-end scenarios exercising the full decode → aggregate pipeline,
//! taken from spec.md §8 "Concrete scenarios".

use netsentry::aggregator::Aggregator;
use netsentry::decode::decode_packet;
use netsentry::flow::{FlowKey, Transport};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;

fn vlan_ipv4_udp_frame(src_port: u16, dst_port: u16, src_ip: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 18];
    buf[12..14].copy_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
    buf[14..16].copy_from_slice(&[0x00, 0x0A]); // VLAN tag control info
    buf[16..18].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    let mut ip = vec![0u8; 20];
    ip[0] = 0x45;
    ip[9] = 17; // UDP
    ip[12..16].copy_from_slice(&src_ip);

    let mut udp = vec![0u8; 8];
    udp[0..2].copy_from_slice(&src_port.to_be_bytes());
    udp[2..4].copy_from_slice(&dst_port.to_be_bytes());

    buf.extend_from_slice(&ip);
    buf.extend_from_slice(&udp);
    buf.extend_from_slice(payload);
    buf
}

fn plain_ipv4_udp_frame(src_port: u16, dst_port: u16, src_ip: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 14];
    buf[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    let mut ip = vec![0u8; 20];
    ip[0] = 0x45;
    ip[9] = 17;
    ip[12..16].copy_from_slice(&src_ip);
    let mut udp = vec![0u8; 8];
    udp[0..2].copy_from_slice(&src_port.to_be_bytes());
    udp[2..4].copy_from_slice(&dst_port.to_be_bytes());
    buf.extend_from_slice(&ip);
    buf.extend_from_slice(&udp);
    buf.extend_from_slice(payload);
    buf
}

fn dns_query_payload(name: &str) -> Vec<u8> {
    let mut buf = vec![0u8, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]; // header, qdcount=1
    for label in name.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    buf
}

fn ipv6_tcp_frame(src_ip: [u8; 16], src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 14];
    buf[12..14].copy_from_slice(&ETHERTYPE_IPV6.to_be_bytes());
    let mut ip = vec![0u8; 40];
    ip[0] = 0x60;
    ip[6] = 6; // TCP
    ip[8..24].copy_from_slice(&src_ip);
    let mut tcp = vec![0u8; 20];
    tcp[0..2].copy_from_slice(&src_port.to_be_bytes());
    tcp[2..4].copy_from_slice(&dst_port.to_be_bytes());
    tcp[12] = 0x50; // data offset 5 -> 20 bytes
    buf.extend_from_slice(&ip);
    buf.extend_from_slice(&tcp);
    buf.extend_from_slice(payload);
    buf
}

fn tls_client_hello_with_sni(host: &str) -> Vec<u8> {
    let mut ext_body = vec![0u8]; // host_name type
    ext_body.extend_from_slice(&(host.len() as u16).to_be_bytes());
    ext_body.extend_from_slice(host.as_bytes());
    let mut server_name_ext = (ext_body.len() as u16).to_be_bytes().to_vec();
    server_name_ext.extend_from_slice(&ext_body);

    let mut extensions = 0x0000u16.to_be_bytes().to_vec();
    extensions.extend_from_slice(&(server_name_ext.len() as u16).to_be_bytes());
    extensions.extend_from_slice(&server_name_ext);

    let mut body = vec![0x03, 0x03];
    body.extend_from_slice(&[0u8; 32]);
    body.push(0);
    body.extend_from_slice(&[0x00, 0x02, 0x00, 0x2f]);
    body.extend_from_slice(&[0x01, 0x00]);
    body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
    body.extend_from_slice(&extensions);

    let mut handshake = vec![0x01];
    let body_len = body.len() as u32;
    handshake.push((body_len >> 16) as u8);
    handshake.push((body_len >> 8) as u8);
    handshake.push(body_len as u8);
    handshake.extend_from_slice(&body);

    let mut record = vec![0x16, 0x03, 0x03];
    record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
    record.extend_from_slice(&handshake);
    record
}

#[test]
fn scenario_1_vlan_dns_query() {
    let payload = dns_query_payload("example.com");
    let frame = vlan_ipv4_udp_frame(51234, 53, [10, 0, 0, 5], &payload);
    let decoded = decode_packet(&frame).expect("vlan ipv4 udp/53 decodes");
    assert_eq!(decoded.transport, Transport::Udp);
    assert_eq!(decoded.link_kind, "802.1Q VLAN");
    assert_eq!(decoded.app_name.as_deref(), Some("example.com"));
    assert_eq!(decoded.src_port, Some(51234));
}

#[test]
fn scenario_2_fragmented_ipv6_tls_sni_across_two_captures() {
    let aggregator = Aggregator::new();
    let src_ip = [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

    let sni_record = tls_client_hello_with_sni("a.b.test");
    let first = ipv6_tcp_frame(src_ip, 51000, 443, &sni_record);
    let second = ipv6_tcp_frame(src_ip, 51000, 443, &[1, 2, 3, 4]); // continuation data

    for frame in [&first, &second] {
        let decoded = decode_packet(frame).expect("ipv6 tcp/443 decodes");
        let key = FlowKey {
            interface_label: "eth0".to_string(),
            peer_address: decoded.src_addr.clone(),
            transport: decoded.transport,
        };
        let obs = netsentry::flow::PacketObservation {
            wire_len: frame.len() as u64,
            src_port: decoded.src_port,
            dst_port: decoded.dst_port,
            app_name: decoded.app_name.as_deref(),
            link_kind: decoded.link_kind,
            now: std::time::SystemTime::now(),
        };
        aggregator.update(key, &obs);
    }

    let snap = aggregator.snapshot();
    assert_eq!(snap.len(), 1);
    let (_, stats) = &snap[0];
    assert_eq!(stats.packet_count, 2);
    assert_eq!(stats.app_name, "a.b.test");
    assert!(stats.dst_ports.contains("443"));
}

#[test]
fn scenario_3_ikev2_natt_non_esp_marker() {
    let mut udp_payload = vec![0, 0, 0, 0]; // non-ESP marker
    let mut ike_header = vec![0u8; 28];
    ike_header[17] = 0x20; // major version 2
    ike_header[18] = 34; // IKE_SA_INIT
    udp_payload.extend_from_slice(&ike_header);

    let frame = plain_ipv4_udp_frame(4500, 4500, [172, 16, 0, 1], &udp_payload);
    let decoded = decode_packet(&frame).expect("ipv4 udp/4500 decodes");
    assert_eq!(decoded.transport, Transport::Udp);
    assert_eq!(
        decoded.ike_exchange,
        Some("IKE_SA_INIT"),
        "decode_packet itself must recognise the NAT-T non-ESP marker and parse the IKEv2 header"
    );
}

#[test]
fn scenario_4_same_source_two_interfaces_yields_two_flows() {
    let aggregator = Aggregator::new();
    let payload = dns_query_payload("shared.example");
    let frame = plain_ipv4_udp_frame(4000, 53, [10, 1, 1, 1], &payload);
    let decoded = decode_packet(&frame).expect("frame decodes");

    for iface in ["eth0", "eth1"] {
        let key = FlowKey {
            interface_label: iface.to_string(),
            peer_address: decoded.src_addr.clone(),
            transport: decoded.transport,
        };
        let obs = netsentry::flow::PacketObservation {
            wire_len: frame.len() as u64,
            src_port: decoded.src_port,
            dst_port: decoded.dst_port,
            app_name: decoded.app_name.as_deref(),
            link_kind: decoded.link_kind,
            now: std::time::SystemTime::now(),
        };
        aggregator.update(key, &obs);
    }

    let snap = aggregator.snapshot();
    assert_eq!(snap.len(), 2);
    for (key, stats) in &snap {
        assert_eq!(key.peer_address, decoded.src_addr);
        assert_eq!(stats.packet_count, 1);
    }
}

#[test]
fn scenario_5_malformed_dns_pointer_loop_still_counts_packet() {
    let mut payload = vec![0u8; 12];
    payload.push(0xC0);
    payload.push(0x0C); // self-referential pointer
    let frame = plain_ipv4_udp_frame(51234, 53, [10, 0, 0, 9], &payload);
    let decoded = decode_packet(&frame).expect("ip/udp layers still decode");
    assert_eq!(decoded.transport, Transport::Udp);
    assert_eq!(decoded.app_name, None);
}

#[test]
fn scenario_6_truncated_ipv4_header_is_dropped() {
    let mut buf = vec![0u8; 14];
    buf[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    buf.extend_from_slice(&[0x45, 0, 0]); // far too short to hold a 20-byte header
    assert!(decode_packet(&buf).is_none());
}
