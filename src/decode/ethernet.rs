//! Ethernet II / 802.1Q VLAN framing (spec.md §4.B).

use crate::byte_reader::{DecodeError, PacketCursor};

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    EthernetII,
    Vlan8021Q,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::EthernetII => "Ethernet II",
            LinkKind::Vlan8021Q => "802.1Q VLAN",
        }
    }
}

pub struct EthernetHeader {
    pub link_kind: LinkKind,
    pub ethertype: u16,
}

/// Parses the 14-byte Ethernet II header, transparently skipping one
/// 802.1Q VLAN tag if present (header grows to 18 bytes).
pub fn parse_ethernet(cur: PacketCursor) -> Result<(EthernetHeader, PacketCursor), DecodeError> {
    let ethertype = cur.u16_be_at(12)?;
    if ethertype == ETHERTYPE_VLAN {
        let inner_type = cur.u16_be_at(16)?;
        let rest = cur.advance(18)?;
        return Ok((
            EthernetHeader {
                link_kind: LinkKind::Vlan8021Q,
                ethertype: inner_type,
            },
            rest,
        ));
    }
    let rest = cur.advance(14)?;
    Ok((
        EthernetHeader {
            link_kind: LinkKind::EthernetII,
            ethertype,
        },
        rest,
    ))
}
