/// Prefix of the CGNAT range overlay networks hand out to nodes.
pub const PRIVATE_OVERLAY_PREFIX: &str = "100.";

/// Node address discovery strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStrategy {
    NodeNames,
    ExternalIp,
    InternalIp,
}

impl AddressStrategy {
    pub const ORDER: [AddressStrategy; 3] = [
        AddressStrategy::NodeNames,
        AddressStrategy::ExternalIp,
        AddressStrategy::InternalIp,
    ];
}

/// Recovers an IPv4 address embedded at the end of a node name.
///
/// Some providers name nodes like `x-4g-8g-region-203-0-113-7`: at least
/// five dash-separated tokens, the last four numeric. Anything else yields
/// `None`.
pub fn address_from_node_name(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < 5 {
        return None;
    }

    let octets = &parts[parts.len() - 4..];
    if octets
        .iter()
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    {
        Some(octets.join("."))
    } else {
        None
    }
}

/// Drops IPv6 addresses and overlay addresses.
pub fn is_public_ipv4_candidate(address: &str) -> bool {
    !address.contains(':') && !address.starts_with(PRIVATE_OVERLAY_PREFIX)
}
