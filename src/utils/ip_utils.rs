//! IPv4 network helpers shared by validation and allocation

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::error::{FabricError, Result};

/// Parse a network literal, truncating host bits (`10.0.0.5/24` -> `10.0.0.0/24`).
/// A bare address is taken as a `/32`.
pub fn parse_network(field: &str, value: &str) -> Result<Ipv4Net> {
    let value = value.trim();
    let net = if value.contains('/') {
        value
            .parse::<Ipv4Net>()
            .map_err(|e| FabricError::format(field, format!("'{}' is not an IPv4 network: {}", value, e)))?
    } else {
        let addr = value
            .parse::<Ipv4Addr>()
            .map_err(|e| FabricError::format(field, format!("'{}' is not an IPv4 network: {}", value, e)))?;
        Ipv4Net::from(addr)
    };
    Ok(net.trunc())
}

/// Total number of addresses in a network
pub fn address_count(net: &Ipv4Net) -> u64 {
    1u64 << (32 - net.prefix_len())
}

/// Offset of the first usable host: the network address is skipped except
/// for point-to-point and host networks
pub fn first_host_offset(net: &Ipv4Net) -> u64 {
    if net.prefix_len() < 31 {
        1
    } else {
        0
    }
}

/// One past the offset of the last usable host
pub fn host_end_offset(net: &Ipv4Net) -> u64 {
    if net.prefix_len() < 31 {
        address_count(net) - 1
    } else {
        address_count(net)
    }
}

/// Number of usable host addresses
pub fn usable_host_count(net: &Ipv4Net) -> u64 {
    host_end_offset(net) - first_host_offset(net)
}

/// Address at a fixed offset from the network address, if it is a usable host
pub fn host_at_offset(net: &Ipv4Net, offset: u64) -> Option<Ipv4Addr> {
    if offset < first_host_offset(net) || offset >= host_end_offset(net) {
        return None;
    }
    let base = u32::from(net.network()) as u64;
    Some(Ipv4Addr::from((base + offset) as u32))
}

/// Number of disjoint blocks of `prefix_len` carved from `net`
pub fn block_count(net: &Ipv4Net, prefix_len: u8) -> u64 {
    if prefix_len < net.prefix_len() || prefix_len > 32 {
        return 0;
    }
    1u64 << (prefix_len - net.prefix_len())
}

/// The `index`-th block of `prefix_len` inside `net`, in address order
pub fn nth_block(net: &Ipv4Net, prefix_len: u8, index: u64) -> Option<Ipv4Net> {
    if index >= block_count(net, prefix_len) {
        return None;
    }
    let base = u32::from(net.network()) as u64;
    let start = base + index * (1u64 << (32 - prefix_len));
    Ipv4Net::new(Ipv4Addr::from(start as u32), prefix_len).ok()
}

/// The two endpoint addresses of a point-to-point subnet, each carrying the
/// subnet's prefix length
pub fn link_endpoints(subnet: &Ipv4Net) -> Option<(Ipv4Net, Ipv4Net)> {
    let mut hosts = subnet.hosts();
    let first = hosts.next()?;
    let second = hosts.next()?;
    Some((
        Ipv4Net::new(first, subnet.prefix_len()).ok()?,
        Ipv4Net::new(second, subnet.prefix_len()).ok()?,
    ))
}

/// Whether two networks share any address
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_network_truncates() {
        assert_eq!(parse_network("transit", "10.0.0.5/24").unwrap(), net("10.0.0.0/24"));
        assert_eq!(parse_network("loopback", "10.1.1.1").unwrap(), net("10.1.1.1/32"));
        let err = parse_network("transit", "10.0.0.0/33").unwrap_err();
        assert!(err.is_format());
        assert!(parse_network("transit", "not-a-net").is_err());
    }

    #[test]
    fn test_usable_hosts() {
        assert_eq!(usable_host_count(&net("10.0.0.0/24")), 254);
        assert_eq!(usable_host_count(&net("10.0.0.0/29")), 6);
        assert_eq!(usable_host_count(&net("10.0.0.0/31")), 2);
        assert_eq!(usable_host_count(&net("10.0.0.1/32")), 1);
    }

    #[test]
    fn test_host_at_offset() {
        let lo = net("10.10.20.0/24");
        assert_eq!(host_at_offset(&lo, 0), None);
        assert_eq!(host_at_offset(&lo, 1), Some(Ipv4Addr::new(10, 10, 20, 1)));
        assert_eq!(host_at_offset(&lo, 254), Some(Ipv4Addr::new(10, 10, 20, 254)));
        assert_eq!(host_at_offset(&lo, 255), None);
    }

    #[test]
    fn test_blocks() {
        let transit = net("10.0.0.0/24");
        assert_eq!(block_count(&transit, 31), 128);
        assert_eq!(block_count(&transit, 23), 0);
        assert_eq!(nth_block(&transit, 31, 0), Some(net("10.0.0.0/31")));
        assert_eq!(nth_block(&transit, 31, 5), Some(net("10.0.0.10/31")));
        assert_eq!(nth_block(&transit, 30, 2), Some(net("10.0.0.8/30")));
        assert_eq!(nth_block(&transit, 31, 128), None);
    }

    #[test]
    fn test_link_endpoints() {
        let (a, b) = link_endpoints(&net("10.0.0.2/31")).unwrap();
        assert_eq!(a, net("10.0.0.2/31"));
        assert_eq!(b, net("10.0.0.3/31"));

        let (a, b) = link_endpoints(&net("10.0.0.4/30")).unwrap();
        assert_eq!(a.addr(), Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(b.addr(), Ipv4Addr::new(10, 0, 0, 6));

        assert!(link_endpoints(&net("10.0.0.9/32")).is_none());
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(&net("10.0.0.0/16"), &net("10.0.5.0/24")));
        assert!(overlaps(&net("10.0.5.0/24"), &net("10.0.0.0/16")));
        assert!(!overlaps(&net("10.0.0.0/24"), &net("10.0.1.0/24")));
    }
}
