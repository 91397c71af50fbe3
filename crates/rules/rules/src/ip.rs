//! IPv4 range matching on plain 32-bit integers.
//!
//! A range is compiled once from an `ip/bits` literal into a `(network, mask)`
//! pair; membership is then a single AND and compare.
//!
//! Octets are not range-checked: `1.2.3.300` is accepted and folds into the
//! neighbouring octet exactly as big-endian accumulation dictates. A range
//! literal whose accumulated value no longer fits in 32 bits is rejected;
//! a requester address that overflows keeps its low 32 bits.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing addresses or building ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpRangeError {
    /// The address is not four dot-separated decimal components.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The accumulated address does not fit in 32 bits.
    #[error("address out of range: {0}")]
    AddressOutOfRange(String),

    /// The range literal has no `/bits` suffix or more than one `/`.
    #[error("expected ip/bits, got {0}")]
    MalformedRange(String),

    /// The prefix length is not a number in `0..=32`.
    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),

    /// The network address has host bits set outside the mask.
    #[error("netmask does not match IP ({network:x} {mask:x})")]
    NetmaskMismatch {
        /// The parsed network address.
        network: u32,
        /// The mask derived from the prefix length.
        mask: u32,
    },
}

/// A compiled `(network, mask)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpRange {
    /// Network address with all host bits cleared.
    pub network: u32,
    /// Mask with the prefix bits set.
    pub mask: u32,
}

impl IpRange {
    /// Test whether a dotted-quad address falls within this range.
    ///
    /// The address is reduced to its low 32 bits, so `256.0.0.1` is tested
    /// as `0.0.0.1`.
    pub fn contains(&self, ip: &str) -> Result<bool, IpRangeError> {
        Ok(parse_ipv4_wrapping(ip)? & self.mask == self.network)
    }

    /// Test an already-parsed address.
    pub fn contains_addr(&self, addr: u32) -> bool {
        addr & self.mask == self.network
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.network.to_be_bytes();
        write!(f, "{a}.{b}.{c}.{d}/{}", self.mask.count_ones())
    }
}

/// Convert a dotted-quad address into its big-endian 32-bit value.
///
/// Fails with [`IpRangeError::AddressOutOfRange`] if the value does not fit
/// in 32 bits.
pub fn parse_ipv4(ip: &str) -> Result<u32, IpRangeError> {
    fold_ipv4(ip, |value, octet| {
        value.checked_mul(256).and_then(|v| v.checked_add(octet))
    })
}

/// Like [`parse_ipv4`], but an overflowing address keeps its low 32 bits.
pub fn parse_ipv4_wrapping(ip: &str) -> Result<u32, IpRangeError> {
    fold_ipv4(ip, |value, octet| {
        Some(value.wrapping_mul(256).wrapping_add(octet))
    })
}

fn fold_ipv4(
    ip: &str,
    step: impl Fn(u32, u32) -> Option<u32>,
) -> Result<u32, IpRangeError> {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return Err(IpRangeError::InvalidAddress(ip.to_owned()));
    }
    parts.iter().try_fold(0_u32, |value, part| {
        let octet: u32 = part
            .parse()
            .map_err(|_| IpRangeError::InvalidAddress(ip.to_owned()))?;
        step(value, octet).ok_or_else(|| IpRangeError::AddressOutOfRange(ip.to_owned()))
    })
}

/// Build the mask for a prefix length. `bits == 0` yields an all-zero mask.
pub fn prefix_mask(bits: u32) -> Result<u32, IpRangeError> {
    if bits > 32 {
        return Err(IpRangeError::InvalidPrefix(bits.to_string()));
    }
    Ok(u32::MAX.checked_shl(32 - bits).unwrap_or(0))
}

/// Compile an `ip/bits` literal (e.g. `127.0.0.0/24`) into an [`IpRange`].
pub fn build_range(text: &str) -> Result<IpRange, IpRangeError> {
    let (ip, bits) = text
        .split_once('/')
        .filter(|(_, bits)| !bits.contains('/'))
        .ok_or_else(|| IpRangeError::MalformedRange(text.to_owned()))?;

    let network = parse_ipv4(ip)?;
    let bits: u32 = bits
        .parse()
        .map_err(|_| IpRangeError::InvalidPrefix(bits.to_owned()))?;
    let mask = prefix_mask(bits)?;

    if network & mask != network {
        return Err(IpRangeError::NetmaskMismatch { network, mask });
    }
    Ok(IpRange { network, mask })
}
