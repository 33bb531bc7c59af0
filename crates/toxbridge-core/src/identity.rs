//! Public keys and friend addresses.
//!
//! Identities cross the adapter in two shapes: the host knows contacts by the
//! canonical lowercase hex text of their key, the network core knows them by
//! fixed-size byte arrays. This module converts between the two.
//!
//! # Leniency
//!
//! [`decode_hex`] never rejects a character. Anything outside `[0-9a-fA-F]`
//! decodes as a zero nibble. Length is still checked: odd-length text is an
//! error, and the typed parsers require the exact character count.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::IdentityError;

/// Size of a public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of the nospam value in bytes.
pub const NOSPAM_SIZE: usize = 4;

/// Size of the address checksum in bytes.
pub const CHECKSUM_SIZE: usize = 2;

/// Size of a full friend address (key + nospam + checksum) in bytes.
pub const ADDRESS_SIZE: usize = PUBLIC_KEY_SIZE + NOSPAM_SIZE + CHECKSUM_SIZE;

/// Encode bytes as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex text, case-insensitively.
///
/// Unrecognized characters decode as nibble 0.
///
/// # Errors
///
/// - `IdentityError::OddLength` if the text does not split into whole bytes
pub fn decode_hex(text: &str) -> Result<Vec<u8>, IdentityError> {
    let raw = text.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(IdentityError::OddLength(raw.len()));
    }

    Ok(raw.chunks_exact(2).map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1])).collect())
}

fn nibble(c: u8) -> u8 {
    match c.to_ascii_lowercase() {
        d @ b'0'..=b'9' => d - b'0',
        d @ b'a'..=b'f' => d - b'a' + 10,
        _ => 0,
    }
}

fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], IdentityError> {
    let text = text.trim();
    if text.len() != N * 2 {
        return Err(IdentityError::InvalidLength { expected: N * 2, actual: text.len() });
    }

    let bytes = decode_hex(text)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Durable identity of a contact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Number of hex characters in the text form.
    pub const HEX_LEN: usize = PUBLIC_KEY_SIZE * 2;

    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Parse a key from hex text, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// - `IdentityError::InvalidLength` unless exactly 64 characters remain
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        decode_fixed(text).map(Self)
    }

    /// Canonical lowercase hex form.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl FromStr for PublicKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Full friend address: public key, nospam and checksum.
///
/// This is what a user hands out so others can send a friend request. Once a
/// friend is added only the public key matters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToxAddress([u8; ADDRESS_SIZE]);

impl ToxAddress {
    /// Number of hex characters in the text form.
    pub const HEX_LEN: usize = ADDRESS_SIZE * 2;

    /// Wrap raw address bytes. The checksum is taken as given.
    pub const fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build an address with a freshly computed checksum.
    pub fn from_parts(public_key: PublicKey, nospam: [u8; NOSPAM_SIZE]) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[..PUBLIC_KEY_SIZE].copy_from_slice(public_key.as_bytes());
        bytes[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + NOSPAM_SIZE].copy_from_slice(&nospam);
        let checksum = Self::compute_checksum(&bytes[..PUBLIC_KEY_SIZE + NOSPAM_SIZE]);
        bytes[PUBLIC_KEY_SIZE + NOSPAM_SIZE..].copy_from_slice(&checksum);
        Self(bytes)
    }

    /// Parse an address from hex text, ignoring surrounding whitespace.
    ///
    /// The checksum is not verified here; the network core does that when the
    /// address is used.
    ///
    /// # Errors
    ///
    /// - `IdentityError::InvalidLength` unless exactly 76 characters remain
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        decode_fixed(text).map(Self)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Public key part.
    pub fn public_key(&self) -> PublicKey {
        let mut key = [0u8; PUBLIC_KEY_SIZE];
        key.copy_from_slice(&self.0[..PUBLIC_KEY_SIZE]);
        PublicKey(key)
    }

    /// Nospam part.
    pub fn nospam(&self) -> [u8; NOSPAM_SIZE] {
        let mut nospam = [0u8; NOSPAM_SIZE];
        nospam.copy_from_slice(&self.0[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + NOSPAM_SIZE]);
        nospam
    }

    /// Checksum part as stored in the address.
    pub fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&self.0[PUBLIC_KEY_SIZE + NOSPAM_SIZE..]);
        checksum
    }

    /// Returns true if the stored checksum matches key and nospam.
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum() == Self::compute_checksum(&self.0[..PUBLIC_KEY_SIZE + NOSPAM_SIZE])
    }

    /// XOR of the input bytes folded into two bytes.
    pub fn compute_checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
        let mut checksum = [0u8; CHECKSUM_SIZE];
        for (i, byte) in data.iter().enumerate() {
            checksum[i % CHECKSUM_SIZE] ^= byte;
        }
        checksum
    }

    /// Canonical lowercase hex form.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for ToxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ToxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ToxAddress").field(&self.to_hex()).finish()
    }
}

impl FromStr for ToxAddress {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}

impl Serialize for ToxAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ToxAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
