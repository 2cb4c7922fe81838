//! Device data types and key material.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ipnet::{Ipv4Net, Ipv6Net};
use jiff::Timestamp;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::StoredAccountData;

fn serialize_key<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(bytes))
}

fn deserialize_key<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    let bytes = BASE64
        .decode(&encoded)
        .map_err(serde::de::Error::custom)?;
    bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom("device key must be 32 bytes"))
}

/// Locally generated device private key material.
///
/// Opaque to this crate: tunnel establishment is a platform collaborator
/// concern. `Debug` redacts the key; `Display` renders base64.
#[derive(Clone, PartialEq, Eq)]
pub struct DevicePrivateKey([u8; 32]);

impl DevicePrivateKey {
    /// Generates a fresh private key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derives the public identifier registered with the devices endpoint.
    pub fn public_key(&self) -> DevicePublicKey {
        DevicePublicKey(Sha256::digest(self.0).into())
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for DevicePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DevicePrivateKey(****)")
    }
}

impl std::fmt::Display for DevicePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl Serialize for DevicePrivateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_key(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for DevicePrivateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_key(deserializer).map(Self)
    }
}

/// Public device identifier derived from a [`DevicePrivateKey`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DevicePublicKey([u8; 32]);

impl DevicePublicKey {
    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for DevicePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DevicePublicKey({self})")
    }
}

impl std::fmt::Display for DevicePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl Serialize for DevicePublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_key(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for DevicePublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_key(deserializer).map(Self)
    }
}

/// A freshly generated private key with its public identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// The private half, persisted locally.
    pub private: DevicePrivateKey,
    /// The public half, registered with the devices endpoint.
    pub public: DevicePublicKey,
}

impl KeyPair {
    /// Generates a fresh key pair.
    pub fn generate() -> Self {
        let private = DevicePrivateKey::generate();
        let public = private.public_key();
        Self { private, public }
    }
}

/// A device as returned by the devices endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Server-side device identifier.
    pub id: String,
    /// Server-assigned device name.
    pub name: String,
    /// The public key the device was registered with.
    pub public_key: DevicePublicKey,
    /// Whether the device hijacks DNS.
    pub hijack_dns: bool,
    /// When the device was created.
    pub created: Timestamp,
    /// Tunnel IPv4 address assigned to the device.
    pub ipv4_address: Ipv4Net,
    /// Tunnel IPv6 address assigned to the device.
    pub ipv6_address: Ipv6Net,
}

/// Request payload for registering a new device.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeviceRequest {
    /// Public key to register.
    pub public_key: DevicePublicKey,
    /// Whether the device should hijack DNS.
    pub hijack_dns: bool,
}

impl CreateDeviceRequest {
    /// Creates a request for the given public key, with DNS hijacking off.
    pub fn new(public_key: DevicePublicKey) -> Self {
        Self {
            public_key,
            hijack_dns: false,
        }
    }
}

/// Key material persisted with the device state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKeyData {
    /// When the key was generated.
    pub created: Timestamp,
    /// The device private key.
    pub private_key: DevicePrivateKey,
}

/// Device data persisted locally after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDeviceData {
    /// When the device was created remotely.
    pub created: Timestamp,
    /// Server-side device identifier.
    pub identifier: String,
    /// Server-assigned device name.
    pub name: String,
    /// Whether the device hijacks DNS.
    pub hijack_dns: bool,
    /// Tunnel IPv4 address assigned to the device.
    pub ipv4_address: Ipv4Net,
    /// Tunnel IPv6 address assigned to the device.
    pub ipv6_address: Ipv6Net,
    /// Key material for the device.
    pub key: StoredKeyData,
}

impl StoredDeviceData {
    /// Builds the persisted form of a freshly registered device.
    pub fn new(device: Device, private_key: DevicePrivateKey) -> Self {
        Self {
            created: device.created,
            identifier: device.id,
            name: device.name,
            hijack_dns: device.hijack_dns,
            ipv4_address: device.ipv4_address,
            ipv6_address: device.ipv6_address,
            key: StoredKeyData {
                created: Timestamp::now(),
                private_key,
            },
        }
    }
}

/// Logged-in state of this client install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DeviceState {
    /// Logged in on an account with a registered device.
    LoggedIn {
        /// The account logged in on.
        account: StoredAccountData,
        /// The registered device.
        device: StoredDeviceData,
    },
    /// Not logged in.
    LoggedOut,
    /// The device was revoked server-side.
    Revoked,
}

impl DeviceState {
    /// Returns whether a device is currently logged in.
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    /// Returns the logged-in account and device, if any.
    pub fn logged_in(&self) -> Option<(&StoredAccountData, &StoredDeviceData)> {
        match self {
            Self::LoggedIn { account, device } => Some((account, device)),
            Self::LoggedOut | Self::Revoked => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_is_deterministic() {
        let private = DevicePrivateKey::generate();
        assert_eq!(private.public_key(), private.public_key());
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        assert_ne!(KeyPair::generate().private, KeyPair::generate().private);
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let private = DevicePrivateKey::generate();
        assert_eq!(format!("{private:?}"), "DevicePrivateKey(****)");
    }

    #[test]
    fn test_device_state_accessors() {
        assert!(!DeviceState::LoggedOut.is_logged_in());
        assert!(DeviceState::LoggedOut.logged_in().is_none());
        assert!(!DeviceState::Revoked.is_logged_in());
    }
}
