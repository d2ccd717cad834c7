use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// Address identifies a participant or a deployed token in the factory
// runtime. It is a 32 byte opaque identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "addr:{}", prefix)
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for Address {
    fn default() -> Self {
        Address([0; 32])
    }
}

impl Deref for Address {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Create an Address from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// The all-zero address, used as the null sentinel
    pub fn zero() -> Self {
        Address([0; 32])
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the null sentinel address
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    pub fn hash_seeds(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"FORGE_Address");

        // Add all seeds
        for seed in seeds {
            hasher.update(seed);
        }

        // Add bump
        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Verify that a 32-byte array is not a valid point on the ed25519 curve
    ///
    /// Returns true if the bytes do not represent a valid curve point.
    /// Returns false if the bytes do represent a valid curve point.
    pub fn is_off_curve(bytes: &[u8; 32]) -> bool {
        let Ok(compressed_edwards_y) = CompressedEdwardsY::from_slice(bytes.as_ref()) else {
            return true; // Cannot even parse as a point format, so it's off-curve
        };
        compressed_edwards_y.decompress().is_none() // If we can't decompress it, it's off-curve
    }

    /// Try to derive an Address for the given seeds
    pub fn try_derive(seeds: &[&[u8]]) -> Option<(Address, u8)> {
        for bump in 0..255 {
            let candidate = Address::hash_seeds(seeds, bump);
            if Address::is_off_curve(&candidate) {
                return Some((Address(candidate), bump));
            }
        }
        None
    }

    /// Derive an Address for the given seeds
    pub fn derive(seeds: &[&[u8]]) -> (Address, u8) {
        Address::try_derive(seeds).expect("Failed to derive a valid Address")
    }

    /// Generate a unique Address for testing purposes - exposed for tests in other crates
    pub fn unique_address_for_tests() -> Self {
        // Use current timestamp as basis for uniqueness
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("Time went backwards")
            .as_nanos()
            .to_le_bytes();

        let ts_slice = timestamp.as_slice();
        let extra = [1, 2, 3, 4];

        let (addr, _) = Address::derive(&[ts_slice, &extra]);
        addr
    }
}
