use crate::error::BenchError;
use bytes::Bytes;
use rand::rngs::OsRng;
use rand::RngCore;

/// Immutable message body shared by every worker in a run
///
/// Backed by [`Bytes`], so cloning a `Payload` hands out another reference to
/// the same buffer rather than copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// Fill a `size`-byte buffer from the operating system's CSPRNG
    pub fn generate(size: usize) -> Result<Self, BenchError> {
        let mut buf = vec![0u8; size];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|source| BenchError::PayloadGeneration { size, source })?;
        Ok(Self {
            bytes: Bytes::from(buf),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap handle to the underlying buffer for clients that take `Bytes`
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(buf: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_exact_size() {
        let payload = Payload::generate(512).unwrap();
        assert_eq!(payload.len(), 512);
        assert_eq!(payload.as_bytes().len(), 512);
    }

    #[test]
    fn test_generate_zero_size() {
        let payload = Payload::generate(0).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_generate_is_random() {
        // Two 64-byte draws colliding is vanishingly unlikely.
        let a = Payload::generate(64).unwrap();
        let b = Payload::generate(64).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let payload = Payload::generate(128).unwrap();
        let clone = payload.clone();
        assert_eq!(payload.as_bytes().as_ptr(), clone.as_bytes().as_ptr());
    }
}
