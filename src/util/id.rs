//! Random identifier generation for session and request tagging.

use rand::RngCore;

/// URL-safe alphabet identifiers are drawn from.
pub const ID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Length of a generated identifier.
pub const ID_LENGTH: usize = 21;

/// Source of random identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier.
    fn generate(&self) -> String;
}

/// Generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        generate_id()
    }
}

/// Generate a [`ID_LENGTH`]-character identifier from [`ID_ALPHABET`].
pub fn generate_id() -> String {
    let mut bytes = [0u8; ID_LENGTH];
    rand::rng().fill_bytes(&mut bytes);
    encode_id(&bytes)
}

/// Map each byte onto the alphabet by its low six bits.
fn encode_id(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| char::from(ID_ALPHABET[usize::from(b & 63)]))
        .collect()
}
