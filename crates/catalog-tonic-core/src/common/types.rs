//! Shared constants and helpers layered over the generated proto types.

use crate::proto::{Memory, memory};

/// Maximum accepted image payload in bytes (1 MiB). This is the default for
/// the server's `MAX_IMAGE_SIZE` setting, not a hard-wired policy.
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

/// Default capacity of the buffer between a store scan and the gRPC
/// response stream. Lower values increase backpressure responsiveness.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 8;

impl Memory {
    /// Normalizes the quantity to bits so that values carrying different
    /// units compare directly. An unset unit normalizes to zero.
    pub fn normalized(&self) -> u128 {
        let value = u128::from(self.value);
        match self.unit() {
            memory::Unit::Unknown => 0,
            memory::Unit::Bit => value,
            memory::Unit::Byte => value << 3,
            memory::Unit::Kilobyte => value << 13,
            memory::Unit::Megabyte => value << 23,
            memory::Unit::Gigabyte => value << 33,
            memory::Unit::Terabyte => value << 43,
        }
    }
}
