// Reflected CRC-32 (IEEE 802.3) computed bit by bit

/// Reversed form of the IEEE polynomial 0x04C11DB7.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

const INITIAL: u32 = 0xFFFF_FFFF;

/// Checksum a complete byte slice.
///
/// Pure function: no state survives between calls.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(bytes);
    crc.finalize()
}

/// Incremental CRC-32 register.
///
/// Feeding the input in several `update` calls yields the same value as a
/// single [`checksum`] over the concatenation.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    register: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Crc32 { register: INITIAL }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut crc = self.register;
        for &byte in bytes {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                // LSB-first: shift out one bit, fold the polynomial in when it was set
                crc = (crc >> 1) ^ (POLYNOMIAL & (crc & 1).wrapping_neg());
            }
        }
        self.register = crc;
    }

    pub fn finalize(self) -> u32 {
        !self.register
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_input() {
        // No bytes processed: !0xFFFFFFFF
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_deterministic() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(checksum(data), checksum(data));
        assert_eq!(checksum(data), 0x414F_A339);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = b"123456789";
        let mut crc = Crc32::new();
        crc.update(&data[..4]);
        crc.update(&data[4..]);
        assert_eq!(crc.finalize(), checksum(data));
    }

    #[test]
    fn test_single_byte_changes_checksum() {
        let base = [0u8; 20];
        let reference = checksum(&base);
        for offset in 0..base.len() {
            let mut flipped = base;
            flipped[offset] ^= 0xFF;
            assert_ne!(checksum(&flipped), reference, "offset {offset}");
        }
    }
}
