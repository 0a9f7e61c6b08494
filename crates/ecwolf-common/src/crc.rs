// crc.rs — CRC-16/CCITT-FALSE over save bodies and stream names

use crc::{Crc, CRC_16_IBM_3740};

const CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

pub fn crc_block(data: &[u8]) -> u16 {
    CCITT.checksum(data)
}

/// Checksum over several slices as if they were one.
pub fn crc_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u16 {
    let mut digest = CCITT.digest();
    for part in parts {
        digest.update(part);
    }
    digest.finalize()
}
