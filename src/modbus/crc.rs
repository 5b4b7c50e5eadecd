const POLY: u16 = 0xA001;

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Per-byte remainders of the reflected 0xA001 polynomial.
const CRC_TABLE: [u16; 256] = build_crc_table();

/// CRC-16/MODBUS over `data` (init 0xFFFF). Goes on the wire low byte first.
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        let index = ((crc ^ byte as u16) & 0x00FF) as usize;
        crc = (crc >> 8) ^ CRC_TABLE[index];
    }
    crc
}

/// Append the CRC of everything already in `frame`, low byte first.
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16_modbus(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

/// CRC carried in the last two bytes of a frame, if it has any.
pub fn trailing_crc(frame: &[u8]) -> Option<u16> {
    match frame {
        [.., lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}
