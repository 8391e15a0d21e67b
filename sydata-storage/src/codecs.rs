//! Little-endian integer helpers for fixed blob headers.

#[inline]
pub fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline]
pub fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Read a `u32` at `*o` and advance the cursor. Callers check bounds first.
#[inline]
pub fn read_u32_le(buf: &[u8], o: &mut usize) -> u32 {
    let mut a = [0u8; 4];
    a.copy_from_slice(&buf[*o..*o + 4]);
    *o += 4;
    u32::from_le_bytes(a)
}

/// Read a `u64` at `*o` and advance the cursor. Callers check bounds first.
#[inline]
pub fn read_u64_le(buf: &[u8], o: &mut usize) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(&buf[*o..*o + 8]);
    *o += 8;
    u64::from_le_bytes(a)
}
