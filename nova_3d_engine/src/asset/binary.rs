/// Little-endian readers with explicit truncation errors

use std::io::Read;
use bytemuck::Pod;
use crate::error::{Error, Result};

fn truncated(what: &str, expected: u64, got: u64) -> Error {
    Error::ParseError(format!("{}: expected {} bytes, file ended after {}", what, expected, got))
}

pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    // Grows with the data actually present, so a corrupt count cannot force a huge allocation
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(truncated(what, len, bytes.len() as u64));
    }
    Ok(bytes)
}

pub(crate) fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let bytes = read_bytes(reader, 4, what)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// `count` tightly packed `T`, in host byte order (little-endian targets)
pub(crate) fn read_pod_array<T: Pod, R: Read>(reader: &mut R, count: u32, what: &str) -> Result<Vec<T>> {
    let len = (count as u64)
        .checked_mul(std::mem::size_of::<T>() as u64)
        .ok_or_else(|| Error::ParseError(format!("{}: element count {} overflows", what, count)))?;
    let bytes = read_bytes(reader, len, what)?;
    Ok(bytemuck::pod_collect_to_vec(&bytes))
}

#[cfg(test)]
#[path = "binary_tests.rs"]
mod tests;
