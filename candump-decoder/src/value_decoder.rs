//! Value decoding engine
//!
//! Turns the hex byte tokens of a payload into one scaled physical value using
//! the low/high byte positions and divisor from a [`SignalSpec`].

use crate::registry::SignalSpec;
use crate::types::{DecoderError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Value decoder - extracts one signal from a payload
pub struct ValueDecoder;

impl ValueDecoder {
    /// Decode the physical value of `spec` from `data_field`
    ///
    /// # Arguments
    /// * `data_field` - Payload bytes as 1-2 character hex tokens
    /// * `spec` - Signal parameters from the registry
    ///
    /// # Returns
    /// * `Ok(value)` - raw 16-bit reading divided by the scaling factor
    /// * `Err(OutOfRangeByteIndex)` - payload too short for this signal
    /// * `Err(InvalidByte)` - a referenced token is not hexadecimal
    pub fn decode(data_field: &[&str], spec: &SignalSpec) -> Result<f64> {
        let raw = Self::raw_value(data_field, spec)?;
        Ok(f64::from(raw) / spec.scaling_factor)
    }

    /// Combine the low and high byte into the unscaled reading
    ///
    /// Equivalent to `low + high * 256`: a two-byte little-endian word.
    pub fn raw_value(data_field: &[&str], spec: &SignalSpec) -> Result<u16> {
        let low = Self::byte_at(data_field, spec.low_byte)?;
        let high = Self::byte_at(data_field, spec.high_byte)?;
        Ok(LittleEndian::read_u16(&[low, high]))
    }

    fn byte_at(data_field: &[&str], index: usize) -> Result<u8> {
        let token = data_field
            .get(index)
            .ok_or(DecoderError::OutOfRangeByteIndex {
                index,
                len: data_field.len(),
            })?;
        Self::parse_byte(token)
    }

    /// Parse a 1-2 digit hex token
    fn parse_byte(token: &str) -> Result<u8> {
        // from_str_radix alone would also accept a leading '+'
        if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DecoderError::InvalidByte(token.to_string()));
        }
        u8::from_str_radix(token, 16).map_err(|_| DecoderError::InvalidByte(token.to_string()))
    }
}
