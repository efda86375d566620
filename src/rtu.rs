//! RTU framer (C5).
//!
//! Wraps a request body (station + function code + payload) with the
//! CRC16-Modbus trailer, and validates/unwraps a response frame.

use crate::crc;
use crate::error::{exception_message, ModbusError};

const MIN_FRAME_LEN: usize = 5;

/// Appends the CRC16 trailer to `body` (station + function code + payload).
pub fn wrap(body: &[u8]) -> Vec<u8> {
    crc::append_crc(body)
}

/// Validates and unwraps a response frame.
///
/// Checks, in order: minimum length, CRC, and exception bit. On success
/// returns the frame with the trailing CRC bytes stripped (station,
/// function code, and payload still included).
pub fn unwrap(frame: &[u8], expected_function_code: u8) -> Result<Vec<u8>, ModbusError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(ModbusError::ShortFrame { len: frame.len() });
    }

    if !crc::verify(frame) {
        let body = &frame[..frame.len() - 2];
        let trailer = &frame[frame.len() - 2..];
        return Err(ModbusError::CrcMismatch {
            calculated: crc::compute(body),
            received: u16::from_le_bytes([trailer[0], trailer[1]]),
            frame_hex: hex::encode(body),
        });
    }

    if frame[1] == (expected_function_code | 0x80) {
        let code = frame[2];
        return Err(ModbusError::Exception {
            function: expected_function_code,
            code,
            message: exception_message(code),
        });
    }

    Ok(frame[..frame.len() - 2].to_vec())
}
