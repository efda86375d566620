//! PDU builder (C4).
//!
//! Builds the request body (function code + payload, excluding the station
//! byte and CRC) for each supported function code.

use crate::error::ModbusError;
use crate::transform::pack_bools;

pub const FC_READ_COILS: u8 = 0x01;
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

const MAX_READ_BITS: u16 = 2000;
const MAX_READ_REGISTERS: u16 = 125;
const MAX_WRITE_REGISTERS: u16 = 123;

fn check_address_quantity(address: u16, quantity: u16) -> Result<(), ModbusError> {
    if u32::from(address) + u32::from(quantity) > u32::from(u16::MAX) {
        return Err(ModbusError::invalid_quantity(format!(
            "address {address} + quantity {quantity} overflows 0xFFFF"
        )));
    }
    Ok(())
}

/// Builds the body for a bit-read (FC01/FC02): quantity must be `1..=2000`.
pub fn build_read_bits(function_code: u8, address: u16, quantity: u16) -> Result<Vec<u8>, ModbusError> {
    if quantity == 0 || quantity > MAX_READ_BITS {
        return Err(ModbusError::invalid_quantity(format!(
            "bit read quantity {quantity} out of range 1..={MAX_READ_BITS}"
        )));
    }
    check_address_quantity(address, quantity)?;

    let mut body = Vec::with_capacity(5);
    body.push(function_code);
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(&quantity.to_be_bytes());
    Ok(body)
}

/// Builds the body for a register read (FC03/FC04): quantity must be
/// `1..=125`.
pub fn build_read_registers(
    function_code: u8,
    address: u16,
    quantity: u16,
) -> Result<Vec<u8>, ModbusError> {
    if quantity == 0 || quantity > MAX_READ_REGISTERS {
        return Err(ModbusError::invalid_quantity(format!(
            "register read quantity {quantity} out of range 1..={MAX_READ_REGISTERS}"
        )));
    }
    check_address_quantity(address, quantity)?;

    let mut body = Vec::with_capacity(5);
    body.push(function_code);
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(&quantity.to_be_bytes());
    Ok(body)
}

/// Builds the body for FC05 (write single coil). `0xFF00` for ON, `0x0000`
/// for OFF.
pub fn build_write_single_coil(address: u16, value: bool) -> Vec<u8> {
    let mut body = Vec::with_capacity(5);
    body.push(FC_WRITE_SINGLE_COIL);
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(if value { &[0xFF, 0x00] } else { &[0x00, 0x00] });
    body
}

/// Builds the body for FC06 (write single register) from a caller-supplied
/// byte pair placed directly as `data_hi data_lo`.
pub fn build_write_single_register(address: u16, data_hi: u8, data_lo: u8) -> Vec<u8> {
    let mut body = Vec::with_capacity(5);
    body.push(FC_WRITE_SINGLE_REGISTER);
    body.extend_from_slice(&address.to_be_bytes());
    body.push(data_hi);
    body.push(data_lo);
    body
}

/// Builds the body for FC15 (write multiple coils).
pub fn build_write_multiple_coils(address: u16, values: &[bool]) -> Result<Vec<u8>, ModbusError> {
    let quantity = values.len();
    if quantity == 0 || quantity > MAX_READ_BITS as usize {
        return Err(ModbusError::invalid_quantity(format!(
            "coil write quantity {quantity} out of range 1..={MAX_READ_BITS}"
        )));
    }
    let quantity = quantity as u16;
    check_address_quantity(address, quantity)?;

    let packed = pack_bools(values);
    let mut body = Vec::with_capacity(6 + packed.len());
    body.push(FC_WRITE_MULTIPLE_COILS);
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(&quantity.to_be_bytes());
    body.push(packed.len() as u8);
    body.extend_from_slice(&packed);
    Ok(body)
}

/// Builds the body for FC16 (write multiple registers). `data` must already
/// be byte-ordered by the caller and have an even length.
pub fn build_write_multiple_registers(address: u16, data: &[u8]) -> Result<Vec<u8>, ModbusError> {
    if data.len() % 2 != 0 {
        return Err(ModbusError::invalid_quantity(
            "register write payload must have an even length",
        ));
    }
    let quantity = (data.len() / 2) as u16;
    if quantity == 0 || quantity > MAX_WRITE_REGISTERS {
        return Err(ModbusError::invalid_quantity(format!(
            "register write quantity {quantity} out of range 1..={MAX_WRITE_REGISTERS}"
        )));
    }
    check_address_quantity(address, quantity)?;

    let mut body = Vec::with_capacity(6 + data.len());
    body.push(FC_WRITE_MULTIPLE_REGISTERS);
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(&quantity.to_be_bytes());
    body.push(data.len() as u8);
    body.extend_from_slice(data);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_holding_register_body_matches_wire_example() {
        let body = build_read_registers(FC_READ_HOLDING_REGISTERS, 0x0064, 1).unwrap();
        assert_eq!(body, vec![0x03, 0x00, 0x64, 0x00, 0x01]);
    }

    #[test]
    fn write_single_coil_on_off() {
        assert_eq!(
            build_write_single_coil(0x000A, true),
            vec![0x05, 0x00, 0x0A, 0xFF, 0x00]
        );
        assert_eq!(
            build_write_single_coil(0x000A, false),
            vec![0x05, 0x00, 0x0A, 0x00, 0x00]
        );
    }

    #[test]
    fn write_multiple_coils_packs_lsb_first() {
        let body = build_write_multiple_coils(0x0100, &[true, false, true]).unwrap();
        assert_eq!(body, vec![0x0F, 0x01, 0x00, 0x00, 0x03, 0x01, 0b0000_0101]);
    }

    #[test]
    fn write_multiple_registers_body() {
        let body = build_write_multiple_registers(0x0100, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(
            body,
            vec![0x10, 0x01, 0x00, 0x00, 0x02, 0x04, 0x12, 0x34, 0x56, 0x78]
        );
    }

    #[test]
    fn quantity_out_of_range_is_rejected() {
        assert!(build_read_bits(FC_READ_COILS, 0, 0).is_err());
        assert!(build_read_bits(FC_READ_COILS, 0, 2001).is_err());
        assert!(build_read_registers(FC_READ_HOLDING_REGISTERS, 0, 126).is_err());
        assert!(build_write_multiple_registers(0, &[0; 248]).is_err()); // 124 registers
        assert!(build_write_multiple_registers(0, &[0; 3]).is_err()); // odd length
    }

    #[test]
    fn address_plus_quantity_overflow_is_rejected() {
        assert!(build_read_registers(FC_READ_HOLDING_REGISTERS, 0xFFFF, 2).is_err());
    }
}
