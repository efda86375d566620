//! Address parser (C3).
//!
//! Grammar: `[station ';'] [func ';'] offset`, tokens separated by `;`, the
//! final bare token is the offset. Whitespace is not permitted; parsing is
//! case-sensitive.

use crate::error::ModbusError;

/// An address parsed from an expression string, already holding the wire
/// value of the offset (post base-adjustment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAddress {
    pub station: u8,
    pub function_code: Option<u8>,
    pub offset: u16,
}

/// Parses an address expression of the form `"s=<st>;x=<fc>;<offset>"`.
///
/// `default_station` fills in the station when no `s=` token is present.
/// `address_base_is_zero` controls whether the parsed offset is
/// decremented by one before being stored as the wire value.
pub fn parse_address(
    expr: &str,
    default_station: u8,
    address_base_is_zero: bool,
) -> Result<ParsedAddress, ModbusError> {
    if expr.is_empty() {
        return Err(ModbusError::address_parse("empty address expression"));
    }

    let mut tokens: Vec<&str> = expr.split(';').collect();
    let offset_token = tokens.pop().unwrap();

    let mut station: Option<u8> = None;
    let mut function_code: Option<u8> = None;

    for token in tokens {
        if let Some(rest) = token.strip_prefix("s=") {
            let value: u8 = rest
                .parse()
                .map_err(|_| ModbusError::address_parse(format!("invalid station token: {token}")))?;
            station = Some(value);
        } else if let Some(rest) = token.strip_prefix("x=") {
            let value: u8 = rest
                .parse()
                .map_err(|_| ModbusError::address_parse(format!("invalid function token: {token}")))?;
            function_code = Some(value);
        } else {
            return Err(ModbusError::address_parse(format!(
                "unrecognized address token: {token}"
            )));
        }
    }

    if offset_token.is_empty() {
        return Err(ModbusError::address_parse("missing offset"));
    }
    let raw_offset: u32 = offset_token
        .parse()
        .map_err(|_| ModbusError::address_parse(format!("invalid offset: {offset_token}")))?;

    let adjusted: u32 = if address_base_is_zero {
        raw_offset
    } else {
        raw_offset
            .checked_sub(1)
            .ok_or_else(|| ModbusError::address_parse("offset underflow: base-one offset must be >= 1"))?
    };

    let offset: u16 = adjusted
        .try_into()
        .map_err(|_| ModbusError::address_parse(format!("offset out of range: {adjusted}")))?;

    Ok(ParsedAddress {
        station: station.unwrap_or(default_station),
        function_code,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_offset_uses_defaults_under_base_zero() {
        let addr = parse_address("100", 1, true).unwrap();
        assert_eq!(
            addr,
            ParsedAddress {
                station: 1,
                function_code: None,
                offset: 100,
            }
        );
    }

    #[test]
    fn bare_offset_decrements_under_base_one() {
        let addr = parse_address("100", 1, false).unwrap();
        assert_eq!(addr.offset, 99);
    }

    #[test]
    fn full_expression_with_station_and_function_override() {
        let addr = parse_address("s=3;x=4;7", 1, true).unwrap();
        assert_eq!(
            addr,
            ParsedAddress {
                station: 3,
                function_code: Some(4),
                offset: 7,
            }
        );
    }

    #[test]
    fn missing_offset_after_qualifier_is_an_error() {
        assert!(parse_address("s=3;", 1, true).is_err());
    }

    #[test]
    fn unknown_token_is_an_error() {
        assert!(parse_address("q=1;7", 1, true).is_err());
    }

    #[test]
    fn malformed_number_is_an_error() {
        assert!(parse_address("s=xyz;7", 1, true).is_err());
        assert!(parse_address("abc", 1, true).is_err());
    }

    #[test]
    fn base_one_zero_offset_underflows() {
        assert!(parse_address("0", 1, false).is_err());
    }
}
