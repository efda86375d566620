use std::time::Duration;

use thiserror::Error;

/// High level classification of a [`ModbusError`], mirroring the `{kind, message,
/// code?}` tagged result described by the protocol spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AddressParse,
    Transport,
    ShortFrame,
    CrcMismatch,
    ModbusException,
    UnsupportedFunction,
    InvalidQuantity,
}

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("address parse error: {0}")]
    AddressParse(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("short frame: {len} bytes, expected at least 5")]
    ShortFrame { len: usize },

    #[error("CRC mismatch: calculated={calculated:04X}, received={received:04X}, frame={frame_hex}")]
    CrcMismatch {
        calculated: u16,
        received: u16,
        frame_hex: String,
    },

    #[error("Modbus exception 0x{code:02X} on function 0x{function:02X}: {message}")]
    Exception {
        function: u8,
        code: u8,
        message: &'static str,
    },

    #[error("unsupported function code: 0x{0:02X}")]
    UnsupportedFunction(u8),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl ModbusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AddressParse(_) => ErrorKind::AddressParse,
            Self::Transport(_) => ErrorKind::Transport,
            Self::ShortFrame { .. } => ErrorKind::ShortFrame,
            Self::CrcMismatch { .. } => ErrorKind::CrcMismatch,
            Self::Exception { .. } => ErrorKind::ModbusException,
            Self::UnsupportedFunction(_) => ErrorKind::UnsupportedFunction,
            Self::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
        }
    }

    /// The numeric exception code, when this error came from a device exception
    /// response.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Exception { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn address_parse(details: impl Into<String>) -> Self {
        Self::AddressParse(details.into())
    }

    pub(crate) fn invalid_quantity(details: impl Into<String>) -> Self {
        Self::InvalidQuantity(details.into())
    }
}

/// Maps a Modbus exception code to its standard textual description.
///
/// Unknown codes fall back to a generic message; the code itself is still
/// preserved on [`ModbusError::Exception`].
pub(crate) fn exception_message(code: u8) -> &'static str {
    match code {
        0x01 => "Illegal function",
        0x02 => "Illegal data address",
        0x03 => "Illegal data value",
        0x04 => "Server device failure",
        0x05 => "Acknowledge",
        0x06 => "Server device busy",
        0x08 => "Memory parity error",
        0x0A => "Gateway path unavailable",
        0x0B => "Gateway target failed to respond",
        _ => "Unknown exception",
    }
}

/// The concern the failing I/O operation was performing, used to give
/// [`TransportError::Io`] a more specific message than `std::io::Error` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Open,
    Read,
    Write,
    Flush,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Flush => write!(f, "flush"),
        }
    }
}

/// Errors raised by the transport (C7) collaborator — the serial port, or
/// whatever stands in for it.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("serial port error on {port}: {details}")]
    Serial {
        port: String,
        details: String,
        #[source]
        source: Option<serialport::Error>,
    },

    #[error("I/O error during {operation}: {details}")]
    Io {
        operation: IoOperation,
        details: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no response received within {0:?}")]
    Timeout(Duration),
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::Io(io_kind) => TransportError::Io {
                operation: match io_kind {
                    std::io::ErrorKind::TimedOut => IoOperation::Read,
                    std::io::ErrorKind::WriteZero => IoOperation::Write,
                    _ => IoOperation::Open,
                },
                details: err.description.clone(),
                source: std::io::Error::new(io_kind, err.description.clone()),
            },
            _ => TransportError::Serial {
                port: err.description.clone(),
                details: err.to_string(),
                source: Some(err),
            },
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io {
            operation: match err.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => IoOperation::Read,
                std::io::ErrorKind::WriteZero => IoOperation::Write,
                _ => IoOperation::Read,
            },
            details: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_message_known_and_unknown_codes() {
        assert_eq!(exception_message(0x02), "Illegal data address");
        assert_eq!(exception_message(0x0B), "Gateway target failed to respond");
        assert_eq!(exception_message(0x42), "Unknown exception");
    }

    #[test]
    fn error_kind_and_code_reporting() {
        let err = ModbusError::Exception {
            function: 0x03,
            code: 0x02,
            message: exception_message(0x02),
        };
        assert_eq!(err.kind(), ErrorKind::ModbusException);
        assert_eq!(err.code(), Some(0x02));

        let err = ModbusError::address_parse("missing offset");
        assert_eq!(err.kind(), ErrorKind::AddressParse);
        assert_eq!(err.code(), None);
    }
}
