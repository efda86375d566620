//! Synchronous Modbus RTU master library: address parsing, PDU building,
//! RTU framing, byte-order transforms, and a typed client façade over a
//! pluggable [`transport::Transport`].
//!
//! Server/slave role, concurrent multi-master access, Modbus ASCII, and
//! TCP/UDP framing are out of scope — this crate only ever initiates RTU
//! exchanges over a single link at a time.

pub mod address;
pub mod client;
pub mod config;
pub mod crc;
pub mod error;
pub mod logging;
pub mod pdu;
pub mod rtu;
pub mod transform;
pub mod transport;

pub use address::{parse_address, ParsedAddress};
pub use client::ModbusClient;
pub use config::{DataBits, Parity, SerialConfig, StopBits};
pub use error::{ErrorKind, ModbusError, TransportError};
pub use transform::{ByteTransform, StringEncoding};
pub use transport::{SerialTransport, Transport};
