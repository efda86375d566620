//! Transport contract (C7).
//!
//! The physical serial link, its configuration, and the inter-character
//! gap handling of a real RTU round-trip are external collaborators this
//! crate treats as an abstract, synchronous `exchange`. [`SerialTransport`]
//! is a concrete implementation over `serialport` provided for convenience;
//! callers may supply any other [`Transport`] implementor instead (a mock
//! for tests, a USB-to-RTU bridge, a replay log, ...).

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::SerialConfig;
use crate::crc;
use crate::error::{IoOperation, TransportError};

/// Abstract synchronous request/response round-trip over one Modbus link.
pub trait Transport {
    /// Sends `request` and returns the bytes of the slave's reply, up to
    /// whatever inter-character gap timeout the transport enforces. The
    /// returned buffer is exactly the bytes received — no truncation or
    /// padding.
    fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Optional transport-level pre-check hook bound to CRC verification;
    /// a transport using RTU framing for its own purposes (e.g. chaining
    /// multiple masters) can use this before forwarding bytes onward.
    fn verify_received(&self, buf: &[u8]) -> bool {
        crc::verify(buf)
    }
}

/// `serialport`-backed [`Transport`]. The port is wrapped in a blocking
/// `Mutex` purely so a `ModbusClient<SerialTransport>` can be shared across
/// threads if the caller adds their own external serialization — the
/// protocol itself never holds the lock across more than one `exchange`.
pub struct SerialTransport {
    port: Mutex<Box<dyn serialport::SerialPort>>,
    read_chunk_len: usize,
    timeout: Duration,
}

impl SerialTransport {
    /// Opens and configures the serial port described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.device, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()?;

        debug!(port = %config.serial_port_info(), "opened serial transport");

        Ok(Self {
            port: Mutex::new(port),
            read_chunk_len: 256,
            timeout: config.timeout,
        })
    }

    /// Opens a port with an explicit timeout override, useful when the same
    /// device needs a longer timeout for a slow slave.
    pub fn open_with_timeout(config: &SerialConfig, timeout: Duration) -> Result<Self, TransportError> {
        let mut config = config.clone();
        config.timeout = timeout;
        Self::open(&config)
    }
}

impl Transport for SerialTransport {
    fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut port = self
            .port
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        trace!(frame = %hex::encode(request), "writing RTU request");

        std::io::Write::write_all(&mut *port, request).map_err(|e| TransportError::Io {
            operation: IoOperation::Write,
            details: e.to_string(),
            source: e,
        })?;
        port.flush().map_err(|e| TransportError::Io {
            operation: IoOperation::Flush,
            details: e.to_string(),
            source: e,
        })?;

        // The port's configured timeout bounds each individual `read`, not
        // the whole frame: a slave's reply arrives as a burst of bytes, and
        // one `read` call can return as soon as whatever has reached the
        // OS buffer so far, well short of a full RTU frame. Keep reading
        // until a `read` times out with nothing new — that gap is the
        // transport-level stand-in for the inter-character silence that
        // marks end-of-frame — or the port reports an error.
        let mut response = Vec::new();
        let mut chunk = vec![0u8; self.read_chunk_len];
        loop {
            match std::io::Read::read(&mut *port, &mut chunk) {
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    if response.is_empty() {
                        return Err(TransportError::Timeout(self.timeout));
                    }
                    break;
                }
                Err(e) => {
                    return Err(TransportError::Io {
                        operation: IoOperation::Read,
                        details: e.to_string(),
                        source: e,
                    })
                }
            }
        }

        trace!(frame = %hex::encode(&response), "received RTU response");
        Ok(response)
    }

    fn verify_received(&self, buf: &[u8]) -> bool {
        crc::verify(buf)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Test double recording every request sent and replaying canned
    /// responses in order.
    pub struct MockTransport {
        responses: Mutex<std::collections::VecDeque<Result<Vec<u8>, TransportError>>>,
        pub sent: Mutex<Vec<Vec<u8>>>,
    }

    impl MockTransport {
        pub fn new(responses: Vec<Vec<u8>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn with_error(mut self, err: TransportError) -> Self {
            self.responses.get_mut().unwrap().push_back(Err(err));
            self
        }

        pub fn push_error(&self, err: TransportError) {
            self.responses.lock().unwrap().push_back(Err(err));
        }
    }

    impl Transport for MockTransport {
        fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
            self.sent.lock().unwrap().push(request.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Timeout(Duration::from_millis(0))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    #[test]
    fn mock_transport_replays_responses_in_order() {
        let transport = MockTransport::new(vec![vec![0x01, 0x02], vec![0x03, 0x04]]);
        assert_eq!(transport.exchange(&[0xAA]).unwrap(), vec![0x01, 0x02]);
        assert_eq!(transport.exchange(&[0xBB]).unwrap(), vec![0x03, 0x04]);
        assert_eq!(transport.sent.lock().unwrap().as_slice(), &[vec![0xAA], vec![0xBB]]);
    }

    #[test]
    fn mock_transport_exhausted_queue_times_out() {
        let transport = MockTransport::new(vec![]);
        assert!(transport.exchange(&[0x01]).is_err());
    }
}
