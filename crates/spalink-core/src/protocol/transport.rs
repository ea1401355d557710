//! Byte-stream abstraction over the physical link
//!
//! The engine never touches a serial port directly; everything goes through
//! the [`Transport`] trait so tests and demo mode can substitute an
//! in-memory controller.

use serialport::SerialPort;
use std::io::Read;
use std::time::{Duration, Instant};

use super::ProtocolError;

/// Poll interval while waiting for bytes to arrive
const POLL_INTERVAL_MS: u64 = 2;

/// Cumulative byte counters for one link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Bytes written to the link
    pub tx_bytes: u64,
    /// Bytes read or discarded from the link
    pub rx_bytes: u64,
}

/// A half-duplex byte stream to the controller.
///
/// `read_until` is the only read primitive: the wire format has no length
/// field, so framing is done purely on delimiter bytes with a bounded
/// deadline. `Timeout` is the only read failure besides hard port errors.
pub trait Transport: Send {
    /// Read bytes until `delimiter` is seen or `timeout` elapses.
    /// Returns the bytes *before* the delimiter; the delimiter is consumed.
    fn read_until(&mut self, delimiter: u8, timeout: Duration) -> Result<Vec<u8>, ProtocolError>;

    /// Write all bytes to the link.
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError>;

    /// Discard any pending input. Returns the number of bytes thrown away.
    fn flush_input(&mut self) -> Result<usize, ProtocolError>;

    /// Cumulative tx/rx byte counters since the link was opened.
    /// Discarded input counts as received.
    fn stats(&self) -> LinkStats;
}

/// [`Transport`] implementation over a real serial port.
///
/// The port's own timeout is kept short; deadlines are enforced here by
/// polling `bytes_to_read()`, which behaves reliably across platforms where
/// blocking reads do not.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    stats: LinkStats,
}

impl SerialTransport {
    /// Wrap an already opened and configured serial port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            stats: LinkStats::default(),
        }
    }
}

impl Transport for SerialTransport {
    fn read_until(&mut self, delimiter: u8, timeout: Duration) -> Result<Vec<u8>, ProtocolError> {
        let start = Instant::now();
        let mut field = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            if start.elapsed() > timeout {
                tracing::trace!(
                    partial = field.len(),
                    "read_until: deadline reached without delimiter"
                );
                return Err(ProtocolError::Timeout);
            }

            let available = self
                .port
                .bytes_to_read()
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

            if available == 0 {
                std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                continue;
            }

            match self.port.read(&mut byte) {
                Ok(0) => {
                    std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                }
                Ok(_) => {
                    self.stats.rx_bytes += 1;
                    if byte[0] == delimiter {
                        return Ok(field);
                    }
                    field.push(byte[0]);
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    // Port-level timeout, keep polling until our deadline
                }
                Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        use std::io::Write;
        self.port
            .write_all(bytes)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        self.port
            .flush()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        self.stats.tx_bytes += bytes.len() as u64;
        Ok(())
    }

    fn flush_input(&mut self) -> Result<usize, ProtocolError> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))? as usize;

        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

        if pending > 0 {
            tracing::trace!(discarded = pending, "flush_input: dropped stray bytes");
        }
        self.stats.rx_bytes += pending as u64;
        Ok(pending)
    }

    fn stats(&self) -> LinkStats {
        self.stats
    }
}
