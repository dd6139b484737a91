use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use kiosk_domain::ports::ScaleLink;
use kiosk_domain::SerialCommand;

#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    /// Quiet period after opening, the board resets when the port opens.
    pub settle: Duration,
}

/// Splits a byte stream into trimmed text lines, keeping any trailing
/// partial line until its newline arrives.
pub struct LineReader<R> {
    inner: R,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Returns `Ok(None)` when the read window elapses without a full line.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(Some(line));
            }
            let mut chunk = [0u8; 256];
            match self.inner.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
                Err(err) if err.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn take_buffered_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|byte| *byte == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }
}

pub struct SerialScaleLink {
    reader: Arc<Mutex<LineReader<Box<dyn SerialPort>>>>,
    writer: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialScaleLink {
    pub async fn open(settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .with_context(|| format!("failed to open serial port {}", settings.port))?;
        info!(
            "serial port {} opened at {} baud",
            settings.port, settings.baud_rate
        );

        tokio::time::sleep(settings.settle).await;
        port.clear(ClearBuffer::Input)
            .context("failed to clear serial input buffer")?;
        let writer = port
            .try_clone()
            .context("failed to clone serial port handle")?;

        Ok(Self {
            reader: Arc::new(Mutex::new(LineReader::new(port))),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl ScaleLink for SerialScaleLink {
    async fn send_command(&self, command: SerialCommand) -> Result<()> {
        let writer = self.writer.clone();
        let line = command.to_line();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut port = writer
                .lock()
                .map_err(|_| anyhow!("serial writer lock poisoned"))?;
            port.write_all(line.as_bytes())?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|err| anyhow!("serial write task failed: {}", err))??;
        debug!("serial -> {}", command);
        Ok(())
    }

    async fn read_line(&self) -> Result<Option<String>> {
        let reader = self.reader.clone();
        let line = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let mut reader = reader
                .lock()
                .map_err(|_| anyhow!("serial reader lock poisoned"))?;
            Ok(reader.next_line()?)
        })
        .await
        .map_err(|err| anyhow!("serial read task failed: {}", err))??;
        if let Some(line) = &line {
            debug!("serial <- {}", line);
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays reads one chunk at a time, then reports a timeout.
    struct ChunkedReader {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ChunkedReader {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(err)) => Err(err),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            }
        }
    }

    #[test]
    fn joins_partial_chunks_into_one_line() {
        let mut reader = LineReader::new(ChunkedReader::new(vec![
            Ok(b"BASE_WEI".to_vec()),
            Ok(b"GHT:12.5:g\r\n".to_vec()),
        ]));
        assert_eq!(
            reader.next_line().expect("read").as_deref(),
            Some("BASE_WEIGHT:12.5:g")
        );
        assert_eq!(reader.next_line().expect("read"), None);
    }

    #[test]
    fn partial_line_survives_a_timeout() {
        let mut reader = LineReader::new(ChunkedReader::new(vec![
            Ok(b"WEIGHT:4".to_vec()),
            Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            Ok(b"2.0:g\n".to_vec()),
        ]));
        assert_eq!(reader.next_line().expect("read"), None);
        assert_eq!(
            reader.next_line().expect("read").as_deref(),
            Some("WEIGHT:42.0:g")
        );
    }

    #[test]
    fn yields_buffered_lines_before_reading_again() {
        let mut reader = LineReader::new(ChunkedReader::new(vec![
            Ok(b"READY\nWEIGHT:1:g\n".to_vec()),
            Err(io::Error::new(io::ErrorKind::Interrupted, "again")),
            Ok(b"\xffDONE\n".to_vec()),
        ]));
        assert_eq!(reader.next_line().expect("read").as_deref(), Some("READY"));
        assert_eq!(
            reader.next_line().expect("read").as_deref(),
            Some("WEIGHT:1:g")
        );
        assert_eq!(
            reader.next_line().expect("read").as_deref(),
            Some("\u{fffd}DONE")
        );
    }

    #[test]
    fn surfaces_hard_io_errors() {
        let mut reader = LineReader::new(ChunkedReader::new(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))]));
        assert!(reader.next_line().is_err());
    }
}
