use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("no data arrived within the link timeout")]
    Timeout,
    #[error("link i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// An ordered byte source with blocking reads bounded by a timeout.
///
/// The device (a serial port in practice) is opened and owned by the caller;
/// the pipeline only reads. A call attempts to fill `buf` within the link's
/// configured timeout and may return short when the timeout cuts it off.
/// Zero bytes within the timeout is reported as [`LinkError::Timeout`].
pub trait ByteLink {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;
}

/// Adapts any [`Read`] into a [`ByteLink`].
///
/// End of input behaves like a timed-out serial port, so a file or in-memory
/// capture can stand in for the device.
pub struct ReaderLink<R> {
    inner: R,
}

impl<R: Read> ReaderLink<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ByteLink for ReaderLink<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == std::io::ErrorKind::TimedOut => break,
                Err(err) => return Err(err.into()),
            }
        }

        if filled == 0 {
            return Err(LinkError::Timeout);
        }

        Ok(filled)
    }
}
