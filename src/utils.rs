use std::{
    io::{ErrorKind, Read, Write},
    net::{SocketAddr, TcpStream},
};

use crate::errors::Result;

pub trait StreamHandler {
    fn read_stream(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn write_stream(&mut self, buf: &[u8]) -> Result<usize>;
    fn peer_addr(&self) -> Result<SocketAddr>;
}

impl StreamHandler for TcpStream {
    fn read_stream(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.read(buf) {
            Ok(n) => Ok(n),
            // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut.
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(std::io::Error::from(ErrorKind::TimedOut).into())
            }
            Err(e) => Err(e.into()),
        }
    }
    fn write_stream(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.write(buf)?)
    }
    fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(TcpStream::peer_addr(self)?)
    }
}

fn describe_peer<T: StreamHandler>(stream: &T) -> String {
    stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}

pub mod line_handling {
    use super::*;
    use crate::{ReplyFraming, MAX_REPLY_LEN};

    /// Writes `line` followed by a newline, retrying partial writes.
    pub fn send_line<T: StreamHandler>(stream: &mut T, line: &str) -> Result<()> {
        let framed = format!("{line}\n");
        let mut buf = framed.as_bytes();

        while !buf.is_empty() {
            let n = stream.write_stream(buf)?;
            if n == 0 {
                return Err(std::io::Error::from(ErrorKind::WriteZero).into());
            }
            buf = &buf[n..];
        }

        log::debug!(
            "Written {} bytes to addr: {}",
            framed.len(),
            describe_peer(stream)
        );

        Ok(())
    }

    /// One bounded receive. An empty result means the peer closed its side.
    pub fn receive_chunk<T: StreamHandler>(stream: &mut T, buf_size: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; buf_size];

        let bytes_read = stream.read_stream(&mut buf)?;

        log::debug!(
            "Read {bytes_read} bytes from addr: {}",
            describe_peer(stream)
        );

        buf.truncate(bytes_read);

        Ok(buf)
    }

    pub fn receive_until<T: StreamHandler>(
        stream: &mut T,
        delimiter: &[u8],
        buf_size: usize,
    ) -> Result<Vec<u8>> {
        let mut reply = Vec::new();

        loop {
            let chunk = receive_chunk(stream, buf_size)?;
            if chunk.is_empty() {
                log::debug!("Peer closed before the reply delimiter arrived");
                break;
            }
            reply.extend_from_slice(&chunk);

            if reply.ends_with(delimiter) || reply.len() >= MAX_REPLY_LEN {
                break;
            }
        }

        Ok(reply)
    }

    /// Collects one reply according to `framing` and decodes it as UTF-8.
    /// The fixed delay itself is the caller's job.
    pub fn receive_reply<T: StreamHandler>(
        stream: &mut T,
        framing: &ReplyFraming,
        buf_size: usize,
    ) -> Result<String> {
        let bytes = match framing {
            ReplyFraming::FixedDelay(_) => receive_chunk(stream, buf_size)?,
            ReplyFraming::Delimited(delimiter) => {
                receive_until(stream, delimiter.as_bytes(), buf_size)?
            }
        };

        Ok(String::from_utf8(bytes)?)
    }
}
