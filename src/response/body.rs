use crate::error::Error;
use crate::host::{Guard, Host, StreamError};
use futures_io::{AsyncBufRead, AsyncRead, AsyncSeek};
use std::io::{BufRead, Cursor, Read, Result, Seek, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

/// The default ceiling on the number of bytes requested by one stream read.
pub const DEFAULT_READ_CHUNK_SIZE: u64 = 64 * 1024;

/// Reads a body stream to its end.
///
/// Each iteration obtains a fresh pollable for the stream, blocks on it, releases it, and then
/// reads up to `chunk_size` bytes. The loop ends when the host reports the stream closed, which is
/// the normal end of the body; no read is attempted after that.
///
/// # Errors
/// This function returns [`Error::Read`] if the stream fails for any reason other than being
/// closed. Bytes read before the failure are discarded.
pub(crate) fn drain<H: Host>(
	host: &H,
	stream: &H::InputStream,
	chunk_size: u64,
) -> std::result::Result<Vec<u8>, Error> {
	let mut data = Vec::new();
	loop {
		{
			let pollable = Guard::new(host.stream_subscribe(stream));
			host.block(&pollable);
		}
		match host.read(stream, chunk_size) {
			Ok(chunk) => {
				log::trace!("read {} bytes of response body", chunk.len());
				data.extend_from_slice(&chunk);
			}
			Err(StreamError::Closed) => break,
			Err(StreamError::Failed(detail)) => {
				log::debug!("response body failed after {} bytes: {detail}", data.len());
				return Err(Error::Read(detail));
			}
		}
	}
	Ok(data)
}

/// A response body held entirely in memory.
///
/// It can be read through [`std::io::Read`] or [`futures_io::AsyncRead`], the latter always
/// completing immediately, and can be rewound with [`Seek`] or [`AsyncSeek`]. It holds no host
/// resources.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResponseBody {
	/// The bytes and the current read position.
	inner: Cursor<Vec<u8>>,
}

impl ResponseBody {
	/// Wraps the bytes of a body, positioned at the start.
	pub fn new(data: Vec<u8>) -> Self {
		Self {
			inner: Cursor::new(data),
		}
	}

	/// Returns the whole body, regardless of the read position.
	pub fn as_bytes(&self) -> &[u8] {
		self.inner.get_ref()
	}

	/// Returns the length of the whole body.
	pub fn len(&self) -> usize {
		self.inner.get_ref().len()
	}

	/// Checks whether the body is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.get_ref().is_empty()
	}

	/// Moves the read position back to the start.
	pub fn rewind(&mut self) {
		self.inner.set_position(0);
	}

	/// Unwraps the bytes of the whole body.
	pub fn into_bytes(self) -> Vec<u8> {
		self.inner.into_inner()
	}
}

impl Read for ResponseBody {
	fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
		self.inner.read(buf)
	}
}

impl BufRead for ResponseBody {
	fn fill_buf(&mut self) -> Result<&[u8]> {
		self.inner.fill_buf()
	}

	fn consume(&mut self, amt: usize) {
		self.inner.consume(amt);
	}
}

impl Seek for ResponseBody {
	fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
		self.inner.seek(pos)
	}
}

impl AsyncRead for ResponseBody {
	fn poll_read(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize>> {
		Poll::Ready(self.get_mut().inner.read(buf))
	}
}

impl AsyncBufRead for ResponseBody {
	fn poll_fill_buf(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<&[u8]>> {
		Poll::Ready(self.get_mut().inner.fill_buf())
	}

	fn consume(self: Pin<&mut Self>, amt: usize) {
		self.get_mut().inner.consume(amt);
	}
}

impl AsyncSeek for ResponseBody {
	fn poll_seek(self: Pin<&mut Self>, _: &mut Context<'_>, pos: SeekFrom) -> Poll<Result<u64>> {
		Poll::Ready(self.get_mut().inner.seek(pos))
	}
}
