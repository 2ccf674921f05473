//! Byte-equality check between a source file and its mirror entry.
//!
//! Both sides are streamed in fixed-size chunks so memory use does not
//! depend on asset size. A compressed mirror entry that fails to decode is
//! reported as unequal rather than as an error.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{FastDlError, Result};
use crate::sync::compression::{CompressedReader, CompressionType};

/// Default comparison chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 128_000;

/// Outcome of a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub equal: bool,
    pub elapsed: Duration,
}

/// Compare the content of `source` with the decoded content of `mirror`.
pub fn files_equal(
    source: &Path,
    mirror: &Path,
    compression: CompressionType,
    chunk_size: usize,
) -> Result<Comparison> {
    let start = Instant::now();
    let chunk_size = chunk_size.max(1);

    let source_file = File::open(source).map_err(|e| FastDlError::io(e, "opening", source))?;
    let mirror_file = File::open(mirror).map_err(|e| FastDlError::io(e, "opening", mirror))?;

    let mut mirror_reader = match CompressedReader::new(mirror_file, compression) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!(path = %mirror.display(), error = %e, "mirror entry failed to open as {}", compression.name());
            return Ok(Comparison { equal: false, elapsed: start.elapsed() });
        }
    };

    let equal = match streams_equal(source_file, &mut mirror_reader, chunk_size) {
        Ok(equal) => equal,
        Err(StreamError::Source(e)) => return Err(FastDlError::io(e, "reading", source)),
        // A broken compressed stream only means the entry needs rewriting.
        Err(StreamError::Mirror(e)) if compression.is_compressed() => {
            tracing::debug!(path = %mirror.display(), error = %e, "mirror entry is corrupt");
            false
        }
        Err(StreamError::Mirror(e)) => return Err(FastDlError::io(e, "reading", mirror)),
    };

    Ok(Comparison { equal, elapsed: start.elapsed() })
}

enum StreamError {
    Source(io::Error),
    Mirror(io::Error),
}

fn streams_equal<A: Read, B: Read>(mut a: A, mut b: B, chunk_size: usize) -> std::result::Result<bool, StreamError> {
    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];

    loop {
        let n_a = read_chunk(&mut a, &mut buf_a).map_err(StreamError::Source)?;
        let n_b = read_chunk(&mut b, &mut buf_b).map_err(StreamError::Mirror)?;

        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the stream allows. Returns fewer bytes only at EOF.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
