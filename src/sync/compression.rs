//! Stream compression for mirror entries.
//!
//! Mirror files are stored either raw or through gzip/zstd, named
//! `<original-name>.<suffix>`. Web servers serve these pre-compressed
//! files statically, so nothing is compressed on the fly.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzipCompression;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{FastDlError, Result};

/// Seconds per source byte, used for the compression time estimate.
const ESTIMATE_SECS_PER_BYTE: f64 = 9.5e-08;

/// Compression algorithm used for mirror entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// Raw byte copy.
    None,
    /// Gzip, understood by every HTTP client (default).
    #[default]
    Gzip,
    /// Zstd.
    Zstd,
}

impl CompressionType {
    /// Get a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// File suffix (without the dot) appended to compressed mirror entries.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gz"),
            Self::Zstd => Some("zst"),
        }
    }

    pub fn is_compressed(&self) -> bool {
        *self != Self::None
    }

    /// Name of the mirror entry for a source file name.
    pub fn mirror_name(&self, file_name: &OsStr) -> OsString {
        let mut name = file_name.to_os_string();
        if let Some(suffix) = self.suffix() {
            name.push(".");
            name.push(suffix);
        }
        name
    }

    /// Strip this codec's suffix from a mirror file name, returning the
    /// logical source file name. Suffixes of other codecs are kept, so their
    /// entries have no source counterpart and get pruned.
    pub fn logical_name<'a>(&self, mirror_name: &'a OsStr) -> &'a OsStr {
        let path = Path::new(mirror_name);
        match (self.suffix(), path.extension(), path.file_stem()) {
            (Some(suffix), Some(ext), Some(stem)) if ext == suffix => stem,
            _ => mirror_name,
        }
    }
}

/// Compression level (1-9, where 1 is fastest-lowest and 9 is slowest-highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub struct CompressionLevel(u8);

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(6)
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl CompressionLevel {
    /// Create a new compression level (clamped to 1-9).
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 9))
    }

    /// Fastest compression (level 1).
    pub fn fast() -> Self {
        Self(1)
    }

    /// Maximum compression (level 9).
    pub fn max() -> Self {
        Self(9)
    }

    /// Get the level value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Decoding reader over a mirror entry.
pub struct CompressedReader<R: Read> {
    inner: CompressedReaderInner<R>,
}

enum CompressedReaderInner<R: Read> {
    None(R),
    Gzip(GzDecoder<R>),
    Zstd(zstd::Decoder<'static, BufReader<R>>),
}

impl<R: Read> CompressedReader<R> {
    /// Create a new decoding reader.
    pub fn new(reader: R, compression: CompressionType) -> io::Result<Self> {
        let inner = match compression {
            CompressionType::None => CompressedReaderInner::None(reader),
            CompressionType::Gzip => CompressedReaderInner::Gzip(GzDecoder::new(reader)),
            CompressionType::Zstd => CompressedReaderInner::Zstd(zstd::Decoder::new(reader)?),
        };
        Ok(Self { inner })
    }
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            CompressedReaderInner::None(r) => r.read(buf),
            CompressedReaderInner::Gzip(r) => r.read(buf),
            CompressedReaderInner::Zstd(r) => r.read(buf),
        }
    }
}

/// Encoding writer producing a mirror entry.
pub struct CompressedWriter<W: Write> {
    inner: CompressedWriterInner<W>,
}

enum CompressedWriterInner<W: Write> {
    None(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Create a new encoding writer.
    pub fn new(writer: W, compression: CompressionType, level: CompressionLevel) -> io::Result<Self> {
        let inner = match compression {
            CompressionType::None => CompressedWriterInner::None(writer),
            CompressionType::Gzip => {
                let gzip_level = GzipCompression::new(level.value() as u32);
                CompressedWriterInner::Gzip(GzEncoder::new(writer, gzip_level))
            }
            CompressionType::Zstd => {
                CompressedWriterInner::Zstd(zstd::Encoder::new(writer, level.value() as i32)?)
            }
        };
        Ok(Self { inner })
    }

    /// Write the stream trailer and get the inner writer back.
    pub fn finish(self) -> io::Result<W> {
        match self.inner {
            CompressedWriterInner::None(w) => Ok(w),
            CompressedWriterInner::Gzip(w) => w.finish(),
            CompressedWriterInner::Zstd(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            CompressedWriterInner::None(w) => w.write(buf),
            CompressedWriterInner::Gzip(w) => w.write(buf),
            CompressedWriterInner::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            CompressedWriterInner::None(w) => w.flush(),
            CompressedWriterInner::Gzip(w) => w.flush(),
            CompressedWriterInner::Zstd(w) => w.flush(),
        }
    }
}

/// Rough time needed to compress `size` bytes.
pub fn estimated_compress_time(size: u64) -> Duration {
    Duration::from_secs_f64(size as f64 * ESTIMATE_SECS_PER_BYTE)
}

/// Produce a mirror entry from a source file, truncating any existing one.
///
/// Returns the number of bytes written to `dest`.
pub fn write_entry(
    source: &Path,
    dest: &Path,
    compression: CompressionType,
    level: CompressionLevel,
) -> Result<u64> {
    if !compression.is_compressed() {
        return std::fs::copy(source, dest).map_err(|e| FastDlError::io(e, "copying to", dest));
    }

    let mut input = File::open(source).map_err(|e| FastDlError::io(e, "opening", source))?;
    let output = File::create(dest).map_err(|e| FastDlError::io(e, "creating", dest))?;

    let mut writer = CompressedWriter::new(output, compression, level)
        .map_err(|e| FastDlError::io(e, "initializing encoder for", dest))?;
    io::copy(&mut input, &mut writer).map_err(|e| FastDlError::io(e, "compressing into", dest))?;
    let output = writer
        .finish()
        .map_err(|e| FastDlError::io(e, "finishing", dest))?;

    output
        .sync_all()
        .map_err(|e| FastDlError::io(e, "flushing", dest))?;
    let written = output
        .metadata()
        .map_err(|e| FastDlError::io(e, "reading metadata of", dest))?
        .len();
    Ok(written)
}

/// Compress data in memory.
pub fn compress(data: &[u8], compression: CompressionType, level: CompressionLevel) -> io::Result<Vec<u8>> {
    let mut writer = CompressedWriter::new(Vec::new(), compression, level)?;
    writer.write_all(data)?;
    writer.finish()
}

/// Decompress data in memory.
pub fn decompress(data: &[u8], compression: CompressionType) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut reader = CompressedReader::new(data, compression)?;
    reader.read_to_end(&mut output)?;
    Ok(output)
}
