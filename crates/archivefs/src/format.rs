//! Archive format identification by magic bytes.
//!
//! File extensions are not trusted: release artifacts are often downloaded
//! under generic names, so the leading bytes decide the format.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Number of bytes inspected when identifying a format.
pub const SNIFF_LEN: usize = 512;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const BZIP2_MAGIC: &[u8] = b"BZh";
const ZIP_MAGICS: [&[u8]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// Stream compression wrapped around a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Not compressed.
    None,
    /// gzip (`.gz`, `.tgz`).
    Gzip,
    /// Zstandard (`.zst`).
    Zstd,
    /// xz / LZMA2 (`.xz`).
    Xz,
    /// bzip2 (`.bz2`).
    Bzip2,
}

impl Compression {
    /// Identify a compression codec from the leading bytes of a stream.
    ///
    /// Returns `None` when no known codec signature matches.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        if head.starts_with(GZIP_MAGIC) {
            Some(Self::Gzip)
        } else if head.starts_with(ZSTD_MAGIC) {
            Some(Self::Zstd)
        } else if head.starts_with(XZ_MAGIC) {
            Some(Self::Xz)
        } else if head.starts_with(BZIP2_MAGIC) {
            Some(Self::Bzip2)
        } else {
            None
        }
    }

    /// Wrap `inner` in the matching decoder.
    ///
    /// Decoders read every concatenated member, not just the first one.
    pub fn reader<'a, R: Read + 'a>(self, inner: R) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::None => Box::new(inner),
            Self::Gzip => Box::new(flate2::read::MultiGzDecoder::new(inner)),
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(inner)?),
            Self::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(inner)),
            Self::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(inner)),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
            Self::Xz => "xz",
            Self::Bzip2 => "bzip2",
        };
        f.write_str(name)
    }
}

/// Layout of an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Zip container.
    Zip,
    /// Tar stream, possibly compressed.
    Tar(Compression),
    /// A single compressed file that is not a tar stream.
    Compressed(Compression),
    /// Unrecognized content, exposed as a single file.
    Raw,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => f.write_str("zip"),
            Self::Tar(Compression::None) => f.write_str("tar"),
            Self::Tar(c) => write!(f, "tar+{c}"),
            Self::Compressed(c) => write!(f, "{c}"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

/// Check for a zip local header, empty archive or spanned archive signature.
#[must_use]
pub fn is_zip_magic(head: &[u8]) -> bool {
    ZIP_MAGICS.iter().any(|magic| head.starts_with(magic))
}

/// Check whether a 512-byte block looks like a tar header.
///
/// Accepts POSIX/GNU headers by their `ustar` magic and old v7 headers by
/// their checksum.
#[must_use]
pub fn is_tar_header(block: &[u8]) -> bool {
    if block.len() < SNIFF_LEN {
        return false;
    }
    if &block[257..262] == b"ustar" {
        return true;
    }
    header_checksum_matches(&block[..SNIFF_LEN])
}

fn header_checksum_matches(block: &[u8]) -> bool {
    let field = &block[148..156];
    let digits: String = field
        .iter()
        .skip_while(|b| **b == b' ')
        .take_while(|b| **b != 0 && **b != b' ')
        .map(|b| *b as char)
        .collect();
    let Ok(stored) = u32::from_str_radix(&digits, 8) else {
        return false;
    };
    if block.iter().all(|b| *b == 0) {
        return false;
    }
    let computed: u32 = block
        .iter()
        .enumerate()
        .map(|(i, b)| if (148..156).contains(&i) { 32 } else { u32::from(*b) })
        .sum();
    stored == computed
}

/// Read until `buf` is full or the stream ends.
pub(crate) fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Identify the format of the file at `path`.
pub fn detect(path: &Path) -> Result<Format> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut head = [0u8; SNIFF_LEN];
    let n = read_up_to(&mut file, &mut head).map_err(|e| Error::io(path, e))?;
    let head = &head[..n];

    if is_zip_magic(head) {
        return Ok(Format::Zip);
    }

    if let Some(compression) = Compression::from_magic(head) {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut decoder = compression
            .reader(BufReader::new(file))
            .map_err(|e| Error::Decompression {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let mut block = [0u8; SNIFF_LEN];
        return Ok(match read_up_to(&mut decoder, &mut block) {
            Ok(n) if is_tar_header(&block[..n]) => Format::Tar(compression),
            Ok(_) => Format::Compressed(compression),
            Err(e) => {
                log::debug!("cannot peek into {} stream: {}", compression, e);
                Format::Compressed(compression)
            }
        });
    }

    if is_tar_header(head) {
        return Ok(Format::Tar(Compression::None));
    }

    Ok(Format::Raw)
}
