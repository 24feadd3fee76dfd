// Transparent gzip handling for input and output streams

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Suffixes probed, in order, when a plain path is given.
const GZIP_SUFFIXES: [&str; 2] = ["gz", "GZ"];

/// True if the path names a gzip stream (`.gz`, any case).
pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Prefer a compressed sibling (`<path>.gz`, then `<path>.GZ`) when one exists.
///
/// Paths that already name a compressed stream are returned unchanged, as is
/// the original path when no sibling is present.
pub fn resolve_compressed(path: &Path) -> PathBuf {
    if is_compressed(path) {
        return path.to_path_buf();
    }

    for suffix in GZIP_SUFFIXES {
        let mut candidate = path.as_os_str().to_os_string();
        candidate.push(".");
        candidate.push(suffix);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            log::debug!("using compressed sibling {}", candidate.display());
            return candidate;
        }
    }

    path.to_path_buf()
}

/// Open a file for reading, decompressing on the fly if its name says gzip.
pub fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if is_compressed(path) {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Output file handle; gzip-encoded when the target name says so.
pub enum OutputStream {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputStream {
    /// Flush buffers and, for gzip, write the trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(enc) => enc.finish()?.flush(),
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

pub fn create_output(path: &Path) -> io::Result<OutputStream> {
    let file = BufWriter::new(File::create(path)?);
    if is_compressed(path) {
        Ok(OutputStream::Gzip(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(OutputStream::Plain(file))
    }
}
