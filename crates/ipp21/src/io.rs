//! # I/O Boundary
//!
//! The engine never touches `std::io` directly outside this module: `READ`
//! pulls from a [`LineSource`], `WRITE`/`DPRINT`/`BREAK` push through
//! plain `Write` sinks. Keeping the boundary this narrow is what lets the
//! engine's tests construct programs entirely in memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read as _};

use crate::error::{ErrorKind, IppError};

/// A source of input lines for `READ`. `next_line` returns `None` on EOF or
/// any I/O failure — per the specification, `READ` never terminates the
/// program, it falls back to `nil` instead.
pub trait LineSource {
    fn next_line(&mut self) -> Option<String>;
}

/// Reads lines from any buffered reader, stripping the trailing newline.
pub struct BufLineSource<R> {
    reader: R,
}

impl<R: BufRead> BufLineSource<R> {
    pub fn new(reader: R) -> Self {
        BufLineSource { reader }
    }
}

impl<R: BufRead> LineSource for BufLineSource<R> {
    fn next_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.ends_with('\n') {
                    buf.pop();
                    if buf.ends_with('\r') {
                        buf.pop();
                    }
                }
                Some(buf)
            }
            Err(_) => None,
        }
    }
}

/// Open `path` for use as a `READ` source, or stdin if `path` is `None`.
pub fn open_input_source(path: Option<&str>) -> Result<Box<dyn LineSource>, IppError> {
    match path {
        Some(p) => {
            let file = File::open(p).map_err(|e| ErrorKind::OpenErr.with_msg(format!("cannot open input {p}: {e}")))?;
            Ok(Box::new(BufLineSource::new(BufReader::new(file))))
        }
        None => Ok(Box::new(BufLineSource::new(BufReader::new(io::stdin())))),
    }
}

/// Read the full program source, from `path` or stdin.
pub fn read_source_bytes(path: Option<&str>) -> Result<Vec<u8>, IppError> {
    let mut bytes = Vec::new();
    match path {
        Some(p) => {
            let mut file = File::open(p).map_err(|e| ErrorKind::OpenErr.with_msg(format!("cannot open source {p}: {e}")))?;
            file.read_to_end(&mut bytes)
                .map_err(|e| ErrorKind::OpenErr.with_msg(format!("cannot read source {p}: {e}")))?;
        }
        None => {
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|e| ErrorKind::OpenErr.with_msg(format!("cannot read source from stdin: {e}")))?;
        }
    }
    Ok(bytes)
}
