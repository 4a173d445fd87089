//! Loaded source files and line arithmetic.

use std::io;
use std::path::{Path, PathBuf};

use super::{Error, Language, Result};

/// Bytes of one source file plus the grammar they parse under.
///
/// This is all the pipeline needs from disk: the parser consumes the bytes
/// and language, the extractor resolves suspicious lines against the same
/// bytes via [`byte_of_line`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    pub content: Vec<u8>,
}

impl SourceFile {
    /// Read a file, detecting its language from the extension.
    ///
    /// A missing file surfaces as [`Error::FileNotFound`] so extraction can
    /// skip it and move on; anything outside the C family is rejected
    /// before touching the disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let Some(language) = Language::detect(&path) else {
            return Err(Error::UnsupportedLanguage { path });
        };

        match std::fs::read(&path) {
            Ok(content) => Ok(Self {
                path,
                language,
                content,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::FileNotFound { path })
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Byte offset of the first byte of a 1-indexed line.
///
/// Scans newlines linearly. A line past the end of the file clamps to the
/// final byte; an empty file resolves to 0.
pub fn byte_of_line(content: &[u8], line: u32) -> usize {
    let mut current = 1u32;
    for (pos, byte) in content.iter().enumerate() {
        if current == line {
            return pos;
        }
        if *byte == b'\n' {
            current += 1;
        }
    }
    content.len().saturating_sub(1)
}
