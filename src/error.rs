//! Error types untuk zerotab
//!
//! Taksonomi:
//! - Field absent BUKAN error: reader mengembalikan default / `None`
//! - `OutOfRange`: posisi di luar buffer (buffer bisa berasal dari sumber
//!   tidak terpercaya, jadi harus recoverable, tidak boleh crash)
//! - Builder misuse: panic, karena itu bug di caller/generator

use thiserror::Error;

/// Result type alias menggunakan Error crate ini
pub type Result<T> = std::result::Result<T, Error>;

/// Error untuk operasi baca/tulis buffer
#[derive(Error, Debug)]
pub enum Error {
    /// Akses `len` bytes di `pos` melewati batas buffer
    #[error("out of range: {len} bytes at position {pos} (buffer is {buf_len} bytes)")]
    OutOfRange {
        pos: usize,
        len: usize,
        buf_len: usize,
    },

    /// Index elemen vector melewati jumlah elemen
    #[error("index {index} out of bounds for vector of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// String field berisi bytes yang bukan UTF-8
    #[error("invalid UTF-8 in string at position {pos}")]
    InvalidUtf8 {
        pos: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    /// I/O error (mmap / file storage)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Membuat error out-of-range
    #[inline]
    pub fn out_of_range(pos: usize, len: usize, buf_len: usize) -> Self {
        Error::OutOfRange { pos, len, buf_len }
    }

    /// Apakah error ini berasal dari akses di luar batas buffer
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Error::OutOfRange { .. } | Error::IndexOutOfBounds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = Error::out_of_range(10, 4, 12);
        assert!(err.is_out_of_range());
        assert_eq!(
            err.to_string(),
            "out of range: 4 bytes at position 10 (buffer is 12 bytes)"
        );
    }

    #[test]
    fn test_io_is_not_out_of_range() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!err.is_out_of_range());
    }
}
