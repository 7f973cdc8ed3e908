//! Byte Store: growable byte region dengan typed little-endian access
//!
//! Prinsip desain:
//! - Semua integer/float disimpan little-endian, apapun arsitektur host
//! - Reader tidak pernah panic: akses di luar batas -> `Error::OutOfRange`
//! - Growth untuk builder terjadi ke arah DEPAN (prepend), sehingga
//!   offset yang diukur dari akhir buffer tidak pernah berubah

use std::fmt;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::protocol::{Table, TableMut};

/// Tipe fixed-width yang bisa dibaca/ditulis langsung dari buffer
///
/// Implementasi tersedia untuk `bool`, `u8`..`u64`, `i8`..`i64`, `f32`, `f64`.
pub trait Scalar: Copy + PartialEq + fmt::Debug {
    /// Lebar dalam bytes (juga dipakai sebagai alignment)
    const WIDTH: usize;

    /// Decode dari tepat `WIDTH` bytes
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode ke tepat `WIDTH` bytes
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline(always)]
                fn write_le(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const WIDTH: usize = 1;

    #[inline(always)]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline(always)]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

/// Validasi range `[pos, pos + len)` terhadap panjang buffer
#[inline(always)]
pub(crate) fn checked_range(buf_len: usize, pos: usize, len: usize) -> Result<Range<usize>> {
    match pos.checked_add(len) {
        Some(end) if end <= buf_len => Ok(pos..end),
        _ => Err(Error::out_of_range(pos, len, buf_len)),
    }
}

/// Baca scalar little-endian di posisi absolut `pos`
#[inline(always)]
pub fn read_scalar<T: Scalar>(buf: &[u8], pos: usize) -> Result<T> {
    let range = checked_range(buf.len(), pos, T::WIDTH)?;
    Ok(T::read_le(&buf[range]))
}

/// Tulis scalar little-endian di posisi absolut `pos`
#[inline(always)]
pub fn write_scalar<T: Scalar>(buf: &mut [u8], pos: usize, value: T) -> Result<()> {
    let range = checked_range(buf.len(), pos, T::WIDTH)?;
    value.write_le(&mut buf[range]);
    Ok(())
}

/// Borrowed view ke `len` bytes mulai `pos` (ZERO-COPY)
#[inline(always)]
pub fn read_bytes(buf: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    let range = checked_range(buf.len(), pos, len)?;
    Ok(&buf[range])
}

/// Pemilik tunggal memory buffer
///
/// Semua handle (Table, Struct, Vector) hanya view `(&[u8], pos)`
/// yang lifetime-nya terikat ke store ini.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteStore {
    data: Vec<u8>,
}

impl ByteStore {
    /// Store baru berisi `len` bytes nol
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0u8; len],
        }
    }

    /// Ambil alih buffer yang sudah ada (misal hasil `Builder::take_finished`)
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Typed read (checked)
    #[inline(always)]
    pub fn read<T: Scalar>(&self, pos: usize) -> Result<T> {
        read_scalar(&self.data, pos)
    }

    /// Typed write (checked, tidak auto-grow)
    #[inline(always)]
    pub fn write<T: Scalar>(&mut self, pos: usize, value: T) -> Result<()> {
        write_scalar(&mut self.data, pos, value)
    }

    /// Borrowed view ke raw bytes
    #[inline(always)]
    pub fn read_bytes(&self, pos: usize, len: usize) -> Result<&[u8]> {
        read_bytes(&self.data, pos, len)
    }

    /// Copy `bytes` ke posisi `pos` (checked)
    pub fn write_bytes(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        let range = checked_range(self.data.len(), pos, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Unchecked-by-Result write untuk builder.
    ///
    /// Builder selalu menulis di dalam region yang sudah di-reserve,
    /// jadi index di luar batas adalah bug internal (panic).
    #[inline(always)]
    pub(crate) fn put<T: Scalar>(&mut self, pos: usize, value: T) {
        value.write_le(&mut self.data[pos..pos + T::WIDTH]);
    }

    #[inline(always)]
    pub(crate) fn put_bytes(&mut self, pos: usize, bytes: &[u8]) {
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    #[inline(always)]
    pub(crate) fn zero(&mut self, range: Range<usize>) {
        self.data[range].fill(0);
    }

    /// Perbesar store sampai minimal `min_len` bytes.
    ///
    /// Konten lama dipindah ke AKHIR region baru (prepend growth), jadi
    /// jarak setiap byte ke akhir buffer tetap sama. Return jumlah bytes
    /// yang ditambahkan di depan.
    pub fn grow_to(&mut self, min_len: usize) -> usize {
        let old_len = self.data.len();
        if min_len <= old_len {
            return 0;
        }

        let new_len = min_len.max(old_len.saturating_mul(2)).max(1);
        let added = new_len - old_len;

        let mut grown = vec![0u8; new_len];
        grown[added..].copy_from_slice(&self.data);
        self.data = grown;

        tracing::trace!(old_len, new_len, "byte store grown");
        added
    }

    /// Root table dari finished buffer
    pub fn root(&self) -> Result<Table<'_>> {
        crate::protocol::root(&self.data)
    }

    /// Root table yang bisa di-mutate in-place
    pub fn root_mut(&mut self) -> Result<TableMut<'_>> {
        crate::protocol::root_mut(&mut self.data)
    }
}

impl fmt::Debug for ByteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStore")
            .field("len", &self.data.len())
            .finish()
    }
}

impl AsRef<[u8]> for ByteStore {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteStore {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}
