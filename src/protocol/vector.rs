//! Vector Handle: sequence dengan length prefix
//!
//! ```text
//! [u32 count][elem 0][elem 1]...[elem count-1]
//! ```
//! - Scalar / struct: elemen inline, `data + i * width`
//! - Table / string: elemen berupa relative offset u32 (butuh indirection)

use std::marker::PhantomData;

use crate::core::{checked_range, read_bytes, read_scalar, write_scalar, Scalar};
use crate::error::{Error, Result};

use super::layout::{SIZE_UOFFSET, SIZE_VECTOR_LEN};
use super::structs::Struct;
use super::table::{indirect, read_len_prefixed, read_str, Table};

/// Posisi elemen `index` dengan lebar `width`
#[inline(always)]
fn element_pos(buf_len: usize, data_pos: usize, len: usize, index: usize, width: usize) -> Result<usize> {
    if index >= len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    index
        .checked_mul(width)
        .and_then(|rel| data_pos.checked_add(rel))
        .ok_or_else(|| Error::out_of_range(data_pos, index.saturating_mul(width), buf_len))
}

/// Read-only view ke vector
#[derive(Clone, Copy, Debug)]
pub struct Vector<'a> {
    buf: &'a [u8],
    pos: usize,
    len: usize,
}

impl<'a> Vector<'a> {
    /// Vector dengan header count di posisi absolut `pos`
    pub fn at(buf: &'a [u8], pos: usize) -> Result<Self> {
        let len: u32 = read_scalar(buf, pos)?;
        Ok(Self {
            buf,
            pos,
            len: len as usize,
        })
    }

    /// Jumlah elemen
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Posisi header count
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Posisi elemen pertama
    #[inline(always)]
    pub fn data_pos(&self) -> usize {
        self.pos + SIZE_VECTOR_LEN
    }

    #[inline(always)]
    fn element_pos(&self, index: usize, width: usize) -> Result<usize> {
        element_pos(self.buf.len(), self.data_pos(), self.len, index, width)
    }

    /// Elemen scalar
    #[inline]
    pub fn get<T: Scalar>(&self, index: usize) -> Result<T> {
        read_scalar(self.buf, self.element_pos(index, T::WIDTH)?)
    }

    /// Elemen table (indirection per elemen)
    pub fn get_table(&self, index: usize) -> Result<Table<'a>> {
        let pos = self.element_pos(index, SIZE_UOFFSET)?;
        Ok(Table::new(self.buf, indirect(self.buf, pos)?))
    }

    /// Elemen string
    pub fn get_str(&self, index: usize) -> Result<&'a str> {
        let pos = self.element_pos(index, SIZE_UOFFSET)?;
        read_str(self.buf, indirect(self.buf, pos)?)
    }

    /// Elemen string / byte vector sebagai raw bytes
    pub fn get_bytes(&self, index: usize) -> Result<&'a [u8]> {
        let pos = self.element_pos(index, SIZE_UOFFSET)?;
        read_len_prefixed(self.buf, indirect(self.buf, pos)?)
    }

    /// Elemen struct inline dengan ukuran `size`
    pub fn get_struct(&self, index: usize, size: usize) -> Result<Struct<'a>> {
        let pos = self.element_pos(index, size)?;
        checked_range(self.buf.len(), pos, size)?;
        Ok(Struct::new(self.buf, pos))
    }

    /// Seluruh payload sebagai bytes (untuk vector of u8 / nested buffer)
    pub fn bytes(&self) -> Result<&'a [u8]> {
        read_bytes(self.buf, self.data_pos(), self.len)
    }

    /// Iterasi elemen scalar sesuai urutan asli
    pub fn iter<T: Scalar>(&self) -> ScalarIter<'a, T> {
        ScalarIter {
            vector: *self,
            index: 0,
            _marker: PhantomData,
        }
    }
}

/// Iterator elemen scalar dari [`Vector`]
pub struct ScalarIter<'a, T> {
    vector: Vector<'a>,
    index: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Scalar> Iterator for ScalarIter<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.index;
        (remaining, Some(remaining))
    }
}

/// Vector view dengan akses tulis.
///
/// Hanya elemen fixed-width yang bisa diubah, satu per satu. Jumlah
/// elemen dan identitas vector tidak bisa diubah setelah dibangun.
#[derive(Debug)]
pub struct VectorMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
    len: usize,
}

impl<'a> VectorMut<'a> {
    pub fn at(buf: &'a mut [u8], pos: usize) -> Result<Self> {
        let len: u32 = read_scalar(buf, pos)?;
        Ok(Self {
            buf,
            pos,
            len: len as usize,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_vector(&self) -> Vector<'_> {
        Vector {
            buf: self.buf,
            pos: self.pos,
            len: self.len,
        }
    }

    /// Overwrite elemen scalar `index`
    pub fn mutate<T: Scalar>(&mut self, index: usize, value: T) -> Result<()> {
        let pos = element_pos(
            self.buf.len(),
            self.pos + SIZE_VECTOR_LEN,
            self.len,
            index,
            T::WIDTH,
        )?;
        write_scalar(self.buf, pos, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_vector(values: &[u16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_scalar_elements() {
        let buf = raw_vector(&[10, 20, 30]);
        let v = Vector::at(&buf, 0).unwrap();

        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(v.get::<u16>(0).unwrap(), 10);
        assert_eq!(v.get::<u16>(2).unwrap(), 30);
        assert!(matches!(
            v.get::<u16>(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        ));

        let all: Vec<u16> = v.iter::<u16>().collect::<Result<_>>().unwrap();
        assert_eq!(all, vec![10, 20, 30]);
    }

    #[test]
    fn test_lying_count_is_out_of_range() {
        let mut buf = raw_vector(&[1, 2]);
        buf[0] = 50; // count palsu
        let v = Vector::at(&buf, 0).unwrap();
        assert_eq!(v.get::<u16>(1).unwrap(), 2);
        assert!(matches!(v.get::<u16>(10), Err(Error::OutOfRange { .. })));
        assert!(v.bytes().is_err());
    }

    #[test]
    fn test_struct_elements() {
        let buf = raw_vector(&[1, 2, 3, 4]);
        let v = Vector::at(&buf, 0).unwrap();
        // Perlakukan sebagai 2 struct @ 4 bytes, tapi count = 4
        let s = v.get_struct(1, 4).unwrap();
        assert_eq!(s.get::<u16>(0).unwrap(), 3);
        assert!(v.get_struct(3, 4).is_err());
    }

    #[test]
    fn test_mutate_element() {
        let mut buf = raw_vector(&[5, 6, 7]);
        {
            let mut v = VectorMut::at(&mut buf, 0).unwrap();
            v.mutate::<u16>(1, 600).unwrap();
            assert!(v.mutate::<u16>(3, 1).is_err());
            assert_eq!(v.as_vector().get::<u16>(1).unwrap(), 600);
        }
        assert_eq!(buf, raw_vector(&[5, 600, 7]));
    }
}
