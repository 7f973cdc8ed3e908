//! Struct Handle: record fixed-layout inline
//!
//! Tidak ada vtable. Setiap field selalu present di byte offset yang
//! diketahui statis oleh generated code. Struct di dalam struct disimpan
//! inline (copy di level byte), tidak pernah lewat indirection.

use crate::core::{read_bytes, read_scalar, write_scalar, Scalar};
use crate::error::{Error, Result};

/// Posisi absolut field di `offset` dari awal struct (checked)
#[inline(always)]
fn field_pos(buf_len: usize, pos: usize, offset: usize) -> Result<usize> {
    pos.checked_add(offset)
        .ok_or_else(|| Error::out_of_range(pos, offset, buf_len))
}

/// Read-only view ke struct inline
#[derive(Clone, Copy, Debug)]
pub struct Struct<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Struct<'a> {
    #[inline(always)]
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Field scalar di `offset` bytes dari awal struct
    #[inline(always)]
    pub fn get<T: Scalar>(&self, offset: usize) -> Result<T> {
        read_scalar(self.buf, field_pos(self.buf.len(), self.pos, offset)?)
    }

    /// Struct nested inline di `offset`
    #[inline(always)]
    pub fn get_struct(&self, offset: usize) -> Result<Struct<'a>> {
        Ok(Struct::new(self.buf, field_pos(self.buf.len(), self.pos, offset)?))
    }

    /// Raw bytes struct (`size` dari schema)
    pub fn as_bytes(&self, size: usize) -> Result<&'a [u8]> {
        read_bytes(self.buf, self.pos, size)
    }
}

/// Struct view dengan akses tulis. Field struct selalu present,
/// jadi mutate hanya gagal jika posisi di luar buffer.
#[derive(Debug)]
pub struct StructMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> StructMut<'a> {
    #[inline(always)]
    pub fn new(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline(always)]
    pub fn as_struct(&self) -> Struct<'_> {
        Struct::new(self.buf, self.pos)
    }

    #[inline(always)]
    pub fn get<T: Scalar>(&self, offset: usize) -> Result<T> {
        read_scalar(self.buf, field_pos(self.buf.len(), self.pos, offset)?)
    }

    /// Overwrite field di `offset`
    #[inline(always)]
    pub fn mutate<T: Scalar>(&mut self, offset: usize, value: T) -> Result<()> {
        let pos = field_pos(self.buf.len(), self.pos, offset)?;
        write_scalar(self.buf, pos, value)
    }

    /// Nested struct inline yang bisa di-mutate
    pub fn struct_mut(&mut self, offset: usize) -> Result<StructMut<'_>> {
        let pos = field_pos(self.buf.len(), self.pos, offset)?;
        Ok(StructMut::new(&mut *self.buf, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Layout: { a: i16 @0, pad @2, b: f32 @4, inner { x: u8 @8, y: u8 @9 } }
    fn sample() -> Vec<u8> {
        let mut buf = vec![0u8; 12];
        buf[0..2].copy_from_slice(&(-3i16).to_le_bytes());
        buf[4..8].copy_from_slice(&1.5f32.to_le_bytes());
        buf[8] = 7;
        buf[9] = 9;
        buf
    }

    #[test]
    fn test_struct_fields() {
        let buf = sample();
        let s = Struct::new(&buf, 0);
        assert_eq!(s.get::<i16>(0).unwrap(), -3);
        assert_eq!(s.get::<f32>(4).unwrap(), 1.5);

        let inner = s.get_struct(8).unwrap();
        assert_eq!(inner.get::<u8>(0).unwrap(), 7);
        assert_eq!(inner.get::<u8>(1).unwrap(), 9);
        assert_eq!(s.as_bytes(12).unwrap().len(), 12);
        assert!(s.as_bytes(13).is_err());
    }

    #[test]
    fn test_struct_out_of_range() {
        let buf = sample();
        let s = Struct::new(&buf, 8);
        assert!(s.get::<u64>(0).is_err());
    }

    #[test]
    fn test_offset_overflow_is_out_of_range() {
        let mut buf = sample();
        let s = Struct::new(&buf, 4);
        assert!(matches!(s.get::<u8>(usize::MAX), Err(Error::OutOfRange { .. })));
        assert!(matches!(s.get_struct(usize::MAX), Err(Error::OutOfRange { .. })));

        let mut s = StructMut::new(&mut buf, 4);
        assert!(matches!(s.get::<u16>(usize::MAX - 1), Err(Error::OutOfRange { .. })));
        assert!(matches!(s.mutate::<u8>(usize::MAX, 1), Err(Error::OutOfRange { .. })));
        assert!(s.struct_mut(usize::MAX).is_err());
        assert_eq!(buf, sample());
    }

    #[test]
    fn test_struct_mutation() {
        let mut buf = sample();
        {
            let mut s = StructMut::new(&mut buf, 0);
            s.mutate::<f32>(4, -2.25).unwrap();
            s.struct_mut(8).unwrap().mutate::<u8>(1, 42).unwrap();
            assert!(s.mutate::<u32>(10, 1).is_err());
            assert_eq!(s.as_struct().get::<i16>(0).unwrap(), -3);
        }
        assert_eq!(f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]), -2.25);
        assert_eq!(buf[9], 42);
        assert_eq!(&buf[10..], &[0, 0]);
    }
}
