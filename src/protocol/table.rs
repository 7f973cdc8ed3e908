//! Table Handle: zero-copy view ke satu table
//!
//! Tidak ada deserialization pass. Setiap getter:
//! 1. Baca backref i32 di posisi table -> posisi vtable
//! 2. Lookup slot di vtable -> offset field (0 = absent)
//! 3. Absent -> return default schema, present -> baca langsung dari buffer
//!
//! Trust boundary: reader TIDAK memvalidasi struktur buffer secara penuh.
//! Setiap akses bytes di-bounds-check (buffer rusak -> `Error::OutOfRange`,
//! tidak pernah panic), tapi value dari buffer rusak tetap undefined.
//! Buffer dari sumber tidak terpercaya dengan nesting dalam harus dibatasi
//! kedalamannya oleh caller.

use crate::core::{read_bytes, read_scalar, write_scalar, Scalar};
use crate::error::{Error, Result};

use super::layout::{FILE_IDENTIFIER_LENGTH, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VECTOR_LEN};
use super::structs::{Struct, StructMut};
use super::vector::{Vector, VectorMut};
use super::vtable::VTable;

/// Ikuti relative offset u32 yang disimpan di `pos`
#[inline(always)]
pub fn indirect(buf: &[u8], pos: usize) -> Result<usize> {
    let offset: u32 = read_scalar(buf, pos)?;
    pos.checked_add(offset as usize)
        .ok_or_else(|| Error::out_of_range(pos, offset as usize, buf.len()))
}

/// Bytes string/byte-vector yang header panjangnya ada di `pos`
#[inline(always)]
pub(crate) fn read_len_prefixed(buf: &[u8], pos: usize) -> Result<&[u8]> {
    let len: u32 = read_scalar(buf, pos)?;
    read_bytes(buf, pos + SIZE_VECTOR_LEN, len as usize)
}

/// String UTF-8 yang header panjangnya ada di `pos` (ZERO-COPY)
#[inline(always)]
pub(crate) fn read_str(buf: &[u8], pos: usize) -> Result<&str> {
    let bytes = read_len_prefixed(buf, pos)?;
    std::str::from_utf8(bytes).map_err(|source| Error::InvalidUtf8 { pos, source })
}

/// Root table dari finished buffer
pub fn root(buf: &[u8]) -> Result<Table<'_>> {
    let pos = indirect(buf, 0)?;
    Ok(Table::new(buf, pos))
}

/// Root table yang bisa di-mutate in-place
pub fn root_mut(buf: &mut [u8]) -> Result<TableMut<'_>> {
    let pos = indirect(buf, 0)?;
    Ok(TableMut::new(buf, pos))
}

/// Bagian buffer setelah size prefix u32
pub fn size_prefixed_payload(buf: &[u8]) -> Result<&[u8]> {
    read_len_prefixed(buf, 0)
}

/// Root table dari buffer yang diawali size prefix u32
pub fn size_prefixed_root(buf: &[u8]) -> Result<Table<'_>> {
    root(size_prefixed_payload(buf)?)
}

/// Cek file identifier 4 bytes setelah root offset
pub fn buffer_has_identifier(buf: &[u8], ident: &[u8; FILE_IDENTIFIER_LENGTH]) -> bool {
    read_bytes(buf, SIZE_UOFFSET, FILE_IDENTIFIER_LENGTH)
        .map(|found| found == ident)
        .unwrap_or(false)
}

/// Diskriminan union + payload (belum di-dispatch)
///
/// Core tidak tahu arti setiap tag; generated code yang memilih decoder
/// varian berdasarkan `tag`.
#[derive(Clone, Copy, Debug)]
pub struct UnionValue<'a> {
    /// Tag varian, 0 = NONE
    pub tag: u8,
    /// Payload table. `None` jika tag 0, atau tag non-zero tapi payload
    /// absent (union malformed, caller yang memutuskan).
    pub payload: Option<Table<'a>>,
}

impl<'a> UnionValue<'a> {
    #[inline(always)]
    pub fn is_none(&self) -> bool {
        self.tag == 0
    }

    /// Tag non-zero tapi payload tidak ada
    #[inline(always)]
    pub fn is_malformed(&self) -> bool {
        self.tag != 0 && self.payload.is_none()
    }
}

/// Read-only table view `(bytes, posisi)`
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Table<'a> {
    /// View table di posisi absolut `pos`. Tidak ada validasi di sini,
    /// error muncul saat field diakses.
    #[inline(always)]
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline(always)]
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// VTable milik table ini (vtable = pos - backref)
    pub fn vtable(&self) -> Result<VTable<'a>> {
        let backref: i32 = read_scalar(self.buf, self.pos)?;
        let vt_pos = usize::try_from(self.pos as i64 - backref as i64)
            .map_err(|_| Error::out_of_range(self.pos, SIZE_SOFFSET, self.buf.len()))?;
        VTable::new(self.buf, vt_pos)
    }

    /// Posisi absolut field `slot`, atau `None` jika absent
    #[inline]
    pub fn field_offset(&self, slot: u16) -> Result<Option<usize>> {
        match self.vtable()?.slot_offset(slot) {
            0 => Ok(None),
            offset => Ok(Some(self.pos + offset as usize)),
        }
    }

    /// Apakah field `slot` tersimpan di buffer
    pub fn is_present(&self, slot: u16) -> Result<bool> {
        Ok(self.field_offset(slot)?.is_some())
    }

    /// Scalar field, `default` jika absent
    #[inline]
    pub fn get<T: Scalar>(&self, slot: u16, default: T) -> Result<T> {
        match self.field_offset(slot)? {
            Some(pos) => read_scalar(self.buf, pos),
            None => Ok(default),
        }
    }

    /// Scalar field tanpa default (schema `optional`)
    pub fn get_optional<T: Scalar>(&self, slot: u16) -> Result<Option<T>> {
        self.field_offset(slot)?
            .map(|pos| read_scalar(self.buf, pos))
            .transpose()
    }

    /// Sub-table via indirection
    pub fn get_table(&self, slot: u16) -> Result<Option<Table<'a>>> {
        match self.field_offset(slot)? {
            Some(pos) => Ok(Some(Table::new(self.buf, indirect(self.buf, pos)?))),
            None => Ok(None),
        }
    }

    /// Struct inline (langsung di field area, tanpa indirection)
    pub fn get_struct(&self, slot: u16) -> Result<Option<Struct<'a>>> {
        Ok(self
            .field_offset(slot)?
            .map(|pos| Struct::new(self.buf, pos)))
    }

    /// Vector via indirection
    pub fn get_vector(&self, slot: u16) -> Result<Option<Vector<'a>>> {
        match self.field_offset(slot)? {
            Some(pos) => Vector::at(self.buf, indirect(self.buf, pos)?).map(Some),
            None => Ok(None),
        }
    }

    /// Raw bytes dari string / byte vector
    pub fn get_bytes(&self, slot: u16) -> Result<Option<&'a [u8]>> {
        match self.field_offset(slot)? {
            Some(pos) => read_len_prefixed(self.buf, indirect(self.buf, pos)?).map(Some),
            None => Ok(None),
        }
    }

    /// String UTF-8 (ZERO-COPY)
    pub fn get_str(&self, slot: u16) -> Result<Option<&'a str>> {
        match self.field_offset(slot)? {
            Some(pos) => read_str(self.buf, indirect(self.buf, pos)?).map(Some),
            None => Ok(None),
        }
    }

    /// Union: tag di `slot`, payload di `slot + 1`
    pub fn get_union(&self, slot: u16) -> Result<UnionValue<'a>> {
        let tag: u8 = self.get(slot, 0)?;
        if tag == 0 {
            return Ok(UnionValue { tag, payload: None });
        }

        let payload = match slot.checked_add(1) {
            Some(payload_slot) => self.get_table(payload_slot)?,
            None => None,
        };
        if payload.is_none() {
            tracing::trace!(tag, slot, "union tag without payload");
        }
        Ok(UnionValue { tag, payload })
    }

    /// Buka byte vector `slot` sebagai buffer independen (nested root)
    pub fn nested_root(&self, slot: u16) -> Result<Option<Table<'a>>> {
        self.get_bytes(slot)?.map(root).transpose()
    }
}

/// Table view dengan akses tulis untuk in-place mutation
///
/// Hanya field fixed-width yang SUDAH present yang bisa diubah.
/// Menambah field baru butuh re-layout seluruh table (tidak didukung).
#[derive(Debug)]
pub struct TableMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> TableMut<'a> {
    #[inline(always)]
    pub fn new(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Read-only view (reborrow)
    #[inline(always)]
    pub fn as_table(&self) -> Table<'_> {
        Table::new(self.buf, self.pos)
    }

    /// Lepas akses tulis
    pub fn into_table(self) -> Table<'a> {
        Table::new(self.buf, self.pos)
    }

    /// Overwrite scalar field yang present.
    ///
    /// `Ok(false)` jika field absent (tidak ada byte yang ditulis).
    pub fn mutate<T: Scalar>(&mut self, slot: u16, value: T) -> Result<bool> {
        match self.as_table().field_offset(slot)? {
            Some(pos) => {
                write_scalar(self.buf, pos, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sub-table yang bisa di-mutate
    pub fn table_mut(&mut self, slot: u16) -> Result<Option<TableMut<'_>>> {
        let Some(pos) = self.as_table().field_offset(slot)? else {
            return Ok(None);
        };
        let target = indirect(self.buf, pos)?;
        Ok(Some(TableMut::new(&mut *self.buf, target)))
    }

    /// Struct inline yang bisa di-mutate
    pub fn struct_mut(&mut self, slot: u16) -> Result<Option<StructMut<'_>>> {
        let Some(pos) = self.as_table().field_offset(slot)? else {
            return Ok(None);
        };
        Ok(Some(StructMut::new(&mut *self.buf, pos)))
    }

    /// Vector yang elemen fixed-width-nya bisa di-mutate
    pub fn vector_mut(&mut self, slot: u16) -> Result<Option<VectorMut<'_>>> {
        let Some(pos) = self.as_table().field_offset(slot)? else {
            return Ok(None);
        };
        let target = indirect(self.buf, pos)?;
        VectorMut::at(&mut *self.buf, target).map(Some)
    }

    /// Overwrite satu elemen vector fixed-width.
    ///
    /// `Ok(false)` jika vector absent, error jika index di luar jumlah elemen.
    pub fn mutate_element<T: Scalar>(&mut self, slot: u16, index: usize, value: T) -> Result<bool> {
        match self.vector_mut(slot)? {
            Some(mut vector) => {
                vector.mutate(index, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
