//! VTable: slot index -> byte offset di dalam table
//!
//! VTable adalah array biasa (bukan polymorphic type):
//! ```text
//! [u16 vtable bytes][u16 table bytes][u16 slot0][u16 slot1]...
//! ```
//! Entry 0 berarti field absent, reader harus pakai default schema.

use crate::core::{checked_range, read_scalar, ByteStore};
use crate::error::Result;

use super::layout::{slot_to_voffset, SIZE_VOFFSET, VTABLE_METADATA_FIELDS};

/// Read-only view ke satu vtable
///
/// Seluruh range vtable sudah divalidasi saat `new`, jadi lookup slot
/// tidak perlu bounds check lagi.
#[derive(Clone, Copy, Debug)]
pub struct VTable<'a> {
    buf: &'a [u8],
    pos: usize,
    byte_len: u16,
    table_len: u16,
}

impl<'a> VTable<'a> {
    /// Membuka vtable di posisi absolut `pos`
    pub fn new(buf: &'a [u8], pos: usize) -> Result<Self> {
        let byte_len: u16 = read_scalar(buf, pos)?;
        let table_len: u16 = read_scalar(buf, pos + SIZE_VOFFSET)?;

        let metadata = VTABLE_METADATA_FIELDS * SIZE_VOFFSET;
        checked_range(buf.len(), pos, (byte_len as usize).max(metadata))?;

        Ok(Self {
            buf,
            pos,
            byte_len,
            table_len,
        })
    }

    /// Posisi absolut vtable di buffer
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte width vtable (termasuk 4 bytes metadata)
    #[inline(always)]
    pub fn byte_len(&self) -> u16 {
        self.byte_len
    }

    /// Byte width table yang dideskripsikan (termasuk backref 4 bytes)
    #[inline(always)]
    pub fn table_len(&self) -> u16 {
        self.table_len
    }

    /// Jumlah slot yang tercatat di vtable ini
    #[inline(always)]
    pub fn num_slots(&self) -> usize {
        (self.byte_len as usize).saturating_sub(VTABLE_METADATA_FIELDS * SIZE_VOFFSET)
            / SIZE_VOFFSET
    }

    /// Offset field relatif ke awal table, 0 jika absent / di luar vtable
    #[inline(always)]
    pub fn slot_offset(&self, slot: u16) -> u16 {
        let voffset = slot_to_voffset(slot);
        if voffset + SIZE_VOFFSET > self.byte_len as usize {
            return 0;
        }
        let at = self.pos + voffset;
        u16::from_le_bytes([self.buf[at], self.buf[at + 1]])
    }

    /// Raw bytes vtable
    pub fn as_bytes(&self) -> &'a [u8] {
        let len = (self.byte_len as usize).max(VTABLE_METADATA_FIELDS * SIZE_VOFFSET);
        &self.buf[self.pos..self.pos + len]
    }

    /// Iterasi slot yang present: `(slot, offset)`
    pub fn present_slots(&self) -> impl Iterator<Item = (u16, u16)> + 'a {
        let vt = *self;
        (0..vt.num_slots() as u16)
            .map(move |slot| (slot, vt.slot_offset(slot)))
            .filter(|&(_, offset)| offset != 0)
    }
}

/// Registry vtable yang sudah ditulis oleh satu builder
///
/// Posisi disimpan sebagai jarak dari AKHIR buffer, karena buffer
/// tumbuh ke depan dan posisi absolut berubah setiap grow.
#[derive(Debug, Default)]
pub(crate) struct VTableRegistry {
    written: Vec<usize>,
}

impl VTableRegistry {
    /// Cari vtable dengan bytes identik dengan `candidate`.
    ///
    /// Pencarian dari yang terbaru, karena table sejenis biasanya
    /// dibangun berdekatan.
    pub(crate) fn find(&self, store: &ByteStore, candidate: &[u8]) -> Option<usize> {
        let data = store.as_slice();
        self.written.iter().rev().copied().find(|&from_end| {
            let start = data.len() - from_end;
            data.get(start..start + candidate.len()) == Some(candidate)
        })
    }

    pub(crate) fn register(&mut self, from_end: usize) {
        self.written.push(from_end);
    }

    pub(crate) fn len(&self) -> usize {
        self.written.len()
    }

    pub(crate) fn clear(&mut self) {
        self.written.clear();
    }
}
