//! Wire Layout
//!
//! Layout buffer (semua integer little-endian):
//! ```text
//! ┌──────────────┬───────────┬──────────────────────────────────────────┐
//! │ root (u32)   │ [ident 4B]│ padding + object graph                    │
//! └──────────────┴───────────┴──────────────────────────────────────────┘
//! Table : [i32 vtable backref][field bytes sesuai vtable]
//! VTable: [u16 vtable bytes][u16 table bytes][u16 offset] x N  (0 = absent)
//! Vector: [u32 count][elements]
//! String: [u32 len][bytes][0]   (NUL tidak dihitung di len)
//! ```
//!
//! Offset relatif (u32) selalu ditambahkan ke posisi tempat ia disimpan.

/// Lebar unsigned offset (root, table/vector/string reference)
pub const SIZE_UOFFSET: usize = 4;

/// Lebar signed offset (vtable backref di awal setiap table)
pub const SIZE_SOFFSET: usize = 4;

/// Lebar entry vtable
pub const SIZE_VOFFSET: usize = 2;

/// Lebar header panjang vector/string
pub const SIZE_VECTOR_LEN: usize = 4;

/// Entry metadata di awal vtable: vtable bytes + table bytes
pub const VTABLE_METADATA_FIELDS: usize = 2;

/// Panjang file identifier setelah root offset
pub const FILE_IDENTIFIER_LENGTH: usize = 4;

/// Ukuran buffer maksimum (offset harus muat di i32 positif)
pub const MAX_BUFFER_SIZE: usize = (1 << 31) - 1;

/// Posisi entry vtable untuk slot `slot`, relatif ke awal vtable
#[inline(always)]
pub const fn slot_to_voffset(slot: u16) -> usize {
    (VTABLE_METADATA_FIELDS + slot as usize) * SIZE_VOFFSET
}

/// Byte width vtable dengan `num_slots` entry
#[inline(always)]
pub const fn vtable_byte_len(num_slots: usize) -> usize {
    (VTABLE_METADATA_FIELDS + num_slots) * SIZE_VOFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_voffsets() {
        // Slot pertama selalu di byte 4 vtable
        assert_eq!(slot_to_voffset(0), 4);
        assert_eq!(slot_to_voffset(1), 6);
        assert_eq!(slot_to_voffset(13), 30);
    }

    #[test]
    fn test_vtable_byte_len() {
        assert_eq!(vtable_byte_len(0), 4);
        assert_eq!(vtable_byte_len(3), 10);
    }
}
