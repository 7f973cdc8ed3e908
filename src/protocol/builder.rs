//! Bottom-Up Buffer Builder
//!
//! Prinsip desain:
//! - Buffer dibangun dari BELAKANG: cursor `head` turun terus, data baru
//!   selalu di alamat lebih rendah dari data sebelumnya
//! - Child (string, vector, sub-table) ditulis dulu, parent belakangan,
//!   jadi setiap reference parent -> child adalah offset maju yang bisa
//!   dihitung saat itu juga (tidak ada fix-up pass)
//! - Offset hasil builder diukur dari AKHIR buffer, sehingga tetap valid
//!   walaupun arena tumbuh (grow memindah data ke belakang region baru)
//! - VTable identik di-dedup byte-for-byte
//!
//! State machine:
//! ```text
//! Idle ──start_object──> BuildingObject (nested) ──end_object──> Idle
//!   │  ──start_vector──> BuildingVector          ──end_vector──> Idle
//!   └──finish──> Finished ──reset / take_finished──> Idle
//! ```
//! Pelanggaran protokol (slot di luar object, vector bersarang, dsb.)
//! adalah bug caller/generator dan langsung panic.

use crate::config::BuilderConfig;
use crate::core::{ByteStore, Scalar};

use super::layout::{
    vtable_byte_len, FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_UOFFSET, SIZE_VECTOR_LEN,
    SIZE_VOFFSET,
};
use super::vtable::VTableRegistry;

/// Offset hasil builder (jarak dari akhir buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(u32);

impl Offset {
    #[inline(always)]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<Offset> for u32 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

/// State builder yang terlihat dari luar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Idle,
    BuildingObject,
    BuildingVector,
    Finished,
}

/// Frame di stack builder
#[derive(Debug)]
enum Frame {
    /// Object yang sedang dibangun. `fields[slot]` = offset field
    /// (dari akhir buffer), 0 = belum ditulis.
    Object { fields: Vec<usize>, start: usize },
    /// Vector yang sedang dibangun
    Vector {
        count: usize,
        elem_width: usize,
        start: usize,
    },
}

/// Builder untuk satu buffer
///
/// Single-threaded: satu builder dimiliki eksklusif oleh thread yang
/// membangun buffer (tidak ada locking internal).
pub struct Builder {
    store: ByteStore,
    head: usize,
    min_align: usize,
    frames: Vec<Frame>,
    vtables: VTableRegistry,
    scratch: Vec<u8>,
    finished: bool,
    config: BuilderConfig,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Builder dengan config default
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    /// Builder dengan kapasitas awal tertentu
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_config(BuilderConfig::with_capacity(initial_capacity))
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        let store = ByteStore::new(config.initial_capacity);
        Self {
            head: store.len(),
            store,
            min_align: 1,
            frames: Vec::new(),
            vtables: VTableRegistry::default(),
            scratch: Vec::with_capacity(64),
            finished: false,
            config,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Reset untuk reuse. Alokasi arena dipertahankan.
    pub fn reset(&mut self) {
        self.head = self.store.len();
        self.min_align = 1;
        self.frames.clear();
        self.vtables.clear();
        self.finished = false;
    }

    /// State saat ini
    pub fn state(&self) -> BuilderState {
        if self.finished {
            return BuilderState::Finished;
        }
        match self.frames.last() {
            None => BuilderState::Idle,
            Some(Frame::Object { .. }) => BuilderState::BuildingObject,
            Some(Frame::Vector { .. }) => BuilderState::BuildingVector,
        }
    }

    /// Jumlah bytes yang sudah ditulis (= offset posisi head saat ini)
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.store.len() - self.head
    }

    /// Jumlah vtable unik yang sudah ditulis ke buffer ini
    pub fn vtable_count(&self) -> usize {
        self.vtables.len()
    }

    // ------------------------------------------------------------------
    // Primitive: alignment, padding, raw placement
    // ------------------------------------------------------------------

    /// Pastikan ada `needed` bytes kosong sebelum `head`
    fn ensure_space(&mut self, needed: usize) {
        if self.head >= needed {
            return;
        }
        let min_len = self.offset() + needed;
        assert!(
            min_len <= MAX_BUFFER_SIZE,
            "buffer cannot grow beyond {} bytes",
            MAX_BUFFER_SIZE
        );
        let added = self.store.grow_to(min_len);
        self.head += added;
    }

    /// Siapkan alignment `size` untuk data yang akan ditulis setelah
    /// `additional` bytes lagi, lalu pastikan kapasitas cukup.
    pub fn prep(&mut self, size: usize, additional: usize) {
        self.assert_not_finished();
        assert!(size.is_power_of_two(), "alignment must be a power of two, got {size}");
        if size > self.min_align {
            self.min_align = size;
        }
        let align_size = (self.offset() + additional).wrapping_neg() & (size - 1);
        self.ensure_space(align_size + size + additional);
        self.pad(align_size);
    }

    /// Tulis `n` bytes nol
    pub fn pad(&mut self, n: usize) {
        self.assert_not_finished();
        self.ensure_space(n);
        self.head -= n;
        self.store.zero(self.head..self.head + n);
    }

    /// Tulis scalar tanpa alignment. Caller wajib `prep` dulu.
    #[inline(always)]
    pub fn place<T: Scalar>(&mut self, value: T) {
        self.assert_not_finished();
        assert!(self.head >= T::WIDTH, "place without prep: no room left");
        self.head -= T::WIDTH;
        self.store.put(self.head, value);
    }

    fn place_bytes(&mut self, bytes: &[u8]) {
        self.assert_not_finished();
        assert!(self.head >= bytes.len(), "place without prep: no room left");
        self.head -= bytes.len();
        self.store.put_bytes(self.head, bytes);
    }

    /// Align + tulis scalar
    #[inline(always)]
    pub fn push<T: Scalar>(&mut self, value: T) {
        self.prep(T::WIDTH, 0);
        self.place(value);
    }

    /// Align + tulis relative offset ke `target` (yang sudah ditulis)
    pub fn push_offset(&mut self, target: Offset) {
        self.prep(SIZE_UOFFSET, 0);
        let target = target.value() as usize;
        assert!(
            target <= self.offset(),
            "offset {target} refers to data not yet written (offset is {})",
            self.offset()
        );
        let relative = self.offset() - target + SIZE_UOFFSET;
        self.place(relative as u32);
    }

    // ------------------------------------------------------------------
    // Object / table
    // ------------------------------------------------------------------

    fn assert_not_finished(&self) {
        assert!(!self.finished, "builder already finished; call reset() first");
    }

    fn assert_not_in_vector(&self, op: &str) {
        assert!(
            !matches!(self.frames.last(), Some(Frame::Vector { .. })),
            "{op} while a vector is being built"
        );
    }

    fn current_fields(&mut self) -> &mut Vec<usize> {
        match self.frames.last_mut() {
            Some(Frame::Object { fields, .. }) => fields,
            _ => panic!("slot written outside an open object"),
        }
    }

    /// Mulai table baru dengan maksimum `num_fields` slot
    pub fn start_object(&mut self, num_fields: usize) {
        self.assert_not_finished();
        self.assert_not_in_vector("start_object");
        assert!(
            num_fields <= self.config.max_fields as usize,
            "start_object with {num_fields} fields exceeds limit of {}",
            self.config.max_fields
        );
        self.frames.push(Frame::Object {
            fields: vec![0; num_fields],
            start: self.offset(),
        });
    }

    /// Catat bahwa field `slot` berada di posisi head saat ini
    pub fn slot(&mut self, slot: u16) {
        let offset = self.offset();
        let fields = self.current_fields();
        let index = slot as usize;
        assert!(
            index < fields.len(),
            "slot {slot} out of range for object with {} fields",
            fields.len()
        );
        fields[index] = offset;
    }

    /// Tulis scalar field, dilewati jika sama dengan `default`
    /// (kecuali `force_defaults`).
    pub fn prepend_slot<T: Scalar>(&mut self, slot: u16, value: T, default: T) {
        self.current_fields();
        if value != default || self.config.force_defaults {
            self.push(value);
            self.slot(slot);
        }
    }

    /// Scalar field tanpa default: `None` = absent
    pub fn prepend_optional_slot<T: Scalar>(&mut self, slot: u16, value: Option<T>) {
        self.current_fields();
        if let Some(value) = value {
            self.push(value);
            self.slot(slot);
        }
    }

    /// Field reference ke table/vector/string yang sudah ditulis
    pub fn prepend_offset_slot(&mut self, slot: u16, target: Offset) {
        self.current_fields();
        self.push_offset(target);
        self.slot(slot);
    }

    /// Field struct inline. Struct harus ditulis TEPAT sebelum call ini.
    pub fn prepend_struct_slot(&mut self, slot: u16, value: Offset) {
        self.current_fields();
        assert_eq!(
            value.value() as usize,
            self.offset(),
            "struct must be serialized inline right before its slot"
        );
        self.slot(slot);
    }

    /// Tutup table: tulis (atau reuse) vtable, return offset table
    pub fn end_object(&mut self) -> Offset {
        let (fields, start) = match self.frames.pop() {
            Some(Frame::Object { fields, start }) => (fields, start),
            Some(frame) => {
                self.frames.push(frame);
                panic!("end_object while a vector is being built");
            }
            None => panic!("end_object without start_object"),
        };

        // Placeholder backref, diisi setelah posisi vtable diketahui
        self.push::<i32>(0);
        let object_offset = self.offset();
        let table_len = object_offset - start;
        assert!(
            table_len <= u16::MAX as usize,
            "table of {table_len} bytes too large for vtable offsets"
        );

        // Slot absent di ekor tidak perlu disimpan
        let used = fields.iter().rposition(|&f| f != 0).map_or(0, |i| i + 1);

        self.scratch.clear();
        self.scratch
            .extend_from_slice(&(vtable_byte_len(used) as u16).to_le_bytes());
        self.scratch
            .extend_from_slice(&(table_len as u16).to_le_bytes());
        for &field in &fields[..used] {
            let rel = if field == 0 { 0 } else { object_offset - field };
            self.scratch.extend_from_slice(&(rel as u16).to_le_bytes());
        }

        let existing = if self.config.dedup_vtables {
            self.vtables.find(&self.store, &self.scratch)
        } else {
            None
        };

        let vtable_offset = match existing {
            Some(vtable_offset) => {
                tracing::trace!(object_offset, vtable_offset, "vtable reused");
                vtable_offset
            }
            None => {
                let image = std::mem::take(&mut self.scratch);
                self.prep(SIZE_VOFFSET, image.len() - SIZE_VOFFSET);
                self.place_bytes(&image);
                self.scratch = image;

                let vtable_offset = self.offset();
                self.vtables.register(vtable_offset);
                tracing::trace!(object_offset, vtable_offset, slots = used, "vtable written");
                vtable_offset
            }
        };

        // backref = posisi table - posisi vtable
        let table_pos = self.store.len() - object_offset;
        let backref = vtable_offset as i64 - object_offset as i64;
        self.store.put(table_pos, backref as i32);

        Offset(object_offset as u32)
    }

    // ------------------------------------------------------------------
    // Vector / string
    // ------------------------------------------------------------------

    /// Mulai vector `count` elemen selebar `elem_width`.
    ///
    /// Elemen ditulis dengan `place`/`push`/`push_offset` dalam urutan
    /// TERBALIK (elemen terakhir dulu), lalu `end_vector`.
    pub fn start_vector(&mut self, elem_width: usize, count: usize, alignment: usize) {
        self.assert_not_finished();
        self.assert_not_in_vector("start_vector");
        assert!(elem_width > 0, "vector element width must be non-zero");
        assert!(
            count <= u32::MAX as usize,
            "vector of {count} elements exceeds u32 count header"
        );
        let payload = elem_width
            .checked_mul(count)
            .filter(|&n| n <= MAX_BUFFER_SIZE)
            .unwrap_or_else(|| panic!("vector of {count} x {elem_width} bytes too large"));
        self.prep(SIZE_UOFFSET, payload);
        self.prep(alignment, payload);
        self.frames.push(Frame::Vector {
            count,
            elem_width,
            start: self.offset(),
        });
    }

    /// Tutup vector: tulis header count, return offset vector
    pub fn end_vector(&mut self) -> Offset {
        let (count, elem_width, start) = match self.frames.pop() {
            Some(Frame::Vector {
                count,
                elem_width,
                start,
            }) => (count, elem_width, start),
            Some(frame) => {
                self.frames.push(frame);
                panic!("end_vector while an object is being built");
            }
            None => panic!("end_vector without start_vector"),
        };

        let written = self.offset() - start;
        assert_eq!(
            written,
            count * elem_width,
            "vector declared {count} elements of {elem_width} bytes but {written} bytes were written"
        );

        self.ensure_space(SIZE_VECTOR_LEN);
        self.place(count as u32);
        Offset(self.offset() as u32)
    }

    /// String UTF-8 + NUL terminator (tidak dihitung di length)
    pub fn create_string(&mut self, s: &str) -> Offset {
        self.create_len_prefixed(s.as_bytes(), true)
    }

    /// Vector of u8 dari slice
    pub fn create_byte_vector(&mut self, bytes: &[u8]) -> Offset {
        self.create_len_prefixed(bytes, false)
    }

    fn create_len_prefixed(&mut self, bytes: &[u8], nul_terminated: bool) -> Offset {
        self.assert_not_finished();
        self.assert_not_in_vector("create_string");
        let extra = nul_terminated as usize;
        self.prep(SIZE_UOFFSET, bytes.len() + extra);
        if nul_terminated {
            self.place(0u8);
        }
        self.place_bytes(bytes);
        self.place(bytes.len() as u32);
        Offset(self.offset() as u32)
    }

    /// Vector scalar. Urutan baca = urutan `items`.
    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Offset {
        self.start_vector(T::WIDTH, items.len(), T::WIDTH);
        for &item in items.iter().rev() {
            self.place(item);
        }
        self.end_vector()
    }

    /// Vector of table/string/vector reference.
    ///
    /// `targets` dalam urutan maju; dikonversi ke relative offset saat
    /// ditulis.
    pub fn create_vector_of_offsets(&mut self, targets: &[Offset]) -> Offset {
        self.start_vector(SIZE_UOFFSET, targets.len(), SIZE_UOFFSET);
        for &target in targets.iter().rev() {
            self.push_offset(target);
        }
        self.end_vector()
    }

    /// Vector of string
    pub fn create_vector_of_strings(&mut self, items: &[&str]) -> Offset {
        let offsets: Vec<Offset> = items.iter().map(|s| self.create_string(s)).collect();
        self.create_vector_of_offsets(&offsets)
    }

    /// Vector of struct dari image struct yang sudah di-concat
    /// (urutan maju, masing-masing `struct_size` bytes).
    pub fn create_vector_of_structs(&mut self, images: &[u8], struct_size: usize, alignment: usize) -> Offset {
        assert!(
            struct_size > 0 && images.len() % struct_size == 0,
            "struct images ({} bytes) not a multiple of struct size {struct_size}",
            images.len()
        );
        self.start_vector(struct_size, images.len() / struct_size, alignment);
        self.place_bytes(images);
        self.end_vector()
    }

    /// Byte vector yang isinya buffer lengkap lain (nested root).
    /// Data di-align 8 supaya scalar di dalamnya tetap aligned.
    pub fn create_nested_buffer(&mut self, buffer: &[u8]) -> Offset {
        self.start_vector(1, buffer.len(), 8);
        self.place_bytes(buffer);
        self.end_vector()
    }

    /// Struct inline: image little-endian `bytes` dengan alignment `align`.
    ///
    /// Di dalam object, langsung ikuti dengan `prepend_struct_slot`.
    pub fn create_struct(&mut self, bytes: &[u8], align: usize) -> Offset {
        self.assert_not_finished();
        self.prep(align, bytes.len());
        self.place_bytes(bytes);
        Offset(self.offset() as u32)
    }

    // ------------------------------------------------------------------
    // Finish
    // ------------------------------------------------------------------

    /// Tulis root offset. Setelah ini buffer read-only.
    pub fn finish(&mut self, root: Offset) {
        self.finish_impl(root, None, false);
    }

    /// Finish dengan file identifier 4 bytes setelah root offset
    pub fn finish_with_identifier(&mut self, root: Offset, ident: &[u8; FILE_IDENTIFIER_LENGTH]) {
        self.finish_impl(root, Some(ident), false);
    }

    /// Finish dengan size prefix u32 di depan (untuk streaming multi-buffer)
    pub fn finish_size_prefixed(
        &mut self,
        root: Offset,
        ident: Option<&[u8; FILE_IDENTIFIER_LENGTH]>,
    ) {
        self.finish_impl(root, ident, true);
    }

    fn finish_impl(
        &mut self,
        root: Offset,
        ident: Option<&[u8; FILE_IDENTIFIER_LENGTH]>,
        size_prefixed: bool,
    ) {
        self.assert_not_finished();
        assert!(
            self.frames.is_empty(),
            "finish with {} unfinished object/vector frame(s)",
            self.frames.len()
        );

        let prefix = if size_prefixed { SIZE_VECTOR_LEN } else { 0 };
        let ident_len = ident.map_or(0, |id| id.len());
        self.prep(self.min_align, SIZE_UOFFSET + ident_len + prefix);
        if let Some(id) = ident {
            self.place_bytes(id);
        }
        self.push_offset(root);
        if size_prefixed {
            let size = self.offset() as u32;
            self.push(size);
        }

        self.finished = true;
        tracing::debug!(
            len = self.offset(),
            vtables = self.vtables.len(),
            min_align = self.min_align,
            "buffer finished"
        );
        self.vtables.clear();
    }

    /// Bytes buffer yang sudah selesai
    pub fn finished_data(&self) -> &[u8] {
        assert!(self.finished, "finished_data before finish");
        &self.store.as_slice()[self.head..]
    }

    /// Ambil ownership bytes hasil, builder kembali ke Idle
    pub fn take_finished(&mut self) -> Vec<u8> {
        assert!(self.finished, "take_finished before finish");
        let mut data = std::mem::take(&mut self.store).into_vec();
        data.drain(..self.head);
        self.store = ByteStore::new(self.config.initial_capacity);
        self.reset();
        data
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.state())
            .field("offset", &self.offset())
            .field("capacity", &self.store.len())
            .field("vtables", &self.vtables.len())
            .finish()
    }
}
