//! Core module: Byte Store dan Mmap-backed buffer storage
//!
//! Prinsip desain:
//! - Zero-Copy: handle hanya menyimpan posisi + referensi ke bytes
//! - Little-endian di semua platform
//! - Tidak ada komponen lain yang meng-interpretasi bytes secara langsung

mod byte_store;
mod mmap_storage;

pub use byte_store::{read_bytes, read_scalar, write_scalar, ByteStore, Scalar};
pub(crate) use byte_store::checked_range;
pub use mmap_storage::{write_buffer_file, MappedBuffer, MappedBufferMut};
