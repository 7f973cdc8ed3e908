//! Protocol Layer: Zero-Copy VTable Encoding
//!
//! Prinsip desain:
//! - Self-describing: setiap table membawa vtable, field baru di schema
//!   baru tetap terbaca (sebagai default) dari buffer lama
//! - Zero-copy read: handle = (bytes, posisi), tidak ada parse di depan
//! - Bottom-up build: child dulu, parent belakangan, satu root offset

mod builder;
mod layout;
mod structs;
mod table;
mod vector;
mod vtable;

pub use builder::{Builder, BuilderState, Offset};
pub use layout::{
    slot_to_voffset, FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET,
    SIZE_VECTOR_LEN, SIZE_VOFFSET,
};
pub use structs::{Struct, StructMut};
pub use table::{
    buffer_has_identifier, indirect, root, root_mut, size_prefixed_payload, size_prefixed_root,
    Table, TableMut, UnionValue,
};
pub use vector::{ScalarIter, Vector, VectorMut};
pub use vtable::VTable;
