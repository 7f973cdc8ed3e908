//! zerotab - Zero-Copy Table Encoding
//!
//! Arsitektur:
//! - Byte Store: growable byte region, typed little-endian access
//! - VTable: slot -> offset, field absent = default schema
//! - Table / Struct / Vector handle: view zero-copy tanpa deserialization
//! - Builder: bottom-up, vtable dedup, satu root offset
//!
//! ```
//! use zerotab::protocol::{root, Builder};
//!
//! let mut builder = Builder::new();
//! let name = builder.create_string("orc");
//! builder.start_object(3);
//! builder.prepend_offset_slot(0, name);
//! builder.prepend_slot::<i16>(1, 80, 100);
//! let monster = builder.end_object();
//! builder.finish(monster);
//!
//! let table = root(builder.finished_data()).unwrap();
//! assert_eq!(table.get_str(0).unwrap(), Some("orc"));
//! assert_eq!(table.get::<i16>(1, 100).unwrap(), 80);
//! assert_eq!(table.get::<i16>(2, 150).unwrap(), 150);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;

pub use config::BuilderConfig;
pub use error::{Error, Result};
