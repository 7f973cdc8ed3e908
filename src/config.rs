//! Builder configuration

/// Batas jumlah slot per table.
///
/// VTable byte width = (2 + N) * 2 harus muat di u16.
pub const MAX_FIELDS: u16 = 32_765;

/// Konfigurasi untuk [`Builder`](crate::protocol::Builder)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Kapasitas awal arena (bytes). Arena tumbuh otomatis.
    pub initial_capacity: usize,
    /// Tulis value walaupun sama dengan default schema.
    ///
    /// Berguna jika field tersebut nantinya mau di-mutate in-place,
    /// karena mutation hanya bisa ke field yang present.
    pub force_defaults: bool,
    /// Reuse vtable yang identik (byte-for-byte)
    pub dedup_vtables: bool,
    /// Jumlah field maksimum untuk `start_object`
    pub max_fields: u16,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            force_defaults: false,
            dedup_vtables: true,
            max_fields: MAX_FIELDS,
        }
    }
}

impl BuilderConfig {
    /// Config default dengan kapasitas awal tertentu
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = BuilderConfig::default();
        assert_eq!(cfg.initial_capacity, 1024);
        assert!(!cfg.force_defaults);
        assert!(cfg.dedup_vtables);
        assert_eq!(cfg.max_fields, MAX_FIELDS);
    }

    #[test]
    fn test_max_fields_fits_vtable_width() {
        let width = (2 + MAX_FIELDS as usize) * 2;
        assert!(width <= u16::MAX as usize);
    }
}
