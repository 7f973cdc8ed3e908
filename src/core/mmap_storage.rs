//! Memory-Mapped Buffer Storage untuk Zero-Copy Read
//!
//! Finished buffer di-mmap langsung ke virtual memory:
//! - Zero-copy read: root `Table` menunjuk langsung ke page cache
//! - Kernel-managed paging: buffer besar tidak perlu dibaca utuh
//! - In-place mutation: `MappedBufferMut` menulis langsung ke file

use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::protocol::{self, Table, TableMut};

/// Read-only mmap dari satu finished buffer
pub struct MappedBuffer {
    mmap: Mmap,
}

impl MappedBuffer {
    /// Membuka file buffer read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        // SAFETY: File dibuka read-only. Caller tidak boleh memodifikasi
        // file dari proses lain selama mapping hidup.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        tracing::debug!(path = %path.as_ref().display(), len = mmap.len(), "buffer mapped");
        Ok(Self { mmap })
    }

    /// Raw bytes (ZERO-COPY!)
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Root table dari buffer
    pub fn root(&self) -> Result<Table<'_>> {
        protocol::root(&self.mmap)
    }

    /// Root table dari buffer size-prefixed
    pub fn size_prefixed_root(&self) -> Result<Table<'_>> {
        protocol::size_prefixed_root(&self.mmap)
    }
}

/// Read-write mmap untuk in-place mutation yang persisten
pub struct MappedBufferMut {
    mmap: MmapMut,
}

impl MappedBufferMut {
    /// Membuka file buffer read-write (ukuran file tidak diubah)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        // SAFETY: File sudah dibuka dengan read/write permission
        let mmap = unsafe { MmapOptions::new().map_mut(&file)? };

        tracing::debug!(path = %path.as_ref().display(), len = mmap.len(), "buffer mapped (rw)");
        Ok(Self { mmap })
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Root table read-only
    pub fn root(&self) -> Result<Table<'_>> {
        protocol::root(&self.mmap)
    }

    /// Root table untuk mutation
    pub fn root_mut(&mut self) -> Result<TableMut<'_>> {
        protocol::root_mut(&mut self.mmap)
    }

    /// Sinkronkan perubahan ke disk
    pub fn flush(&self) -> Result<()> {
        self.mmap.flush()?;
        tracing::debug!(len = self.mmap.len(), "mapped buffer flushed");
        Ok(())
    }
}

/// Tulis finished buffer ke file (truncate jika sudah ada)
pub fn write_buffer_file<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path.as_ref())?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Builder;

    fn build_sample() -> Vec<u8> {
        let mut builder = Builder::new();
        builder.start_object(2);
        builder.prepend_slot::<u32>(0, 77, 0);
        builder.prepend_slot::<i16>(1, -5, 0);
        let root = builder.end_object();
        builder.finish(root);
        builder.take_finished()
    }

    #[test]
    fn test_mapped_buffer_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        write_buffer_file(&path, &build_sample()).unwrap();

        let mapped = MappedBuffer::open(&path).unwrap();
        let root = mapped.root().unwrap();
        assert_eq!(root.get::<u32>(0, 0).unwrap(), 77);
        assert_eq!(root.get::<i16>(1, 0).unwrap(), -5);
        assert_eq!(root.get::<u8>(5, 42).unwrap(), 42);
    }

    #[test]
    fn test_mapped_mutation_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mutable.bin");
        write_buffer_file(&path, &build_sample()).unwrap();

        // Mutate dan flush
        {
            let mut mapped = MappedBufferMut::open(&path).unwrap();
            let mut root = mapped.root_mut().unwrap();
            assert!(root.mutate::<u32>(0, 1234).unwrap());
            assert!(!root.mutate::<u8>(3, 1).unwrap());
            mapped.flush().unwrap();
        }

        // Reopen dan verifikasi
        {
            let mapped = MappedBuffer::open(&path).unwrap();
            let root = mapped.root().unwrap();
            assert_eq!(root.get::<u32>(0, 0).unwrap(), 1234);
            assert_eq!(root.get::<i16>(1, 0).unwrap(), -5);
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MappedBuffer::open(dir.path().join("nope.bin")).err().unwrap();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
