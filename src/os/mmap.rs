// src/os/mmap.rs

//! Shared read-write mapping of device memory.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use log::{debug, warn};

/// A `MAP_SHARED` mapping of the first `len` bytes of a device. Writes land in
/// video memory directly. Unmapped on drop.
#[derive(Debug)]
pub struct MappedRegion {
    ptr: *mut u8,
    len: usize,
}

impl MappedRegion {
    pub fn new(file: &File, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty region",
            ));
        }

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        debug!("Mapped {} bytes of fd {} at {:p}", len, file.as_raw_fd(), ptr);

        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.len) } == -1 {
            warn!(
                "Failed to unmap {} bytes at {:p}: {}",
                self.len,
                self.ptr,
                io::Error::last_os_error()
            );
        }
    }
}

// SAFETY: the region is owned exclusively by one MappedRegion; access goes
// through &self / &mut self.
unsafe impl Send for MappedRegion {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Read;

    #[test]
    fn writes_reach_the_backing_file() {
        let mut temp = tempfile::NamedTempFile::new().expect("create temp file");
        temp.as_file().set_len(64).expect("size temp file");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(temp.path())
            .expect("reopen temp file");

        {
            let mut region = MappedRegion::new(&file, 64).expect("map temp file");
            region.as_mut_slice()[..4].copy_from_slice(b"fb0!");
            assert_eq!(&region.as_slice()[..4], b"fb0!");
        }

        let mut contents = Vec::new();
        temp.read_to_end(&mut contents).expect("read back");
        assert_eq!(&contents[..4], b"fb0!");
        assert_eq!(contents.len(), 64);
    }

    #[test]
    fn empty_regions_are_rejected() {
        let temp = tempfile::NamedTempFile::new().expect("create temp file");
        assert!(MappedRegion::new(temp.as_file(), 0).is_err());
    }
}
