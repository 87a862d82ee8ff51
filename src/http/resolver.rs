//! Request target to file resolution.
//!
//! Targets are joined onto the document root, checked against the
//! filesystem and memory-mapped so the response body can be written straight
//! out of the page cache.

use std::ffi::OsStr;
use std::fs::File;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::debug;

use crate::config::StaticFilesConfig;
use crate::http::parser::RequestStatus;

/// Longest resolved path (document root plus target) the server accepts.
pub const FILENAME_LEN: usize = 200;

/// A read-only private mapping of a whole file.
///
/// The mapping is released when the value is dropped.
#[derive(Debug)]
pub struct MappedFile {
    ptr: NonNull<u8>,
    len: usize,
}

// The mapping is read-only and owned exclusively by this value.
unsafe impl Send for MappedFile {}
unsafe impl Sync for MappedFile {}

impl MappedFile {
    /// Maps the first `len` bytes of `file`. `len` must be non-zero.
    pub fn map(file: &File, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty file",
            ));
        }
        let ptr = mmap(file, len)?;
        Ok(Self { ptr, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr` points at `len` readable bytes for as long as the
        // mapping lives, which is at least as long as `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        munmap(self.ptr, self.len);
    }
}

/// Safe wrapper for `libc::mmap` with `PROT_READ` and `MAP_PRIVATE`.
fn mmap(file: &File, len: usize) -> io::Result<NonNull<u8>> {
    let addr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ,
            libc::MAP_PRIVATE,
            file.as_raw_fd(),
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(addr.cast::<u8>()).ok_or_else(|| io::Error::other("mmap returned null"))
}

/// Safe wrapper for `libc::munmap`.
fn munmap(ptr: NonNull<u8>, len: usize) {
    let ret = unsafe { libc::munmap(ptr.as_ptr().cast(), len) };
    if ret == -1 {
        debug!(error = %io::Error::last_os_error(), "munmap failed");
    }
}

/// A file ready to be served.
#[derive(Debug)]
pub struct Resource {
    pub path: PathBuf,
    /// `None` for empty files.
    pub file: Option<MappedFile>,
}

impl Resource {
    pub fn len(&self) -> usize {
        self.file.as_ref().map_or(0, MappedFile::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        self.file.as_ref().map_or(&[][..], MappedFile::as_bytes)
    }
}

/// Resolves a normalized request target under the document root.
///
/// On failure the error is the status the response should report:
/// [`RequestStatus::NotFound`], [`RequestStatus::Forbidden`] or
/// [`RequestStatus::Internal`].
pub fn resolve(config: &StaticFilesConfig, target: &[u8]) -> Result<Resource, RequestStatus> {
    let path = strip_query(target);

    if config.reserved_paths.iter().any(|p| p.as_bytes() == path) {
        debug!(url = %String::from_utf8_lossy(path), "Refusing reserved path");
        return Err(RequestStatus::Forbidden);
    }
    if path.split(|b| *b == b'/').any(|segment| segment == b"..") {
        debug!(url = %String::from_utf8_lossy(path), "Refusing path traversal");
        return Err(RequestStatus::Forbidden);
    }

    let full = join(&config.root, path)?;

    let metadata = match std::fs::metadata(&full) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(path = %full.display(), error = %e, "stat failed");
            return Err(RequestStatus::NotFound);
        }
    };
    if metadata.permissions().mode() & u32::from(libc::S_IROTH) == 0 {
        return Err(RequestStatus::Forbidden);
    }
    if metadata.is_dir() {
        return Err(RequestStatus::NotFound);
    }
    if !metadata.is_file() {
        return Err(RequestStatus::Forbidden);
    }

    let file = File::open(&full).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RequestStatus::NotFound,
        io::ErrorKind::PermissionDenied => RequestStatus::Forbidden,
        _ => RequestStatus::Internal,
    })?;

    let len = usize::try_from(metadata.len()).map_err(|_| RequestStatus::Internal)?;
    let mapped = if len == 0 {
        None
    } else {
        let mapped = MappedFile::map(&file, len).map_err(|e| {
            debug!(path = %full.display(), error = %e, "mmap failed");
            RequestStatus::Internal
        })?;
        Some(mapped)
    };

    Ok(Resource {
        path: full,
        file: mapped,
    })
}

fn strip_query(target: &[u8]) -> &[u8] {
    let end = target
        .iter()
        .position(|b| *b == b'?' || *b == b'#')
        .unwrap_or(target.len());
    &target[..end]
}

fn join(root: &Path, path: &[u8]) -> Result<PathBuf, RequestStatus> {
    let root = root.as_os_str().as_bytes();
    if root.len() + path.len() > FILENAME_LEN {
        debug!(len = root.len() + path.len(), "Resolved path too long");
        return Err(RequestStatus::Internal);
    }

    let mut full = Vec::with_capacity(FILENAME_LEN);
    full.extend_from_slice(root);
    full.extend_from_slice(path);
    Ok(PathBuf::from(OsStr::from_bytes(&full)))
}
