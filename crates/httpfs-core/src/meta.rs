//! POSIX stat-shaped metadata.

/// Metadata for one filesystem object, shaped like `struct stat`.
///
/// The remote tree is read-only, so only the owner and group read bits
/// are ever set. All three timestamps carry the server-reported
/// modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// File mode bits (type and permissions)
    pub mode: u32,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub mtime: i64,
    /// Access time, seconds since the Unix epoch
    pub atime: i64,
    /// Change time, seconds since the Unix epoch
    pub ctime: i64,
    /// Number of hard links
    pub nlink: u32,
    /// Owning user id
    pub uid: u32,
    /// Owning group id
    pub gid: u32,
}

impl FileMeta {
    /// Creates metadata for a regular file.
    pub fn file(size: u64, mtime: i64) -> Self {
        Self::with_type(libc::S_IFREG as u32, size, mtime)
    }

    /// Creates metadata for a directory.
    pub fn directory(mtime: i64) -> Self {
        Self::with_type(libc::S_IFDIR as u32, 0, mtime)
    }

    fn with_type(type_bits: u32, size: u64, mtime: i64) -> Self {
        Self {
            mode: type_bits | (libc::S_IRUSR | libc::S_IRGRP) as u32,
            size,
            mtime,
            atime: mtime,
            ctime: mtime,
            nlink: 1,
            uid: process_uid(),
            gid: process_gid(),
        }
    }

    /// Returns true if this describes a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    /// Returns true if this describes a regular file.
    pub fn is_file(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }
}

/// Effective user id of the current process.
pub fn process_uid() -> u32 {
    // SAFETY: getuid has no failure modes and touches no memory.
    unsafe { libc::getuid() }
}

/// Effective group id of the current process.
pub fn process_gid() -> u32 {
    // SAFETY: getgid has no failure modes and touches no memory.
    unsafe { libc::getgid() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_meta() {
        let meta = FileMeta::file(11, 1704067200);
        assert!(meta.is_file());
        assert!(!meta.is_dir());
        assert_eq!(meta.size, 11);
        assert_eq!(meta.mtime, 1704067200);
        assert_eq!(meta.atime, meta.mtime);
        assert_eq!(meta.ctime, meta.mtime);
        assert_eq!(meta.nlink, 1);
    }

    #[test]
    fn test_directory_meta() {
        let meta = FileMeta::directory(1704067200);
        assert!(meta.is_dir());
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn test_read_only_permissions() {
        let meta = FileMeta::file(1, 0);
        assert_eq!(meta.mode & 0o7777, (libc::S_IRUSR | libc::S_IRGRP) as u32);
    }

    #[test]
    fn test_process_ids() {
        let meta = FileMeta::directory(0);
        assert_eq!(meta.uid, process_uid());
        assert_eq!(meta.gid, process_gid());
    }
}
