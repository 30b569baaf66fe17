//! FUSE request adapter.
//!
//! Bridges `fuser` callbacks onto the path-addressed façade. The tree is
//! read-only: every mutating operation is rejected before any network
//! traffic happens.

use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use tracing::debug;

use httpfs_core::{split_path, DirEntry, FileMeta};

use crate::inode::{PathTable, ROOT_INO};
use crate::server::HttpFs;
use crate::FsError;

/// TTL for kernel-cached attributes.
const TTL: Duration = Duration::from_secs(1);

/// FUSE driver wrapping the façade.
pub struct HttpFsDriver {
    fs: HttpFs,
    table: PathTable,
}

impl HttpFsDriver {
    /// Creates a driver over a façade.
    pub fn new(fs: HttpFs) -> Self {
        Self {
            fs,
            table: PathTable::new(),
        }
    }

    /// Attribute lookup by path.
    ///
    /// The root is synthesized locally without any traffic; everything
    /// else resolves through its parent's directory listing.
    pub fn attr_of(&self, path: &str) -> Result<FileMeta, i32> {
        if path == "/" {
            return Ok(root_meta());
        }

        let (parent, name) = split_path(path);
        let entry = self.fs.read_dir(parent).map_err(errno)?;
        entry.entries.get(name).cloned().ok_or(libc::ENOENT)
    }

    /// Directory listing by path.
    pub fn list_dir(&self, path: &str) -> Result<DirEntry, i32> {
        self.fs.read_dir(path).map_err(errno)
    }

    /// Byte-range read by path.
    pub fn read_range(&self, path: &str, offset: u64, size: u64) -> Result<Vec<u8>, i32> {
        self.fs.read_block(path, offset, size).map_err(errno)
    }

    /// Rejection shared by every mutating operation.
    ///
    /// Returns without touching the network or the cache.
    pub fn deny_mutation(&self, op: &str) -> i32 {
        debug!(op = op, "Rejected mutating operation on read-only mount");
        libc::EACCES
    }

    fn parent_ino(&mut self, path: &str) -> u64 {
        if path == "/" {
            return ROOT_INO;
        }
        let (parent, _) = split_path(path);
        let parent = if parent == "/" {
            parent
        } else {
            parent.trim_end_matches('/')
        };
        self.table.assign(parent)
    }
}

/// Synthetic root attributes: a readable directory with zeroed times.
fn root_meta() -> FileMeta {
    FileMeta::directory(0)
}

/// Maps a façade failure onto an errno.
fn errno(error: FsError) -> i32 {
    debug!(error = %error, "Filesystem operation failed");
    libc::EIO
}

fn system_time(secs: i64) -> SystemTime {
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs.max(0) as u64))
        .unwrap_or(UNIX_EPOCH)
}

fn to_file_attr(meta: &FileMeta, ino: u64) -> FileAttr {
    let kind = if meta.is_dir() {
        FileType::Directory
    } else {
        FileType::RegularFile
    };

    FileAttr {
        ino,
        size: meta.size,
        blocks: (meta.size + 511) / 512,
        atime: system_time(meta.atime),
        mtime: system_time(meta.mtime),
        ctime: system_time(meta.ctime),
        crtime: system_time(meta.ctime),
        kind,
        perm: (meta.mode & 0o7777) as u16,
        nlink: meta.nlink,
        uid: meta.uid,
        gid: meta.gid,
        rdev: 0,
        blksize: 4096,
        flags: 0,
    }
}

impl Filesystem for HttpFsDriver {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = name.to_string_lossy();
        debug!(parent = parent, name = %name, "lookup");

        let Some(parent_path) = self.table.path(parent).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        let path = PathTable::join(&parent_path, &name);
        match self.attr_of(&path) {
            Ok(meta) => {
                let ino = self.table.assign(&path);
                reply.entry(&TTL, &to_file_attr(&meta, ino), 0);
            }
            Err(code) => reply.error(code),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        debug!(ino = ino, "getattr");

        let Some(path) = self.table.path(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        match self.attr_of(&path) {
            Ok(meta) => reply.attr(&TTL, &to_file_attr(&meta, ino)),
            Err(code) => reply.error(code),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!(ino = ino, offset = offset, "readdir");

        let Some(path) = self.table.path(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        let entry = match self.list_dir(&path) {
            Ok(entry) => entry,
            Err(code) => {
                reply.error(code);
                return;
            }
        };

        let parent_ino = self.parent_ino(&path);
        let mut listing: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent_ino, FileType::Directory, "..".to_string()),
        ];

        for (name, meta) in &entry.entries {
            let child_path = PathTable::join(&path, name);
            let child_ino = self.table.assign(&child_path);
            let kind = if meta.is_dir() {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            listing.push((child_ino, kind, name.clone()));
        }

        for (i, (ino, kind, name)) in listing.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!(ino = ino, flags = flags, "open");
        // No existence check; a read on a bogus path fails at the range
        // GET instead.
        reply.opened(0, 0);
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!(ino = ino, fh = fh, offset = offset, size = size, "read");

        let Some(path) = self.table.path(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        match self.read_range(&path, offset.max(0) as u64, u64::from(size)) {
            Ok(data) => reply.data(&data),
            Err(code) => reply.error(code),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        reply.error(self.deny_mutation("write"));
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        reply.error(self.deny_mutation("mkdir"));
    }

    fn mknod(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        reply.error(self.deny_mutation("mknod"));
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(self.deny_mutation("unlink"));
    }

    fn rmdir(&mut self, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(self.deny_mutation("rmdir"));
    }

    fn symlink(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        reply.error(self.deny_mutation("symlink"));
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        reply.error(self.deny_mutation("rename"));
    }

    fn link(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _newparent: u64,
        _newname: &OsStr,
        reply: ReplyEntry,
    ) {
        reply.error(self.deny_mutation("link"));
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        // chmod, chown and truncate all arrive here.
        reply.error(self.deny_mutation("setattr"));
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        reply.error(self.deny_mutation("create"));
    }
}
