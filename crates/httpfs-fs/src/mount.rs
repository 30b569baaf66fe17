//! Mount helper.

use std::path::Path;

use fuser::MountOption;
use tracing::info;

use crate::server::{FsConfig, HttpFs};
use crate::vfs::HttpFsDriver;
use crate::FsError;

/// Mount options forwarded to the kernel bridge.
#[derive(Debug, Clone, Default)]
pub struct MountConfig {
    /// Allow other users to access the mount
    pub allow_other: bool,
    /// Unmount automatically when the process exits
    pub auto_unmount: bool,
}

/// Mounts the remote tree at `mount_point` and blocks until unmounted.
///
/// The mount is always read-only.
pub fn mount(config: FsConfig, mount_point: &Path, options: MountConfig) -> Result<(), FsError> {
    let driver = HttpFsDriver::new(HttpFs::new(config)?);

    let mut mount_options = vec![
        MountOption::RO,
        MountOption::FSName("httpfs".to_string()),
    ];
    if options.allow_other {
        mount_options.push(MountOption::AllowOther);
    }
    if options.auto_unmount {
        mount_options.push(MountOption::AutoUnmount);
    }

    info!(mount_point = %mount_point.display(), "Mounting");
    fuser::mount2(driver, mount_point, &mount_options)
        .map_err(|e| FsError::Mount(format!("FUSE mount failed: {}", e)))
}
