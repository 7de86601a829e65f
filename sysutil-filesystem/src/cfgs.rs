//! [`Config`]s read by the filesystem layer.

use sysutil_cfg::{Config, ConfigSet, ConfigSetBuilder};
use sysutil_ore::cast::CastFrom;

pub static COPY_BLOCK_SIZE: Config<u64> = Config::new(
    "copy_block_size",
    "Number of bytes read and written per block when copying a file, at most 1 MiB.",
    4096,
);

pub static DIRENT_BUFFER_SIZE: Config<u64> = Config::new(
    "dirent_buffer_size",
    "Size of the buffer directory entries are read into, between 4 KiB and 1 MiB.",
    32 * 1024,
);

/// Largest block the copy engine allocates.
pub const MAX_COPY_BLOCK_SIZE: usize = 1024 * 1024;

/// Smallest buffer handed to `getdents64`, large enough for any single record.
pub const MIN_DIRENT_BUFFER_SIZE: usize = 4096;
/// Largest buffer the directory walker allocates.
pub const MAX_DIRENT_BUFFER_SIZE: usize = 1024 * 1024;

pub fn register_configs(builder: &mut ConfigSetBuilder) {
    builder
        .register(&COPY_BLOCK_SIZE)
        .register(&DIRENT_BUFFER_SIZE);
}

/// Block size for the copy engine, clamped to `1..=`[`MAX_COPY_BLOCK_SIZE`].
pub fn copy_block_size(configs: &ConfigSet) -> usize {
    let size = usize::cast_from(COPY_BLOCK_SIZE.read(configs));
    size.clamp(1, MAX_COPY_BLOCK_SIZE)
}

/// Buffer size for the directory walker, clamped to
/// [`MIN_DIRENT_BUFFER_SIZE`]`..=`[`MAX_DIRENT_BUFFER_SIZE`].
pub fn dirent_buffer_size(configs: &ConfigSet) -> usize {
    let size = usize::cast_from(DIRENT_BUFFER_SIZE.read(configs));
    size.clamp(MIN_DIRENT_BUFFER_SIZE, MAX_DIRENT_BUFFER_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> ConfigSet {
        let mut builder = ConfigSet::builder();
        register_configs(&mut builder);
        builder.build()
    }

    #[test]
    fn test_defaults() {
        let configs = configs();
        assert_eq!(copy_block_size(&configs), 4096);
        assert_eq!(dirent_buffer_size(&configs), 32 * 1024);
    }

    #[test]
    fn test_sizes_are_clamped() {
        let configs = configs();

        configs.update(&COPY_BLOCK_SIZE, 0);
        configs.update(&DIRENT_BUFFER_SIZE, 0);
        assert_eq!(copy_block_size(&configs), 1);
        assert_eq!(dirent_buffer_size(&configs), MIN_DIRENT_BUFFER_SIZE);

        configs.update(&COPY_BLOCK_SIZE, u64::MAX);
        configs.update(&DIRENT_BUFFER_SIZE, u64::MAX);
        assert_eq!(copy_block_size(&configs), MAX_COPY_BLOCK_SIZE);
        assert_eq!(dirent_buffer_size(&configs), MAX_DIRENT_BUFFER_SIZE);
    }
}
