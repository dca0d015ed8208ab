//! Tree shape parameters and the totals they imply
//!
//! The generated tree is a complete `dirs_per_level`-ary tree of depth
//! `num_levels`. Every directory at level `L` receives
//! [`TreeShape::files_for_level`] files, so the expected totals below follow
//! the generator's per-directory rule exactly.

use crate::content::BYTES_PER_KB;
use crate::error::ConfigError;

/// Largest accepted fan-out per directory
pub const MAX_DIRS_PER_LEVEL: usize = 1_000_000;

/// Largest accepted file size (1 GiB); each file is built in memory
pub const MAX_FILE_SIZE_KB: usize = 1024 * 1024;

/// Shape of the tree to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeShape {
    /// Depth of the tree (level 1 = children of the root)
    pub num_levels: usize,

    /// Children created under every directory
    pub dirs_per_level: usize,

    /// Files per directory on every level except the target level
    pub files_per_dir: usize,

    /// Size of each file in KiB
    pub file_size_kb: usize,

    /// Level whose file count is overridden
    pub target_level: usize,

    /// Files per directory on the target level
    pub files_at_target_level: usize,
}

impl TreeShape {
    /// Check that the target level lies inside the tree and sizes are bounded
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dirs_per_level > MAX_DIRS_PER_LEVEL {
            return Err(ConfigError::InvalidDirsPerLevel {
                count: self.dirs_per_level,
                max: MAX_DIRS_PER_LEVEL,
            });
        }
        if self.file_size_kb > MAX_FILE_SIZE_KB {
            return Err(ConfigError::InvalidFileSize {
                size_kb: self.file_size_kb,
                max: MAX_FILE_SIZE_KB,
            });
        }
        if self.target_level < 1 || self.target_level > self.num_levels {
            return Err(ConfigError::InvalidTargetLevel {
                target_level: self.target_level,
                num_levels: self.num_levels,
            });
        }
        Ok(())
    }

    /// Files written into each directory created at `level`
    pub fn files_for_level(&self, level: usize) -> usize {
        if level == self.target_level {
            self.files_at_target_level
        } else {
            self.files_per_dir
        }
    }

    /// Directories that exist at `level` (`dirs_per_level ^ level`)
    pub fn dirs_at_level(&self, level: usize) -> u64 {
        (0..level).fold(1u64, |acc, _| acc.saturating_mul(self.dirs_per_level as u64))
    }

    /// Total directories a fault-free run creates
    pub fn expected_directories(&self) -> u64 {
        (1..=self.num_levels)
            .map(|level| self.dirs_at_level(level))
            .fold(0u64, u64::saturating_add)
    }

    /// Total files a fault-free run creates
    pub fn expected_files(&self) -> u64 {
        (1..=self.num_levels)
            .map(|level| {
                self.dirs_at_level(level)
                    .saturating_mul(self.files_for_level(level) as u64)
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Total content bytes a fault-free run writes
    pub fn expected_bytes(&self) -> u64 {
        self.expected_files()
            .saturating_mul(self.file_size_kb as u64)
            .saturating_mul(BYTES_PER_KB as u64)
    }
}

/// Name of the `index`-th directory created at `level`
pub fn dir_name(level: usize, index: usize) -> String {
    format!("dir_{}_{}", level, index)
}

/// Name of the `index`-th file inside a directory
pub fn file_name(index: usize) -> String {
    format!("file_{}", index)
}
