//! Tiered configuration.
//!
//! Configuration comes from up to four tiers, merged field by field:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/cognitask/config.yaml`
//! 3. **User** - `~/.cognitask/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `COGNITASK_CONFIG_PATH` - Explicit config file (replaces project/user tiers)
//! - `COGNITASK_DB_PATH` - Database path
//! - `COGNITASK_OWNER` - Default owner id
//! - `COGNITASK_USER_DIR` - User config dir (default: `~/.cognitask`)
//! - `COGNITASK_PROJECT_DIR` - Project config dir (default: `./cognitask`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
