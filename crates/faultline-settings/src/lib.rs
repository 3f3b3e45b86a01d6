//! # faultline-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`FaultlineSettings::default()`]
//! 2. **User file**: `~/.faultline/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `FAULTLINE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    load_settings_with_report, settings_path, IgnoredOverride, LoadedSettings,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = FaultlineSettings::default();
        let _path = settings_path();
        assert_eq!(MAX_BATCH_SIZE, 10);
    }
}
