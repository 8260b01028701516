//! File-backed adapters: asset resources and settings.

mod asset_loader;
mod settings;

pub use asset_loader::AssetResourceLoader;
pub use settings::{SettingsError, load_settings};
