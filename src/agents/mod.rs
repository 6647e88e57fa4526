pub mod file_updater;
pub mod version_control;

pub use file_updater::{FileOutcome, FileUpdater};
pub use version_control::{VersionControlAgent, VersionSource, VersionToken};
