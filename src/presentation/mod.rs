pub mod progress;
#[cfg(feature = "cli")]
pub mod summary;
