pub mod features;
pub mod registry;
pub mod preferences;
pub mod navigation;
