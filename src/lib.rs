pub mod archive;
pub mod collect;
pub mod config;
pub mod environment;
pub mod fetch;
pub mod license;
pub mod output;
pub mod registry;

// Re-export main types for easy access
pub use collect::{collect, CollectOptions, CollectionReport, Outcome, PackageResolution};
pub use environment::InstalledPackage;
pub use registry::{Registry, RegistryEntry};
