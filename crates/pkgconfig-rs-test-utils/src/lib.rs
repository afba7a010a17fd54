//! Test helpers shared across pkgconfig-rs crates.

pub mod package;

pub use package::PackageFixture;
