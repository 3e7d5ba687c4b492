//! Settings-source loaders for confweave
//!
//! Loaders turn an on-disk settings source into the ordered collection of
//! [`confweave_domain::Configuration`] values the generator consumes. Only a
//! CSV loader ships today; the [`confweave_domain::SettingsLoader`] trait is
//! the seam for further formats.

pub mod csv_loader;

pub use csv_loader::CsvSettingsLoader;
