#![warn(missing_docs)]

//! Generation pipeline for confweave
//!
//! Ties the pieces together: loads configurations from a settings source,
//! renders the template once per configuration, applies post-processing, and
//! routes each rendered document to the change-aware output writer. The
//! orchestrator aggregates everything into a single
//! [`confweave_domain::GenerationResult`]; a failure in one configuration
//! never prevents the others from being attempted.

pub mod generator;
pub mod output_writer;

pub use generator::{Generator, GENERATOR_SOURCE};
pub use output_writer::{OutputWriteError, OutputWriter, WriteOutputResult, WRITER_SOURCE};
