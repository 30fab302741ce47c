//! A neuro-evolution population engine.
//!
//! Orchestrates parallel fitness evaluation, adaptive speciation, species-aware
//! parent selection, and multi-step mutation into a single generation loop.
//! Genome structure, fitness semantics, and individual mutation operators are
//! supplied by the host; this crate provides the scheduling around them.

pub use plexus_core::*;
pub use plexus_engines::*;
pub use plexus_error::{PlexusError, PlexusResult};
pub use plexus_selectors::*;
