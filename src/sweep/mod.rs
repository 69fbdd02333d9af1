//! Experiment sweeps
//!
//! Samples an embedded problem over the Cartesian product of chain strength
//! scales and annealing times, in batches. Raw batches are cached on disk so
//! that an interrupted sweep resumes where it stopped; unembedded results are
//! written as one CSV per parameter point.
//!
//! Output tree:
//!
//! ```text
//! <output_dir>/
//!   raw_outputs/output_raw_part_<batch>_at_<at>_css_<css>.json
//!   outputs/output_at_<at>_css_<css>.csv
//! ```

pub mod cache;
pub mod config;
pub mod runner;

pub use cache::*;
pub use config::*;
pub use runner::*;
