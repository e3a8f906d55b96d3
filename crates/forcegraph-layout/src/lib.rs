//! Force-directed layout for forcegraph graphs.
//!
//! [`LayoutEngine`] turns edge topology and weights into node positions by
//! iterating a physical simulation. The engine holds only configuration; all
//! per-run data lives in a caller-held [`LayoutState`], so stepping can be
//! spread across render frames.
//!
//! # Modules
//!
//! - [`config`]: LayoutConfig and initial Placement
//! - [`engine`]: the simulation (initialize / step / run)
//! - [`state`]: LayoutState
//! - [`error`]: LayoutError

pub mod config;
pub mod engine;
pub mod error;
pub mod state;

pub use config::{LayoutConfig, Placement};
pub use engine::{LayoutEngine, RunReport, StepOutcome, FORCE_CEILING, POSITION_BOUND};
pub use error::LayoutError;
pub use state::LayoutState;
