//! Headless test harness
//!
//! In-process doubles for every external capability a page controller
//! touches, plus a scripted end-to-end walk of the standard funnel.

mod doubles;
pub mod simulator;

pub use doubles::{FaultyStore, HeadlessView, RecordingNavigator, StoreCall, ViewState};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, StepReport};
