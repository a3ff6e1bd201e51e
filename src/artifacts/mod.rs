//! Per-epoch outputs written next to the loss history: the generated
//! sample grid and the loss curve.

pub mod grid;
pub mod plot;

pub use grid::{render_grid, save_sample_grid};
pub use plot::{render_loss_plot, save_loss_plot};
