//! Top-level rendering coordinator.
//!
//! Rendering is a pure function of the view model and the theme. The result
//! is an ANSI-styled string the console prints as a whole.
//!
//! ```text
//! ListingState → compute_viewmodel → ListingViewModel → render → ANSI String
//! ```

use crate::app::ListingState;
use crate::ui::components;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::ListingViewModel;

/// Renders a listing screen `cols` columns wide.
#[must_use]
pub fn render(state: &ListingState, cols: usize) -> String {
    let viewmodel = state.compute_viewmodel();
    render_viewmodel(&viewmodel, state.theme(), cols)
}

/// Renders a pre-computed view model.
#[must_use]
pub fn render_viewmodel(vm: &ListingViewModel, theme: &Theme, cols: usize) -> String {
    let mut out = String::new();
    if let Err(e) = components::render_listing(&mut out, vm, theme, cols) {
        tracing::error!(error = %e, "failed to render listing");
    }
    out
}
