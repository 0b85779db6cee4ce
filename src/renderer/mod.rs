pub mod card;
pub mod header;

use crate::canvas::{Canvas, FontState};
use crate::config::WorldClockConfig;
use crate::layout::Layout;
use crate::presenter::Card;
use crate::view::{ViewOption, ViewSelection};
use crate::zones::ZoneDescriptor;

/// Everything one frame needs, borrowed from the running widget.
pub struct FrameState<'a> {
    pub config: &'a WorldClockConfig,
    pub layout: &'a Layout,
    pub subtitle: &'a str,
    pub options: &'a [ViewOption],
    pub selection: &'a ViewSelection,
    pub cards: Vec<(&'a ZoneDescriptor, Card)>,
}

pub fn render(canvas: &mut Canvas, state: &FrameState, font: &FontState) {
    canvas.clear(state.config.theme.bg_color);

    header::render(canvas, state, font);

    for ((zone, card), rect) in state.cards.iter().zip(&state.layout.cards) {
        card::render(canvas, *rect, state.layout.scale, zone, card, &state.config.theme, font);
    }

    header::render_footer(canvas, state, font);

    canvas.apply_opacity(state.config.window.opacity);
}
