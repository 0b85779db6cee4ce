use crate::canvas::{Canvas, FontState};
use crate::renderer::FrameState;

/// Title, subtitle and the row of view selector buttons.
pub fn render(canvas: &mut Canvas, state: &FrameState, font: &FontState) {
    let w = canvas.width() as f32;
    let layout = state.layout;
    let theme = &state.config.theme;
    let muted = [theme.fg_color[0], theme.fg_color[1], theme.fg_color[2], 0xAA];

    if let Some(title) = layout.title {
        let size = font.fit_size(&state.config.clock.title, title.size, w * 0.9);
        font.draw_text_centered(canvas, &state.config.clock.title, w / 2.0, title.y, size, theme.fg_color);
    }
    if let Some(subtitle) = layout.subtitle {
        let size = font.fit_size(state.subtitle, subtitle.size, w * 0.9);
        font.draw_text_centered(canvas, state.subtitle, w / 2.0, subtitle.y, size, muted);
    }

    for (slot, option) in layout.buttons.iter().zip(state.options) {
        let r = slot.rect;
        let active = &slot.selection == state.selection;
        let (fill, text_color) = if active {
            (theme.accent_color, theme.bg_color)
        } else {
            (theme.button_color, theme.fg_color)
        };
        let text_color = [text_color[0], text_color[1], text_color[2], 0xFF];
        canvas.fill_rounded_rect(r.x, r.y, r.w, r.h, r.h / 2.0, fill);

        let label = button_label(&option.icon, &option.label, font);
        let size = font.fit_size(&label, r.h * 0.5, r.w - r.h * 0.6);
        font.draw_text_centered(canvas, &label, r.x + r.w / 2.0, r.y + (r.h - size) / 2.0, size, text_color);
    }
}

pub fn render_footer(canvas: &mut Canvas, state: &FrameState, font: &FontState) {
    let Some(footer) = state.layout.footer else { return };
    let w = canvas.width() as f32;
    let fg = state.config.theme.fg_color;
    let color = [fg[0], fg[1], fg[2], 0x80];
    font.draw_text_centered(canvas, &state.config.clock.footer, w / 2.0, footer.y, footer.size, color);
}

/// Icon and label, dropping the icon when the font cannot draw it.
pub fn button_label(icon: &str, label: &str, font: &FontState) -> String {
    if !icon.is_empty() && icon.chars().all(|c| font.has_glyph(c)) {
        format!("{} {}", icon, label)
    } else {
        label.to_string()
    }
}
