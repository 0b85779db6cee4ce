use crate::canvas::{Canvas, FontState};
use crate::config::ThemeConfig;
use crate::layout::Rect;
use crate::presenter::Card;
use crate::renderer::header::button_label;
use crate::time_utils::{RelativeDay, TimeSnapshot};
use crate::zones::ZoneDescriptor;

pub fn render(
    canvas: &mut Canvas,
    rect: Rect,
    s: f32,
    zone: &ZoneDescriptor,
    card: &Card,
    theme: &ThemeConfig,
    font: &FontState,
) {
    let snap = &card.snapshot;
    let cx = rect.x + rect.w / 2.0;
    let inner_w = rect.w - s * 0.8;
    let muted = [theme.fg_color[0], theme.fg_color[1], theme.fg_color[2], 0xAA];

    canvas.fill_rounded_rect(rect.x, rect.y, rect.w, rect.h, s * 0.5, theme.card_color);

    // Header: icon + city, region below
    let city = button_label(&zone.icon, &zone.city, font);
    let city_size = font.fit_size(&city, s * 0.6, inner_w);
    font.draw_text_centered(canvas, &city, cx, rect.y + s * 0.4, city_size, theme.fg_color);
    let region_size = font.fit_size(&zone.region, s * 0.4, inner_w);
    font.draw_text_centered(canvas, &zone.region, cx, rect.y + s * 1.15, region_size, muted);

    // HH:MM large, seconds and meridiem smaller in the accent colour
    let main = format!("{}:{}", snap.hours, snap.minutes);
    let tail = format!(" {} {}", snap.seconds, snap.meridiem);
    let mut main_size = s * 1.2;
    let mut tail_size = s * 0.55;
    let (mw, _) = font.measure_text(&main, main_size);
    let (tw, _) = font.measure_text(&tail, tail_size);
    if mw + tw > inner_w && mw + tw > 0.0 {
        let k = inner_w / (mw + tw);
        main_size *= k;
        tail_size *= k;
    }
    let (mw, _) = font.measure_text(&main, main_size);
    let (tw, _) = font.measure_text(&tail, tail_size);
    let time_x = cx - (mw + tw) / 2.0;
    let time_y = rect.y + s * 1.85;
    font.draw_text(canvas, &main, time_x, time_y, main_size, theme.fg_color);
    font.draw_text(canvas, &tail, time_x + mw, time_y + main_size - tail_size, tail_size, theme.accent_color);

    let date_size = font.fit_size(&snap.date_label, s * 0.42, inner_w);
    font.draw_text_centered(canvas, &snap.date_label, cx, rect.y + s * 3.35, date_size, muted);

    if let Some(day) = snap.relative_day {
        render_badge(canvas, cx, rect.y + s * 4.2, s, day, theme, font);
    }
}

fn render_badge(canvas: &mut Canvas, cx: f32, y: f32, s: f32, day: RelativeDay, theme: &ThemeConfig, font: &FontState) {
    let color = badge_color(day, theme);
    let text = day.badge();
    let text_size = s * 0.38;
    let h = s * 0.8;
    let dot_r = s * 0.12;
    let (tw, _) = font.measure_text(text, text_size);
    let w = tw + dot_r * 2.0 + s * 1.0;
    let x = cx - w / 2.0;

    let fill = [color[0], color[1], color[2], 0x33];
    canvas.fill_rounded_rect(x, y, w, h, h / 2.0, fill);
    canvas.fill_circle(x + s * 0.4 + dot_r, y + h / 2.0, dot_r, color);
    font.draw_text(canvas, text, x + s * 0.6 + dot_r * 2.0, y + (h - text_size) / 2.0, text_size, color);
}

pub fn badge_color(day: RelativeDay, theme: &ThemeConfig) -> [u8; 4] {
    match day {
        RelativeDay::Today => theme.today_color,
        RelativeDay::Tomorrow => theme.tomorrow_color,
        RelativeDay::Yesterday => theme.yesterday_color,
    }
}

/// Plain-text rendering of a card, used by `worldclock print`.
pub fn text_lines(zone: &ZoneDescriptor, snap: &TimeSnapshot) -> Vec<String> {
    let header = if zone.icon.is_empty() {
        zone.city.clone()
    } else {
        format!("{} {}", zone.icon, zone.city)
    };
    let mut lines = vec![header];
    if !zone.region.is_empty() {
        lines.push(zone.region.clone());
    }
    lines.push(snap.time_string());
    lines.push(snap.date_label.clone());
    if let Some(day) = snap.relative_day {
        lines.push(format!("\u{25CF} {}", day.badge()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::compute_snapshot;
    use crate::zones::ZoneRegistry;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn text_card_shows_badge_only_when_labelled() {
        let registry = ZoneRegistry::builtin();
        let reno = registry.lookup("reno").unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();

        let today = compute_snapshot(&reno.tz, instant, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(
            text_lines(reno, &today),
            vec![
                "\u{1F3B0} Reno".to_string(),
                "Nevada, USA".to_string(),
                "03:00:00 AM".to_string(),
                "Sunday, March 10, 2024".to_string(),
                "\u{25CF} Same day as you".to_string(),
            ]
        );

        let far = compute_snapshot(&reno.tz, instant, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        let lines = text_lines(reno, &far);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "03:00:00 AM");
    }

    #[test]
    fn badge_colours_follow_theme() {
        let theme = ThemeConfig::default();
        assert_eq!(badge_color(RelativeDay::Today, &theme), theme.today_color);
        assert_eq!(badge_color(RelativeDay::Tomorrow, &theme), theme.tomorrow_color);
        assert_eq!(badge_color(RelativeDay::Yesterday, &theme), theme.yesterday_color);
    }
}
