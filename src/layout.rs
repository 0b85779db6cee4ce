//! Surface geometry, derived only from the base font size so the window size
//! and the clickable selector areas are known before anything is drawn.

use crate::view::{ViewOption, ViewSelection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// A line of text: top edge and pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLine {
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSlot {
    pub selection: ViewSelection,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub title: Option<TextLine>,
    pub subtitle: Option<TextLine>,
    pub buttons: Vec<ButtonSlot>,
    pub cards: Vec<Rect>,
    pub footer: Option<TextLine>,
}

impl Layout {
    pub fn compute(font_size: f32, compact: bool, options: &[ViewOption], card_count: usize) -> Self {
        let s = font_size.max(10.0);
        let pad = s * 0.6;
        let section_gap = s * 0.5;

        let button_w = s * 4.0;
        let button_h = s * 0.9;
        let button_gap = s * 0.3;
        let card_w = s * 8.0;
        let card_h = s * 5.6;
        let card_gap = s * 0.5;

        let buttons_row_w = row_width(options.len(), button_w, button_gap);
        let cards_row_w = row_width(card_count, card_w, card_gap);
        let total_w = buttons_row_w.max(cards_row_w) + pad * 2.0;

        let mut y = pad;
        let (title, subtitle) = if compact {
            (None, None)
        } else {
            let title = TextLine { y, size: s * 0.8 };
            y += title.size + s * 0.2;
            let subtitle = TextLine { y, size: s * 0.45 };
            y += subtitle.size + section_gap;
            (Some(title), Some(subtitle))
        };

        let mut x = (total_w - buttons_row_w) / 2.0;
        let mut buttons = Vec::with_capacity(options.len());
        for option in options {
            buttons.push(ButtonSlot {
                selection: option.selection.clone(),
                rect: Rect { x, y, w: button_w, h: button_h },
            });
            x += button_w + button_gap;
        }
        y += button_h + section_gap;

        let mut x = (total_w - cards_row_w) / 2.0;
        let mut cards = Vec::with_capacity(card_count);
        for _ in 0..card_count {
            cards.push(Rect { x, y, w: card_w, h: card_h });
            x += card_w + card_gap;
        }
        y += card_h;

        let footer = if compact {
            None
        } else {
            y += section_gap;
            let footer = TextLine { y, size: s * 0.4 };
            y += footer.size;
            Some(footer)
        };
        y += pad;

        Self {
            width: total_w.ceil() as u32,
            height: y.ceil() as u32,
            scale: s,
            title,
            subtitle,
            buttons,
            cards,
            footer,
        }
    }

    /// The selector button under a pointer position, if any.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&ViewSelection> {
        self.buttons
            .iter()
            .find(|b| b.rect.contains(x, y))
            .map(|b| &b.selection)
    }
}

fn row_width(count: usize, item_w: f32, gap: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    count as f32 * item_w + (count - 1) as f32 * gap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<ViewOption> {
        ["brisbane", "reno"]
            .iter()
            .map(|id| ViewOption {
                selection: ViewSelection::Zone(id.to_string()),
                icon: String::new(),
                label: id.to_string(),
            })
            .chain(std::iter::once(ViewOption {
                selection: ViewSelection::All,
                icon: String::new(),
                label: "Both".into(),
            }))
            .collect()
    }

    #[test]
    fn one_button_per_option_and_one_card_per_zone() {
        let layout = Layout::compute(20.0, false, &options(), 2);
        assert_eq!(layout.buttons.len(), 3);
        assert_eq!(layout.cards.len(), 2);
        // Two cards (160 + 10 + 160) plus padding on each side.
        let pad = 20.0f32 * 0.6;
        assert_eq!(layout.width, (330.0 + pad * 2.0).ceil() as u32);
        assert!(layout.title.is_some() && layout.footer.is_some());
    }

    #[test]
    fn clicks_map_to_selector_buttons() {
        let layout = Layout::compute(20.0, false, &options(), 2);
        let reno = layout.buttons[1].rect;
        let hit = layout.hit_test(reno.x + reno.w / 2.0, reno.y + reno.h / 2.0);
        assert_eq!(hit, Some(&ViewSelection::Zone("reno".into())));

        let all = layout.buttons[2].rect;
        assert_eq!(layout.hit_test(all.x + 1.0, all.y + 1.0), Some(&ViewSelection::All));

        let card = layout.cards[0];
        assert_eq!(layout.hit_test(card.x + 5.0, card.y + 5.0), None);
        assert_eq!(layout.hit_test(-1.0, -1.0), None);
    }

    #[test]
    fn single_zone_view_is_narrower() {
        let both = Layout::compute(20.0, false, &options(), 2);
        let single = Layout::compute(20.0, false, &options(), 1);
        assert!(single.width < both.width);
        assert_eq!(single.height, both.height);
        // Buttons stay inside the window even when they are the widest row.
        let last = single.buttons.last().unwrap().rect;
        assert!(last.x + last.w <= single.width as f32);
    }

    #[test]
    fn compact_drops_header_and_footer() {
        let full = Layout::compute(20.0, false, &options(), 2);
        let compact = Layout::compute(20.0, true, &options(), 2);
        assert!(compact.title.is_none() && compact.subtitle.is_none() && compact.footer.is_none());
        assert!(compact.height < full.height);
        assert_eq!(compact.width, full.width);
    }
}
