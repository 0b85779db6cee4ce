use anyhow::Result;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

pub struct Canvas {
    pub pixmap: Pixmap,
}

pub struct FontState {
    font: fontdue::Font,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow::anyhow!("Failed to create {}x{} pixmap", width, height))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixmap.fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    /// Filled rectangle with quarter-circle corners of radius `r`.
    pub fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32, color: [u8; 4]) {
        let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
        let k = 0.5522847498 * r; // cubic bezier circle constant
        let mut pb = PathBuilder::new();
        pb.move_to(x + r, y);
        pb.line_to(x + w - r, y);
        pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
        pb.line_to(x + w, y + h - r);
        pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
        pb.line_to(x + r, y + h);
        pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
        pb.line_to(x, y + r);
        pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            paint.anti_alias = true;
            self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: [u8; 4]) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
            paint.anti_alias = true;
            self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Scale every pixel's alpha (and premultiplied colour) by `opacity`.
    pub fn apply_opacity(&mut self, opacity: f32) {
        if opacity >= 1.0 {
            return;
        }
        let scale = (opacity.max(0.0) * 255.0) as u32;
        for px in self.pixmap.data_mut().chunks_exact_mut(4) {
            for c in px.iter_mut() {
                *c = ((*c as u32 * scale) / 255) as u8;
            }
        }
    }

    /// Convert RGBA pixels to BGRA (ARGB8888 in little-endian) for wl_shm
    pub fn pixels_argb8888(&self) -> Vec<u8> {
        let data = self.pixmap.data();
        let mut out = vec![0u8; data.len()];
        for (src, dst) in data.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }
        out
    }
}

impl FontState {
    pub fn new(font_name: &str) -> Result<Self> {
        // Try loading as a file path first
        if let Ok(data) = std::fs::read(font_name) {
            if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                return Ok(Self { font });
            }
        }

        let search_paths = [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/nix/var/nix/profiles/system/sw/share/X11/fonts",
        ];

        // Prefer a font whose file name mentions the requested family
        let wanted = font_name.to_lowercase();
        for base in &search_paths {
            if let Some(font) = walk_for_font(std::path::Path::new(base), &|name| name.contains(&wanted)) {
                return Ok(Self { font });
            }
        }

        let fallback_fonts = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ];

        for path in &fallback_fonts {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                    log::info!("Using fallback font: {}", path);
                    return Ok(Self { font });
                }
            }
        }

        for base in &["/usr/share/fonts", "/usr/local/share/fonts"] {
            if let Some(font) = walk_for_font(std::path::Path::new(base), &|_| true) {
                return Ok(Self { font });
            }
        }

        anyhow::bail!("No usable font found for '{}'. Install a TTF font or set clock.font to a font path", font_name)
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch) != 0
    }

    pub fn measure_text(&self, text: &str, size: f32) -> (f32, f32) {
        let mut width = 0.0f32;
        let mut max_height = 0.0f32;
        for ch in text.chars() {
            let metrics = self.font.metrics(ch, size);
            width += metrics.advance_width;
            let h = metrics.height as f32;
            if h > max_height { max_height = h; }
        }
        (width, max_height)
    }

    /// Largest size up to `size` at which `text` fits in `max_width`.
    pub fn fit_size(&self, text: &str, size: f32, max_width: f32) -> f32 {
        let (tw, _) = self.measure_text(text, size);
        if tw <= max_width || tw <= 0.0 {
            return size;
        }
        (size * max_width / tw).max(6.0)
    }

    pub fn draw_text(&self, canvas: &mut Canvas, text: &str, x: f32, y: f32, size: f32, color: [u8; 4]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            if !bitmap.is_empty() && metrics.width > 0 && metrics.height > 0 {
                let gx = cursor_x as i32 + metrics.xmin;
                let gy = y as i32 + size as i32 - metrics.height as i32 - metrics.ymin;
                for row in 0..metrics.height {
                    for col in 0..metrics.width {
                        let coverage = bitmap[row * metrics.width + col];
                        if coverage > 0 {
                            let px = gx + col as i32;
                            let py = gy + row as i32;
                            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                                let alpha = (coverage as u32 * color[3] as u32) / 255;
                                if alpha > 0 {
                                    blend_pixel(&mut canvas.pixmap, px as u32, py as u32, color, alpha as u8);
                                }
                            }
                        }
                    }
                }
            }
            cursor_x += metrics.advance_width;
        }
    }

    /// Draw `text` horizontally centred on `cx`.
    pub fn draw_text_centered(&self, canvas: &mut Canvas, text: &str, cx: f32, y: f32, size: f32, color: [u8; 4]) {
        let (tw, _) = self.measure_text(text, size);
        self.draw_text(canvas, text, cx - tw / 2.0, y, size, color);
    }
}

fn walk_for_font(dir: &std::path::Path, accept: &dyn Fn(&str) -> bool) -> Option<fontdue::Font> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(f) = walk_for_font(&path, accept) {
                return Some(f);
            }
        } else if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
            if (ext == "ttf" || ext == "otf") && accept(&name) {
                if let Ok(data) = std::fs::read(&path) {
                    if let Ok(font) = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                        log::info!("Found font: {}", path.display());
                        return Some(font);
                    }
                }
            }
        }
    }
    None
}

fn blend_pixel(pixmap: &mut Pixmap, x: u32, y: u32, color: [u8; 4], alpha: u8) {
    let w = pixmap.width();
    let idx = ((y * w + x) * 4) as usize;
    let data = pixmap.data_mut();
    if idx + 3 >= data.len() { return; }

    let a = alpha as u32;
    let inv_a = 255 - a;
    data[idx]     = ((color[0] as u32 * a + data[idx] as u32 * inv_a) / 255) as u8;
    data[idx + 1] = ((color[1] as u32 * a + data[idx + 1] as u32 * inv_a) / 255) as u8;
    data[idx + 2] = ((color[2] as u32 * a + data[idx + 2] as u32 * inv_a) / 255) as u8;
    data[idx + 3] = (a + data[idx + 3] as u32 * inv_a / 255).min(255) as u8;
}
