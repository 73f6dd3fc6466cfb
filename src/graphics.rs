use crate::math::{apply_lighting, calculate_light_intensity, edge_function};

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Mixes `other` over `self` with the given opacity
    pub fn blend(self, other: Rgb, alpha: f64) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * alpha).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// A character drawn on top of the pixel layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub fg: Rgb,
}

/// Corner of a textured triangle: model-space position for depth and
/// lighting, projected canvas position for coverage.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: [f64; 3],
    pub screen_position: [f64; 2],
    pub normal: [f64; 3],
    pub uv: [f64; 2],
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        point[0] >= self.x
            && point[0] < self.x + self.width
            && point[1] >= self.y
            && point[1] < self.y + self.height
    }

    pub fn center(&self) -> [f64; 2] {
        [self.x + self.width / 2.0, self.y + self.height / 2.0]
    }
}

/// Pixel buffer backed by terminal cells.
///
/// Every cell holds two square pixels stacked vertically (drawn with an upper
/// half block), so the canvas is `cols` wide and `rows * 2` tall. A separate
/// text layer overrides whole cells.
pub struct FrameBuffer {
    cols: u16,
    rows: u16,
    pixels: Vec<Rgb>,
    z_buffer: Vec<f64>,
    text: Vec<Option<Glyph>>,
}

impl FrameBuffer {
    pub fn new(cols: u16, rows: u16) -> Self {
        let mut frame = FrameBuffer {
            cols: 0,
            rows: 0,
            pixels: Vec::new(),
            z_buffer: Vec::new(),
            text: Vec::new(),
        };
        frame.resize(cols, rows);
        frame
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let cells = cols as usize * rows as usize;
        self.pixels = vec![Rgb::BLACK; cells * 2];
        self.z_buffer = vec![f64::INFINITY; cells * 2];
        self.text = vec![None; cells];
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Canvas width in pixels
    pub fn width(&self) -> usize {
        self.cols as usize
    }

    /// Canvas height in pixels
    pub fn height(&self) -> usize {
        self.rows as usize * 2
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
        self.z_buffer.fill(f64::INFINITY);
        self.text.fill(None);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width() + x]
    }

    pub fn glyph(&self, col: u16, row: u16) -> Option<Glyph> {
        self.text[row as usize * self.cols as usize + col as usize]
    }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: Rgb) {
        self.blend_pixel(x, y, color, 1.0);
    }

    pub fn blend_pixel(&mut self, x: isize, y: isize, color: Rgb, alpha: f64) {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return;
        }
        let offset = y as usize * self.width() + x as usize;
        self.pixels[offset] = self.pixels[offset].blend(color, alpha);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let x0 = rect.x.round() as isize;
        let y0 = rect.y.round() as isize;
        let x1 = (rect.x + rect.width).round() as isize;
        let y1 = (rect.y + rect.height).round() as isize;
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Fills a disc sampled at pixel centers
    pub fn fill_circle(&mut self, center: [f64; 2], radius: f64, color: Rgb, alpha: f64) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let min_x = (center[0] - radius).floor() as isize;
        let max_x = (center[0] + radius).ceil() as isize;
        let min_y = (center[1] - radius).floor() as isize;
        let max_y = (center[1] + radius).ceil() as isize;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - center[0];
                let dy = y as f64 + 0.5 - center[1];
                if dx * dx + dy * dy <= radius * radius {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    /// Like [`fill_circle`](Self::fill_circle), with the color picked per pixel
    /// from the offset to `center` measured in radii.
    pub fn shade_circle(
        &mut self,
        center: [f64; 2],
        radius: f64,
        alpha: f64,
        shade: &dyn Fn([f64; 2]) -> Rgb,
    ) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let min_x = (center[0] - radius).floor() as isize;
        let max_x = (center[0] + radius).ceil() as isize;
        let min_y = (center[1] - radius).floor() as isize;
        let max_y = (center[1] + radius).ceil() as isize;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let offset = [
                    (x as f64 + 0.5 - center[0]) / radius,
                    (y as f64 + 0.5 - center[1]) / radius,
                ];
                if offset[0] * offset[0] + offset[1] * offset[1] <= 1.0 {
                    self.blend_pixel(x, y, shade(offset), alpha);
                }
            }
        }
    }

    /// Darkens the whole canvas and drops any text underneath
    pub fn dim(&mut self, color: Rgb, alpha: f64) {
        for pixel in self.pixels.iter_mut() {
            *pixel = pixel.blend(color, alpha);
        }
        self.text.fill(None);
    }

    pub fn put_text(&mut self, col: u16, row: u16, text: &str, fg: Rgb) {
        if row >= self.rows {
            return;
        }
        for (offset, ch) in text.chars().enumerate() {
            let col = col as usize + offset;
            if col >= self.cols as usize {
                break;
            }
            self.text[row as usize * self.cols as usize + col] = Some(Glyph { ch, fg });
        }
    }

    /// Writes `text` horizontally centered on `row` and returns its first column
    pub fn put_text_centered(&mut self, row: u16, text: &str, fg: Rgb) -> u16 {
        let len = text.chars().count() as u16;
        let col = self.cols.saturating_sub(len) / 2;
        self.put_text(col, row, text, fg);
        col
    }

    /// Draws a triangle with per-pixel lighting.
    ///
    /// `shade` receives interpolated texture coordinates and returns the base
    /// color before lighting. Winding order does not matter.
    pub fn draw_triangle(
        &mut self,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
        light_pos: &[f64; 3],
        shade: &dyn Fn([f64; 2]) -> Rgb,
    ) {
        let width = self.width();
        let height = self.height();
        if width == 0 || height == 0 {
            return;
        }

        // Compute bounding box of the triangle
        let min_x = v0.screen_position[0]
            .min(v1.screen_position[0])
            .min(v2.screen_position[0])
            .floor()
            .max(0.0) as usize;
        let max_x = v0.screen_position[0]
            .max(v1.screen_position[0])
            .max(v2.screen_position[0])
            .ceil()
            .min(width as f64 - 1.0)
            .max(0.0) as usize;
        let min_y = v0.screen_position[1]
            .min(v1.screen_position[1])
            .min(v2.screen_position[1])
            .floor()
            .max(0.0) as usize;
        let max_y = v0.screen_position[1]
            .max(v1.screen_position[1])
            .max(v2.screen_position[1])
            .ceil()
            .min(height as f64 - 1.0)
            .max(0.0) as usize;

        // Precompute area of the triangle
        let area = edge_function(&v0.screen_position, &v1.screen_position, &v2.screen_position);
        if area.abs() < f64::EPSILON {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = [x as f64 + 0.5, y as f64 + 0.5];

                // Normalized barycentric coordinates are all positive inside,
                // whichever way the triangle winds.
                let w0 = edge_function(&v1.screen_position, &v2.screen_position, &p) / area;
                let w1 = edge_function(&v2.screen_position, &v0.screen_position, &p) / area;
                let w2 = edge_function(&v0.screen_position, &v1.screen_position, &p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let interpolate = |a: f64, b: f64, c: f64| a * w0 + b * w1 + c * w2;
                let px3d = interpolate(v0.position[0], v1.position[0], v2.position[0]);
                let py3d = interpolate(v0.position[1], v1.position[1], v2.position[1]);
                let pz3d = interpolate(v0.position[2], v1.position[2], v2.position[2]);

                // Depth test; +z points at the viewer
                let offset = y * width + x;
                let depth = -pz3d;
                if depth >= self.z_buffer[offset] {
                    continue;
                }
                self.z_buffer[offset] = depth;

                let nx = interpolate(v0.normal[0], v1.normal[0], v2.normal[0]);
                let ny = interpolate(v0.normal[1], v1.normal[1], v2.normal[1]);
                let nz = interpolate(v0.normal[2], v1.normal[2], v2.normal[2]);
                let length = (nx * nx + ny * ny + nz * nz).sqrt();
                let interpolated_normal = [nx / length, ny / length, nz / length];

                let uv = [
                    interpolate(v0.uv[0], v1.uv[0], v2.uv[0]),
                    interpolate(v0.uv[1], v1.uv[1], v2.uv[1]),
                ];

                let light_intensity = calculate_light_intensity(
                    &interpolated_normal,
                    &[px3d, py3d, pz3d],
                    light_pos,
                );
                self.pixels[offset] = apply_lighting(shade(uv), light_intensity);
            }
        }
    }

    /// Draws a line between two points using Bresenham's algorithm
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) {
        let (mut x0, mut y0, x1, y1) = (
            x0.round() as isize,
            y0.round() as isize,
            x1.round() as isize,
            y1.round() as isize,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy

        loop {
            self.set_pixel(x0, y0, color);

            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}
