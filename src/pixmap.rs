//! Off-screen canvas: a premultiplied RGBA8 buffer with porter-duff `over`
//! compositing and a single affine paint core used by every node painter.
//!
//! All integer blend math runs in premultiplied space; straight-alpha colors
//! are premultiplied at the boundary.

use kurbo::{Affine, Point};

use crate::{
    error::{ScrimError, ScrimResult},
    geom::{Rect, Rgba8},
};

pub type PremulRgba8 = [u8; 4];

#[derive(Clone, Debug)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// What the affine paint core reads per covered pixel.
pub enum PaintSource<'a> {
    /// Constant premultiplied color.
    Solid(PremulRgba8),
    /// Sampled image region; `smoothing` selects bilinear over nearest.
    View { view: SrcView<'a>, smoothing: bool },
}

/// A rectangular window into a larger premultiplied RGBA8 page.
#[derive(Clone, Copy)]
pub struct SrcView<'a> {
    data: &'a [u8],
    page_width: u32,
    x0: u32,
    y0: u32,
    pub width: u32,
    pub height: u32,
}

impl<'a> SrcView<'a> {
    pub fn new(
        data: &'a [u8],
        page_width: u32,
        page_height: u32,
        x0: u32,
        y0: u32,
        width: u32,
        height: u32,
    ) -> ScrimResult<Self> {
        if data.len() != page_width as usize * page_height as usize * 4 {
            return Err(ScrimError::usage("source page byte length mismatch"));
        }
        let x_fits = x0.checked_add(width).is_some_and(|x| x <= page_width);
        let y_fits = y0.checked_add(height).is_some_and(|y| y <= page_height);
        if !x_fits || !y_fits {
            return Err(ScrimError::usage("source view exceeds page bounds"));
        }
        Ok(Self { data, page_width, x0, y0, width, height })
    }

    fn texel(&self, x: u32, y: u32) -> PremulRgba8 {
        let px = (self.x0 + x.min(self.width.saturating_sub(1))) as usize;
        let py = (self.y0 + y.min(self.height.saturating_sub(1))) as usize;
        let i = (py * self.page_width as usize + px) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Bilinear sample at view-local coordinates.
    fn sample_bilinear(&self, x: f32, y: f32) -> PremulRgba8 {
        let fx = (x - 0.5).max(0.0);
        let fy = (y - 0.5).max(0.0);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let tx = fx - fx.floor();
        let ty = fy - fy.floor();

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0u8; 4];
        for i in 0..4 {
            let top = f32::from(c00[i]) * (1.0 - tx) + f32::from(c10[i]) * tx;
            let bot = f32::from(c01[i]) * (1.0 - tx) + f32::from(c11[i]) * tx;
            out[i] = (top * (1.0 - ty) + bot * ty).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    fn sample_nearest(&self, x: f32, y: f32) -> PremulRgba8 {
        self.texel(x.floor().max(0.0) as u32, y.floor().max(0.0) as u32)
    }
}

pub fn premul(color: Rgba8) -> PremulRgba8 {
    let a = u16::from(color.a) + 1;
    let p = |c: u8| ((u16::from(c) * a) >> 8) as u8;
    [p(color.r), p(color.g), p(color.b), color.a]
}

/// Porter-duff source-over for one premultiplied pixel, with an extra
/// opacity applied to the source.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes, row-major. This is what the host uploads
    /// as its texture.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Clear a sub-rectangle to transparent; the rect is clamped to the
    /// canvas.
    pub fn clear_rect(&mut self, rect: Rect) {
        let x0 = rect.x.max(0.0) as u32;
        let y0 = rect.y.max(0.0) as u32;
        let x1 = ((rect.x + rect.width).min(self.width as f32)).max(0.0) as u32;
        let y1 = ((rect.y + rect.height).min(self.height as f32)).max(0.0) as u32;
        if x0 >= x1 || y0 >= y1 {
            // No intersection with the canvas.
            return;
        }
        for y in y0..y1 {
            let row = (y as usize * self.width as usize + x0 as usize) * 4;
            let end = (y as usize * self.width as usize + x1 as usize) * 4;
            self.data[row..end].fill(0);
        }
    }

    /// The affine paint core. `transform` maps source space, `(0,0)` to
    /// `(src_width, src_height)`, into canvas pixels. Every canvas pixel
    /// under the transformed quad is inverse-mapped and either filled with
    /// the solid color or sampled from the view, then composited `over`
    /// with `alpha`.
    pub fn paint_quad(
        &mut self,
        transform: Affine,
        src_width: f32,
        src_height: f32,
        alpha: f32,
        source: &PaintSource<'_>,
    ) {
        if src_width <= 0.0 || src_height <= 0.0 || alpha <= 0.0 {
            return;
        }
        let det = transform.determinant();
        if det == 0.0 || !det.is_finite() {
            return;
        }
        let inverse = transform.inverse();

        // Destination AABB from the four transformed corners, clamped to the
        // canvas.
        let corners = [
            transform * Point::new(0.0, 0.0),
            transform * Point::new(f64::from(src_width), 0.0),
            transform * Point::new(0.0, f64::from(src_height)),
            transform * Point::new(f64::from(src_width), f64::from(src_height)),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().min(f64::from(self.width))).max(0.0) as u32;
        let y1 = (max_y.ceil().min(f64::from(self.height))).max(0.0) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                let src_pt = inverse * Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                let sx = src_pt.x as f32;
                let sy = src_pt.y as f32;
                if sx < 0.0 || sy < 0.0 || sx >= src_width || sy >= src_height {
                    continue;
                }
                let src_px = match source {
                    PaintSource::Solid(c) => *c,
                    PaintSource::View { view, smoothing } => {
                        if *smoothing {
                            view.sample_bilinear(sx, sy)
                        } else {
                            view.sample_nearest(sx, sy)
                        }
                    }
                };
                let i = (py as usize * self.width as usize + px as usize) * 4;
                let dst = [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]];
                let out = over(dst, src_px, alpha);
                self.data[i..i + 4].copy_from_slice(&out);
            }
        }
    }

    /// Full-canvas tint: composite `color` source-atop, replacing the color
    /// of every covered pixel while keeping the canvas alpha untouched.
    pub fn tint_source_atop(&mut self, color: Rgba8) {
        let src = premul(color);
        let sa = u16::from(color.a);
        let inv = 255u16 - sa;
        for px in self.data.chunks_exact_mut(4) {
            let da = u16::from(px[3]);
            if da == 0 {
                continue;
            }
            for i in 0..3 {
                let sc = mul_div255(u16::from(src[i]), da);
                let dc = mul_div255(u16::from(px[i]), inv);
                px[i] = sc.saturating_add(dc);
            }
            // a_out = sa*da + da*(1-sa) = da
        }
    }
}
