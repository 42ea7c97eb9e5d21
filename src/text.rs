//! Vector text: fontdue coverage rasterization collected into a
//! premultiplied RGBA run the painter can blit like any other image.

use crate::{
    error::{ScrimError, ScrimResult},
    geom::{Rgba8, Vec2},
    model::TextAlign,
    pixmap::over,
};

/// A laid-out, colored text run ready for blitting.
#[derive(Clone, Debug)]
pub struct RasterizedRun {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

struct LineMetrics {
    ascent: f32,
    line_height: f32,
}

fn metrics_for(font: &fontdue::Font, size_px: f32) -> ScrimResult<LineMetrics> {
    let m = font
        .horizontal_line_metrics(size_px)
        .ok_or_else(|| ScrimError::usage("font has no horizontal line metrics"))?;
    Ok(LineMetrics {
        ascent: m.ascent,
        line_height: m.new_line_size,
    })
}

fn line_width(font: &fontdue::Font, line: &str, size_px: f32) -> f32 {
    line.chars()
        .map(|c| font.metrics(c, size_px).advance_width)
        .sum()
}

/// Natural size of `content` at `size_px`: widest line by summed advances,
/// line count times the font's line height.
pub fn measure(font: &fontdue::Font, content: &str, size_px: f32) -> ScrimResult<Vec2> {
    if content.is_empty() {
        return Ok(Vec2::ZERO);
    }
    let m = metrics_for(font, size_px)?;
    let mut width = 0.0f32;
    let mut lines = 0u32;
    for line in content.split('\n') {
        width = width.max(line_width(font, line, size_px));
        lines += 1;
    }
    Ok(Vec2::new(width.ceil(), (m.line_height * lines as f32).ceil()))
}

/// Horizontal pen start for one line inside the run box.
pub(crate) fn align_offset(align: TextAlign, run_width: f32, line_width: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => (run_width - line_width) * 0.5,
        TextAlign::Right => run_width - line_width,
    }
}

/// Rasterize `content` into a premultiplied RGBA run. Lines split on `\n`
/// and align within the run's own width.
pub fn rasterize_run(
    font: &fontdue::Font,
    content: &str,
    size_px: f32,
    color: Rgba8,
    align: TextAlign,
) -> ScrimResult<RasterizedRun> {
    let natural = measure(font, content, size_px)?;
    let run_w = natural.x as u32;
    let run_h = natural.y as u32;
    if run_w == 0 || run_h == 0 {
        return Ok(RasterizedRun { width: 0, height: 0, rgba8_premul: Vec::new() });
    }

    let m = metrics_for(font, size_px)?;
    let mut data = vec![0u8; run_w as usize * run_h as usize * 4];

    for (line_index, line) in content.split('\n').enumerate() {
        let baseline = m.ascent + m.line_height * line_index as f32;
        let mut pen = align_offset(align, natural.x, line_width(font, line, size_px));

        for ch in line.chars() {
            let (metrics, coverage) = font.rasterize(ch, size_px);
            let glyph_left = pen + metrics.xmin as f32;
            let glyph_top = baseline - metrics.ymin as f32 - metrics.height as f32;

            for row in 0..metrics.height {
                let py = glyph_top + row as f32;
                if py < 0.0 || py >= run_h as f32 {
                    continue;
                }
                for col in 0..metrics.width {
                    let px = glyph_left + col as f32;
                    if px < 0.0 || px >= run_w as f32 {
                        continue;
                    }
                    let c = coverage[row * metrics.width + col];
                    if c == 0 {
                        continue;
                    }
                    // Coverage modulates the straight color, then premultiply.
                    let a = (u32::from(color.a) * u32::from(c) / 255) as u8;
                    let pm = |v: u8| ((u32::from(v) * u32::from(a)) / 255) as u8;
                    let src = [pm(color.r), pm(color.g), pm(color.b), a];

                    let i = (py as usize * run_w as usize + px as usize) * 4;
                    let dst = [data[i], data[i + 1], data[i + 2], data[i + 3]];
                    let out = over(dst, src, 1.0);
                    data[i..i + 4].copy_from_slice(&out);
                }
            }
            pen += metrics.advance_width;
        }
    }

    Ok(RasterizedRun { width: run_w, height: run_h, rgba8_premul: data })
}
