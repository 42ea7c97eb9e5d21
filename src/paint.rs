//! Per-kind node painters. Dispatch is a closed match over [`NodeKind`];
//! every painter funnels into the pixmap's affine paint core.
//!
//! Rotation is applied here, about the pivot point, and nowhere else: the
//! bounds resolver and the hit-test dispatcher always see the axis-aligned
//! rectangle. A sprite's `scale` likewise multiplies only the painted quad.

use kurbo::Affine;

use crate::{
    assets::{AssetData, AssetProvider, BitmapFontData},
    bounds::pivot_point,
    error::{ScrimError, ScrimResult},
    geom::Rect,
    model::{Node, NodeKind, TextAlign},
    pixmap::{PaintSource, Pixmap, SrcView, premul},
    text,
};

/// Rotation about the node's pivot point, in canvas space.
fn pivot_rotation(node: &Node, bounds: Rect) -> Affine {
    if node.rotation_deg == 0.0 {
        return Affine::IDENTITY;
    }
    let p = pivot_point(node, bounds);
    let radians = f64::from(node.rotation_deg).to_radians();
    Affine::translate((f64::from(p.x), f64::from(p.y)))
        * Affine::rotate(radians)
        * Affine::translate((-f64::from(p.x), -f64::from(p.y)))
}

/// Transform mapping source space `(0,0)..(src_w,src_h)` onto the node's
/// painted quad: scale to the destination size, translate to the bounds
/// origin, then rotate about the pivot.
fn quad_transform(node: &Node, bounds: Rect, src_w: f32, src_h: f32, dest_scale: f32) -> Affine {
    let sx = f64::from(bounds.width * dest_scale) / f64::from(src_w);
    let sy = f64::from(bounds.height * dest_scale) / f64::from(src_h);
    pivot_rotation(node, bounds)
        * Affine::translate((f64::from(bounds.x), f64::from(bounds.y)))
        * Affine::scale_non_uniform(sx, sy)
}

pub(crate) fn paint_node(
    pixmap: &mut Pixmap,
    node: &Node,
    bounds: Rect,
    assets: &dyn AssetProvider,
) -> ScrimResult<()> {
    let alpha = node.alpha.clamp(0.0, 1.0);
    if alpha == 0.0 {
        return Ok(());
    }

    match &node.kind {
        NodeKind::Fill { color } => {
            let transform = quad_transform(node, bounds, bounds.width, bounds.height, 1.0);
            pixmap.paint_quad(
                transform,
                bounds.width,
                bounds.height,
                alpha,
                &PaintSource::Solid(premul(*color)),
            );
            Ok(())
        }

        NodeKind::Sprite { asset, frame, smoothing, scale } => {
            let data = assets
                .get(asset)
                .ok_or_else(|| ScrimError::missing_data(format!("no asset '{asset}'")))?;
            let (page, window) = match (data, frame) {
                (AssetData::Image(img), None) => (img, (0, 0, img.width, img.height)),
                (AssetData::Image(_), Some(f)) => {
                    return Err(ScrimError::usage(format!(
                        "asset '{asset}' is a plain image; frame '{f}' does not apply"
                    )));
                }
                (AssetData::Sheet(sheet), Some(f)) => {
                    let fr = sheet.frame(f)?;
                    (&sheet.page, (fr.x, fr.y, fr.w, fr.h))
                }
                (AssetData::Sheet(_), None) => {
                    return Err(ScrimError::usage(format!(
                        "asset '{asset}' is a sheet; sprite needs a frame name"
                    )));
                }
                _ => {
                    return Err(ScrimError::usage(format!(
                        "asset '{asset}' is not drawable as a sprite"
                    )));
                }
            };

            let (x0, y0, w, h) = window;
            let view = SrcView::new(&page.rgba8_premul, page.width, page.height, x0, y0, w, h)?;
            let transform = quad_transform(node, bounds, w as f32, h as f32, *scale);
            pixmap.paint_quad(
                transform,
                w as f32,
                h as f32,
                alpha,
                &PaintSource::View { view, smoothing: *smoothing },
            );
            Ok(())
        }

        NodeKind::Text { content, font, size_px, color, align } => {
            let Some(AssetData::Font(font_data)) = assets.get(font) else {
                return Err(ScrimError::missing_data(format!("no font asset '{font}'")));
            };
            let run = text::rasterize_run(&font_data.font, content, *size_px, *color, *align)?;
            if run.width == 0 || run.height == 0 {
                return Ok(());
            }
            let view = SrcView::new(
                &run.rgba8_premul,
                run.width,
                run.height,
                0,
                0,
                run.width,
                run.height,
            )?;
            let transform = quad_transform(node, bounds, run.width as f32, run.height as f32, 1.0);
            pixmap.paint_quad(
                transform,
                run.width as f32,
                run.height as f32,
                alpha,
                &PaintSource::View { view, smoothing: true },
            );
            Ok(())
        }

        NodeKind::BitmapText { content, font_asset, scale, align } => {
            let Some(AssetData::BitmapFont(font)) = assets.get(font_asset) else {
                return Err(ScrimError::missing_data(format!(
                    "no bitmap font asset '{font_asset}'"
                )));
            };
            let run = compose_bitmap_run(font, content, *align);
            if run.width == 0 || run.height == 0 {
                return Ok(());
            }
            let view = SrcView::new(
                &run.rgba8_premul,
                run.width,
                run.height,
                0,
                0,
                run.width,
                run.height,
            )?;
            let transform = quad_transform(node, bounds, run.width as f32, run.height as f32, *scale);
            pixmap.paint_quad(
                transform,
                run.width as f32,
                run.height as f32,
                alpha,
                &PaintSource::View { view, smoothing: false },
            );
            Ok(())
        }
    }
}

/// Natural (scale 1) size of a bitmap-text run.
pub(crate) fn bitmap_run_size(font: &BitmapFontData, content: &str) -> (u32, u32) {
    if content.is_empty() {
        return (0, 0);
    }
    let mut width = 0;
    let mut lines = 0;
    for line in content.split('\n') {
        width = width.max(font.line_width(line));
        lines += 1;
    }
    (width, font.line_height() * lines)
}

/// Copy glyph cells off the page into one run buffer, lines aligned within
/// the run width. Characters without a cell contribute no advance.
fn compose_bitmap_run(font: &BitmapFontData, content: &str, align: TextAlign) -> RunBuffer {
    let (run_w, run_h) = bitmap_run_size(font, content);
    if run_w == 0 || run_h == 0 {
        return RunBuffer { width: 0, height: 0, rgba8_premul: Vec::new() };
    }
    let line_h = font.line_height();
    let mut data = vec![0u8; run_w as usize * run_h as usize * 4];

    for (line_index, line) in content.split('\n').enumerate() {
        let mut pen =
            text::align_offset(align, run_w as f32, font.line_width(line) as f32).round() as u32;
        let top = line_index as u32 * line_h;

        for ch in line.chars() {
            let Some(cell) = font.glyph(ch) else { continue };
            // Glyph rows sit on the line's baseline (bottom edge).
            let y_off = top + line_h - cell.height();
            for row in 0..cell.height() {
                let src_i =
                    (((cell.y0 + row) * font.page.width + cell.x0) * 4) as usize;
                let dst_i = (((y_off + row) * run_w + pen) * 4) as usize;
                let n = (cell.width() * 4) as usize;
                data[dst_i..dst_i + n]
                    .copy_from_slice(&font.page.rgba8_premul[src_i..src_i + n]);
            }
            pen += cell.width();
        }
    }

    RunBuffer { width: run_w, height: run_h, rgba8_premul: data }
}

struct RunBuffer {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}
