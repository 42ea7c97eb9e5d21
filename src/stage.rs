//! The root container: node table, paint order, the single dirty flag, and
//! the redraw scheduler. Every tracked mutation funnels through [`NodeMut`]
//! or a stage method so the flag cannot be skipped.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    assets::{AssetData, AssetProvider},
    bounds,
    error::{ScrimError, ScrimResult},
    geom::{Rect, Rgba8, Vec2},
    host::{HostScene, derive_logical_width},
    hit::ClickListener,
    model::{Anchor, Axis2, Edges, Node, NodeId, NodeKind, Offset, PercentBasis, TextAlign},
    paint,
    pixmap::Pixmap,
};

/// Construction inputs: the host surface the canvas will be displayed on and
/// the logical canvas height. Logical width is derived from the surface
/// aspect ratio.
#[derive(Clone, Copy, Debug)]
pub struct StageConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    pub logical_height: u32,
    pub percent_basis: PercentBasis,
}

impl StageConfig {
    pub fn new(surface_width: u32, surface_height: u32) -> Self {
        Self {
            surface_width,
            surface_height,
            logical_height: 720,
            percent_basis: PercentBasis::default(),
        }
    }

    pub fn with_logical_height(mut self, h: u32) -> Self {
        self.logical_height = h;
        self
    }

    pub fn with_percent_basis(mut self, basis: PercentBasis) -> Self {
        self.percent_basis = basis;
        self
    }
}

pub struct Stage {
    pub(crate) nodes: Vec<Node>,
    /// Paint order; `move_to_front` is the only z mechanism.
    pub(crate) order: Vec<NodeId>,
    pub(crate) listeners: Vec<Option<ClickListener>>,
    pub(crate) needs_redraw: bool,
    /// True while the current interaction stream is touch-originated, so the
    /// synthetic mouse event that follows a touch gets suppressed.
    pub(crate) touch_stream: bool,
    pub(crate) config: StageConfig,
    logical_width: u32,
    pixmap: Pixmap,
    assets: Arc<dyn AssetProvider>,
    tint: Option<Rgba8>,
}

impl Stage {
    pub fn new(config: StageConfig, assets: Arc<dyn AssetProvider>) -> ScrimResult<Self> {
        if config.surface_width == 0 || config.surface_height == 0 {
            return Err(ScrimError::usage("host surface must have nonzero size"));
        }
        if config.logical_height == 0 {
            return Err(ScrimError::usage("logical height must be nonzero"));
        }
        let logical_width =
            derive_logical_width(config.surface_width, config.surface_height, config.logical_height);
        debug!(
            logical_width,
            logical_height = config.logical_height,
            "stage canvas sized from surface aspect"
        );
        Ok(Self {
            nodes: Vec::new(),
            order: Vec::new(),
            listeners: Vec::new(),
            needs_redraw: false,
            touch_stream: false,
            config,
            logical_width,
            pixmap: Pixmap::new(logical_width, config.logical_height),
            assets,
            tint: None,
        })
    }

    pub fn logical_width(&self) -> u32 {
        self.logical_width
    }

    pub fn logical_height(&self) -> u32 {
        self.config.logical_height
    }

    /// The root reference frame: `(0, 0, logical_width, logical_height)`.
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.logical_width as f32,
            self.config.logical_height as f32,
        )
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Full-canvas color-replace pass applied after drawing (source-atop).
    pub fn set_tint(&mut self, tint: Option<Rgba8>) {
        if self.tint != tint {
            self.tint = tint;
            self.needs_redraw = true;
        }
    }

    // ── factories ────────────────────────────────────────────────────────

    fn register(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.order.push(id);
        self.needs_redraw = true;
        id
    }

    /// Solid rectangle, default size 1x1.
    pub fn add_fill(&mut self, color: Rgba8) -> NodeId {
        self.register(Node::new(NodeKind::Fill { color }))
    }

    /// Sprite from a plain image asset (`frame: None`) or a sheet frame.
    /// The node's natural size is resolved here, not at draw time.
    pub fn add_sprite(&mut self, asset: &str, frame: Option<&str>) -> ScrimResult<NodeId> {
        let natural = self.sprite_natural_size(asset, frame)?;
        let mut node = Node::new(NodeKind::Sprite {
            asset: asset.to_owned(),
            frame: frame.map(str::to_owned),
            smoothing: true,
            scale: 1.0,
        });
        node.size = natural;
        Ok(self.register(node))
    }

    /// Vector text; natural size comes from the laid-out run.
    pub fn add_text(
        &mut self,
        font: &str,
        content: &str,
        size_px: f32,
        color: Rgba8,
    ) -> ScrimResult<NodeId> {
        let measured = self.text_natural_size(font, content, size_px)?;
        let mut node = Node::new(NodeKind::Text {
            content: content.to_owned(),
            font: font.to_owned(),
            size_px,
            color,
            align: TextAlign::Left,
        });
        node.size = measured;
        Ok(self.register(node))
    }

    /// Bitmap text composed from a texture page via a UV descriptor.
    pub fn add_bitmap_text(&mut self, font_asset: &str, content: &str) -> ScrimResult<NodeId> {
        let measured = self.bitmap_text_natural_size(font_asset, content)?;
        let mut node = Node::new(NodeKind::BitmapText {
            content: content.to_owned(),
            font_asset: font_asset.to_owned(),
            scale: 1.0,
            align: TextAlign::Left,
        });
        node.size = measured;
        Ok(self.register(node))
    }

    fn sprite_natural_size(&self, asset: &str, frame: Option<&str>) -> ScrimResult<Vec2> {
        let data = self
            .assets
            .get(asset)
            .ok_or_else(|| ScrimError::missing_data(format!("no asset '{asset}'")))?;
        match (data, frame) {
            (AssetData::Image(img), None) => Ok(Vec2::new(img.width as f32, img.height as f32)),
            (AssetData::Image(_), Some(f)) => Err(ScrimError::usage(format!(
                "asset '{asset}' is a plain image; frame '{f}' does not apply"
            ))),
            (AssetData::Sheet(sheet), Some(f)) => {
                let fr = sheet.frame(f)?;
                Ok(Vec2::new(fr.w as f32, fr.h as f32))
            }
            (AssetData::Sheet(_), None) => Err(ScrimError::usage(format!(
                "asset '{asset}' is a sheet; sprite needs a frame name"
            ))),
            _ => Err(ScrimError::usage(format!(
                "asset '{asset}' is not drawable as a sprite"
            ))),
        }
    }

    fn text_natural_size(&self, font: &str, content: &str, size_px: f32) -> ScrimResult<Vec2> {
        let Some(AssetData::Font(font_data)) = self.assets.get(font) else {
            return Err(ScrimError::missing_data(format!("no font asset '{font}'")));
        };
        crate::text::measure(&font_data.font, content, size_px)
    }

    fn bitmap_text_natural_size(&self, font_asset: &str, content: &str) -> ScrimResult<Vec2> {
        let Some(AssetData::BitmapFont(font)) = self.assets.get(font_asset) else {
            return Err(ScrimError::missing_data(format!(
                "no bitmap font asset '{font_asset}'"
            )));
        };
        let (w, h) = paint::bitmap_run_size(font, content);
        Ok(Vec2::new(w as f32, h as f32))
    }

    // ── node access ──────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> ScrimResult<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| ScrimError::usage(format!("no node with id {}", id.0)))
    }

    /// Controlled-mutation handle; every setter feeds the dirty flag.
    /// An id minted by another stage is a usage error, not a panic.
    pub fn node_mut(&mut self, id: NodeId) -> ScrimResult<NodeMut<'_>> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| ScrimError::usage(format!("no node with id {}", id.0)))?;
        Ok(NodeMut {
            node,
            dirty: &mut self.needs_redraw,
        })
    }

    /// Convenience resolver against this stage's canvas and percent basis.
    pub fn resolve_bounds(&self, id: NodeId) -> ScrimResult<Rect> {
        bounds::resolve_bounds(&self.nodes, self.canvas_rect(), id, self.config.percent_basis)
    }

    /// Re-point a sprite at another image or sheet frame; the natural size
    /// is re-resolved immediately.
    pub fn set_sprite_source(
        &mut self,
        id: NodeId,
        asset: &str,
        frame: Option<&str>,
    ) -> ScrimResult<()> {
        let natural = self.sprite_natural_size(asset, frame)?;
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| ScrimError::usage(format!("no node with id {}", id.0)))?;
        let NodeKind::Sprite { asset: cur_asset, frame: cur_frame, .. } = &mut node.kind else {
            return Err(ScrimError::usage("set_sprite_source on a non-sprite node"));
        };
        let changed = cur_asset.as_str() != asset
            || cur_frame.as_deref() != frame
            || node.size != natural;
        if changed {
            *cur_asset = asset.to_owned();
            *cur_frame = frame.map(str::to_owned);
            node.size = natural;
            self.needs_redraw = true;
        }
        Ok(())
    }

    /// Replace a text or bitmap-text node's content, re-measuring its
    /// natural size.
    pub fn set_text_content(&mut self, id: NodeId, content: &str) -> ScrimResult<()> {
        let (measured, changed) = match &self.node(id)?.kind {
            NodeKind::Text { content: cur, font, size_px, .. } => (
                self.text_natural_size(font, content, *size_px)?,
                cur != content,
            ),
            NodeKind::BitmapText { content: cur, font_asset, .. } => (
                self.bitmap_text_natural_size(font_asset, content)?,
                cur != content,
            ),
            _ => return Err(ScrimError::usage("set_text_content on a non-text node")),
        };
        if changed {
            let node = &mut self.nodes[id.0];
            match &mut node.kind {
                NodeKind::Text { content: cur, .. }
                | NodeKind::BitmapText { content: cur, .. } => *cur = content.to_owned(),
                _ => unreachable!("kind checked above"),
            }
            node.size = measured;
            self.needs_redraw = true;
        }
        Ok(())
    }

    /// Move `id` to the end of the paint order, putting it on top of
    /// everything painted so far.
    pub fn move_to_front(&mut self, id: NodeId) {
        if let Some(pos) = self.order.iter().position(|n| *n == id)
            && pos != self.order.len() - 1
        {
            self.order.remove(pos);
            self.order.push(id);
            self.needs_redraw = true;
        }
    }

    // ── redraw scheduler ─────────────────────────────────────────────────

    /// Repaint the canvas if anything changed; clean frames are a no-op.
    /// Returns whether a repaint happened.
    pub fn draw(&mut self) -> ScrimResult<bool> {
        self.draw_clearing(None)
    }

    /// As [`draw`](Self::draw), clearing only `region` when one is given
    /// instead of the full canvas.
    ///
    /// One failing node does not block the rest: every other node still
    /// paints, the failure is logged, and the dirty flag stays set so the
    /// next frame retries. The first failure is returned.
    pub fn draw_clearing(&mut self, region: Option<Rect>) -> ScrimResult<bool> {
        if !self.needs_redraw {
            trace!("canvas clean, skipping draw");
            return Ok(false);
        }

        match region {
            None => self.pixmap.clear(),
            Some(r) => self.pixmap.clear_rect(r),
        }

        let canvas = self.canvas_rect();
        let basis = self.config.percent_basis;
        let mut first_err = None;

        for idx in 0..self.order.len() {
            let id = self.order[idx];
            if !self.nodes[id.0].visible {
                continue;
            }
            let result = bounds::resolve_bounds(&self.nodes, canvas, id, basis).and_then(|b| {
                paint::paint_node(&mut self.pixmap, &self.nodes[id.0], b, &*self.assets)
            });
            if let Err(err) = result {
                warn!(node = id.0, %err, "node failed to paint");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }

        if let Some(err) = first_err {
            // Flag intentionally left set: the failed content was never
            // painted, so the next frame must try again.
            return Err(err);
        }

        debug!(nodes = self.order.len(), "canvas repainted");
        self.needs_redraw = false;
        Ok(true)
    }

    /// Per-host-frame entry point: draw, and only if a repaint actually
    /// happened apply the tint pass and signal the host to re-upload the
    /// texture and re-render.
    #[tracing::instrument(skip_all)]
    pub fn render(&mut self, host: &mut dyn HostScene) -> ScrimResult<bool> {
        let redrew = self.draw()?;
        if redrew {
            if let Some(tint) = self.tint {
                self.pixmap.tint_source_atop(tint);
            }
            host.texture_dirty();
            host.request_render();
        }
        Ok(redrew)
    }
}

/// Mutation proxy over one node. Each setter compares against the stored
/// value and flips the stage's dirty flag only on a real change, so writing
/// back an identical value never schedules a repaint.
pub struct NodeMut<'a> {
    node: &'a mut Node,
    dirty: &'a mut bool,
}

fn touch<T: PartialEq>(slot: &mut T, value: T, dirty: &mut bool) {
    if *slot != value {
        *slot = value;
        *dirty = true;
    }
}

impl NodeMut<'_> {
    pub fn set_position(&mut self, v: Vec2) {
        touch(&mut self.node.position, v, self.dirty);
    }

    pub fn set_size(&mut self, v: Vec2) {
        touch(&mut self.node.size, v, self.dirty);
    }

    pub fn set_rotation_deg(&mut self, v: f32) {
        touch(&mut self.node.rotation_deg, v, self.dirty);
    }

    pub fn set_alpha(&mut self, v: f32) {
        touch(&mut self.node.alpha, v, self.dirty);
    }

    pub fn set_visible(&mut self, v: bool) {
        touch(&mut self.node.visible, v, self.dirty);
    }

    pub fn set_pivot(&mut self, v: Vec2) {
        touch(&mut self.node.pivot, v, self.dirty);
    }

    pub fn set_anchor(&mut self, v: Axis2<Anchor>) {
        touch(&mut self.node.anchor, v, self.dirty);
    }

    pub fn set_stretch(&mut self, v: Axis2<bool>) {
        touch(&mut self.node.stretch, v, self.dirty);
    }

    pub fn set_offset(&mut self, v: Edges) {
        touch(&mut self.node.offset, v, self.dirty);
    }

    pub fn set_offset_left(&mut self, v: Offset) {
        touch(&mut self.node.offset.left, v, self.dirty);
    }

    pub fn set_offset_top(&mut self, v: Offset) {
        touch(&mut self.node.offset.top, v, self.dirty);
    }

    pub fn set_offset_right(&mut self, v: Offset) {
        touch(&mut self.node.offset.right, v, self.dirty);
    }

    pub fn set_offset_bottom(&mut self, v: Offset) {
        touch(&mut self.node.offset.bottom, v, self.dirty);
    }

    /// Re-parent onto another node's bounds (or back onto the canvas with
    /// `None`). Cycles are not checked here; the resolver fails fast on
    /// them at the next evaluation.
    pub fn set_bounds_parent(&mut self, v: Option<NodeId>) {
        touch(&mut self.node.bounds_parent, v, self.dirty);
    }

    // ── kind-specific fields ─────────────────────────────────────────────

    pub fn set_fill_color(&mut self, v: Rgba8) -> ScrimResult<()> {
        let NodeKind::Fill { color } = &mut self.node.kind else {
            return Err(ScrimError::usage("set_fill_color on a non-fill node"));
        };
        touch(color, v, self.dirty);
        Ok(())
    }

    pub fn set_smoothing(&mut self, v: bool) -> ScrimResult<()> {
        let NodeKind::Sprite { smoothing, .. } = &mut self.node.kind else {
            return Err(ScrimError::usage("set_smoothing on a non-sprite node"));
        };
        touch(smoothing, v, self.dirty);
        Ok(())
    }

    pub fn set_scale(&mut self, v: f32) -> ScrimResult<()> {
        match &mut self.node.kind {
            NodeKind::Sprite { scale, .. } | NodeKind::BitmapText { scale, .. } => {
                touch(scale, v, self.dirty);
                Ok(())
            }
            _ => Err(ScrimError::usage("set_scale on an unscalable node")),
        }
    }

    pub fn set_text_align(&mut self, v: TextAlign) -> ScrimResult<()> {
        match &mut self.node.kind {
            NodeKind::Text { align, .. } | NodeKind::BitmapText { align, .. } => {
                touch(align, v, self.dirty);
                Ok(())
            }
            _ => Err(ScrimError::usage("set_text_align on a non-text node")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::host::NullHost;

    fn stage() -> Stage {
        Stage::new(
            StageConfig::new(1280, 720),
            Arc::new(MemoryAssets::new()),
        )
        .unwrap()
    }

    #[test]
    fn logical_width_derives_from_surface_aspect() {
        let s = stage();
        assert_eq!(s.logical_width(), 1280);
        assert_eq!(s.logical_height(), 720);
        assert_eq!(s.canvas_rect(), Rect::new(0.0, 0.0, 1280.0, 720.0));
    }

    #[test]
    fn zero_surface_is_a_usage_error() {
        let r = Stage::new(StageConfig::new(0, 720), Arc::new(MemoryAssets::new()));
        assert!(matches!(r, Err(ScrimError::Usage(_))));
    }

    #[test]
    fn factories_mark_the_stage_dirty() {
        let mut s = stage();
        assert!(!s.needs_redraw());
        s.add_fill(Rgba8::WHITE);
        assert!(s.needs_redraw());
    }

    #[test]
    fn writing_an_equal_value_does_not_dirty() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::WHITE);
        s.draw().unwrap();
        assert!(!s.needs_redraw());

        s.node_mut(id).unwrap().set_position(Vec2::ZERO);
        s.node_mut(id).unwrap().set_alpha(1.0);
        s.node_mut(id).unwrap().set_visible(true);
        assert!(!s.needs_redraw());
    }

    #[test]
    fn writing_a_different_value_dirties() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::WHITE);
        s.draw().unwrap();

        s.node_mut(id).unwrap().set_position(Vec2::new(5.0, 0.0));
        assert!(s.needs_redraw());
    }

    #[test]
    fn each_tracked_field_feeds_the_flag() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::WHITE);

        let cases: Vec<Box<dyn Fn(&mut Stage)>> = vec![
            Box::new(move |s| s.node_mut(id).unwrap().set_size(Vec2::new(9.0, 9.0))),
            Box::new(move |s| s.node_mut(id).unwrap().set_rotation_deg(45.0)),
            Box::new(move |s| s.node_mut(id).unwrap().set_alpha(0.5)),
            Box::new(move |s| s.node_mut(id).unwrap().set_visible(false)),
            Box::new(move |s| s.node_mut(id).unwrap().set_pivot(Vec2::splat(0.5))),
            Box::new(move |s| s.node_mut(id).unwrap().set_anchor(Axis2::splat(Anchor::Center))),
            Box::new(move |s| s.node_mut(id).unwrap().set_stretch(Axis2::splat(true))),
            Box::new(move |s| s.node_mut(id).unwrap().set_offset_right(Offset::Percent(10.0))),
            Box::new(move |s| s.node_mut(id).unwrap().set_fill_color(Rgba8::BLACK).unwrap()),
        ];
        for mutate in cases {
            s.needs_redraw = false;
            mutate(&mut s);
            assert!(s.needs_redraw());
        }
    }

    #[test]
    fn node_ids_from_another_stage_are_rejected() {
        let mut donor = stage();
        let id = donor.add_fill(Rgba8::WHITE);

        let mut empty = stage();
        assert!(matches!(empty.node(id), Err(ScrimError::Usage(_))));
        assert!(matches!(empty.node_mut(id), Err(ScrimError::Usage(_))));
        assert!(matches!(
            empty.set_text_content(id, "x"),
            Err(ScrimError::Usage(_))
        ));
        // The id still works on the stage that minted it.
        assert!(donor.node(id).is_ok());
    }

    #[test]
    fn wrong_kind_setter_is_a_usage_error() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::WHITE);
        assert!(matches!(
            s.node_mut(id).unwrap().set_smoothing(false),
            Err(ScrimError::Usage(_))
        ));
        assert!(matches!(
            s.node_mut(id).unwrap().set_text_align(TextAlign::Center),
            Err(ScrimError::Usage(_))
        ));
    }

    #[test]
    fn draw_clearing_tolerates_an_off_canvas_region() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::opaque(255, 0, 0));
        s.node_mut(id).unwrap().set_size(Vec2::new(4.0, 4.0));
        s.draw().unwrap();

        // A region entirely right of the 1280x720 canvas clears nothing.
        s.needs_redraw = true;
        assert!(s.draw_clearing(Some(Rect::new(2000.0, 10.0, 50.0, 50.0))).unwrap());
        assert_eq!(s.pixmap().pixel(1, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn draw_clears_the_flag_exactly_once() {
        let mut s = stage();
        s.add_fill(Rgba8::WHITE);

        assert!(s.draw().unwrap());
        assert!(!s.needs_redraw());
        // Second call is a no-op.
        assert!(!s.draw().unwrap());
    }

    #[test]
    fn invisible_nodes_are_skipped_by_the_painter() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::opaque(255, 0, 0));
        {
            let mut m = s.node_mut(id).unwrap();
            m.set_stretch(Axis2::splat(true));
            m.set_visible(false);
        }
        s.draw().unwrap();
        assert_eq!(s.pixmap().pixel(10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_paints_in_order_and_move_to_front_restacks() {
        let mut s = stage();
        let red = s.add_fill(Rgba8::opaque(255, 0, 0));
        let blue = s.add_fill(Rgba8::opaque(0, 0, 255));
        for id in [red, blue] {
            s.node_mut(id).unwrap().set_size(Vec2::new(10.0, 10.0));
        }
        s.draw().unwrap();
        // Later registration wins.
        assert_eq!(s.pixmap().pixel(5, 5), [0, 0, 255, 255]);

        s.move_to_front(red);
        assert!(s.needs_redraw());
        s.draw().unwrap();
        assert_eq!(s.pixmap().pixel(5, 5), [255, 0, 0, 255]);
    }

    #[test]
    fn move_to_front_of_topmost_node_stays_clean() {
        let mut s = stage();
        let a = s.add_fill(Rgba8::WHITE);
        s.draw().unwrap();
        s.move_to_front(a);
        assert!(!s.needs_redraw());
    }

    #[test]
    fn failing_node_leaves_flag_set_and_others_painted() {
        let mut s = stage();
        let sprite = {
            // Register a sprite whose asset disappears by pointing at a
            // provider that never had it: build the node directly.
            let mut node = Node::new(NodeKind::Sprite {
                asset: "gone".into(),
                frame: None,
                smoothing: false,
                scale: 1.0,
            });
            node.size = Vec2::new(4.0, 4.0);
            s.register(node)
        };
        let fill = s.add_fill(Rgba8::opaque(0, 255, 0));
        s.node_mut(fill).unwrap().set_size(Vec2::new(8.0, 8.0));
        let _ = sprite;

        let err = s.draw().unwrap_err();
        assert!(matches!(err, ScrimError::MissingData(_)));
        // The healthy node painted anyway, and the flag survives for retry.
        assert_eq!(s.pixmap().pixel(2, 2), [0, 255, 0, 255]);
        assert!(s.needs_redraw());
    }

    #[test]
    fn render_signals_host_only_on_repaint_frames() {
        #[derive(Default)]
        struct CountingHost {
            uploads: u32,
            renders: u32,
        }
        impl crate::host::HostScene for CountingHost {
            fn texture_dirty(&mut self) {
                self.uploads += 1;
            }
            fn request_render(&mut self) {
                self.renders += 1;
            }
        }

        let mut s = stage();
        s.add_fill(Rgba8::WHITE);
        let mut host = CountingHost::default();

        assert!(s.render(&mut host).unwrap());
        assert!(!s.render(&mut host).unwrap());
        assert!(!s.render(&mut host).unwrap());
        assert_eq!(host.uploads, 1);
        assert_eq!(host.renders, 1);
    }

    #[test]
    fn tint_applies_after_draw() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::opaque(0, 0, 255));
        s.node_mut(id).unwrap().set_size(Vec2::new(4.0, 4.0));
        s.set_tint(Some(Rgba8::opaque(255, 0, 0)));
        s.render(&mut NullHost).unwrap();

        let px = s.pixmap().pixel(1, 1);
        assert_eq!(px[0], 255);
        assert_eq!(px[2], 0);
    }

    #[test]
    fn set_text_content_requires_a_text_node() {
        let mut s = stage();
        let id = s.add_fill(Rgba8::WHITE);
        assert!(matches!(
            s.set_text_content(id, "hi"),
            Err(ScrimError::Usage(_))
        ));
    }

    #[test]
    fn reparenting_is_tracked_and_resolved() {
        let mut s = stage();
        let parent = s.add_fill(Rgba8::WHITE);
        let child = s.add_fill(Rgba8::BLACK);
        {
            let mut m = s.node_mut(parent).unwrap();
            m.set_position(Vec2::new(100.0, 100.0));
            m.set_size(Vec2::new(200.0, 200.0));
        }
        s.draw().unwrap();

        s.node_mut(child).unwrap().set_bounds_parent(Some(parent));
        assert!(s.needs_redraw());
        let b = s.resolve_bounds(child).unwrap();
        assert_eq!((b.x, b.y), (100.0, 100.0));
    }
}
