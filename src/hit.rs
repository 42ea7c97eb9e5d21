//! Click hit-testing: window coordinates scale into canvas space, every
//! listener-bearing node is tested against its freshly resolved bounds, and
//! matching callbacks are queued before any of them runs.

use tracing::{debug, trace};

use crate::{
    bounds,
    error::ScrimResult,
    geom::Vec2,
    model::NodeId,
    stage::Stage,
};

/// Where a pointer-down came from. Touch streams produce a synthetic mouse
/// event afterwards on some hosts; the dispatcher suppresses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDevice {
    Mouse,
    Touch,
}

/// A pointer-down in host window coordinates (the displayed canvas, not the
/// logical one).
#[derive(Clone, Copy, Debug)]
pub struct PointerEvent {
    pub device: PointerDevice,
    pub window: Vec2,
}

impl PointerEvent {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self { device: PointerDevice::Mouse, window: Vec2::new(x, y) }
    }

    pub fn touch(x: f32, y: f32) -> Self {
        Self { device: PointerDevice::Touch, window: Vec2::new(x, y) }
    }
}

/// Handle for a registered click listener. Registration order is firing
/// order; there is no unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(pub(crate) usize);

pub(crate) struct ClickListener {
    pub(crate) node: NodeId,
    pub(crate) handler: Box<dyn FnMut(&mut Stage, NodeId)>,
}

impl Stage {
    /// Register a click handler for `node`. Handlers fire in registration
    /// order and may freely mutate the stage; matching for the event that
    /// fires them has already finished by then.
    pub fn on_click(
        &mut self,
        node: NodeId,
        handler: impl FnMut(&mut Stage, NodeId) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.listeners.len());
        self.listeners.push(Some(ClickListener {
            node,
            handler: Box::new(handler),
        }));
        id
    }

    /// Window-to-canvas transform: a per-axis linear scale from the
    /// displayed surface size to the logical canvas size.
    pub fn window_to_canvas(&self, window: Vec2) -> Vec2 {
        Vec2::new(
            window.x * self.logical_width() as f32 / self.config.surface_width as f32,
            window.y * self.logical_height() as f32 / self.config.surface_height as f32,
        )
    }

    /// Dispatch a pointer-down. Returns how many listeners fired.
    ///
    /// Two phases: first every live listener's node is tested (own
    /// visibility only, inclusive box test against freshly resolved bounds)
    /// and matches are queued; then the queue fires in registration order.
    /// A callback toggling visibility or reparenting nodes therefore cannot
    /// change which other callbacks fire for this event.
    #[tracing::instrument(skip(self), fields(device = ?event.device))]
    pub fn pointer_down(&mut self, event: PointerEvent) -> ScrimResult<usize> {
        match event.device {
            PointerDevice::Touch => {
                self.touch_stream = true;
            }
            PointerDevice::Mouse => {
                if self.touch_stream {
                    // The synthetic mouse event that trails a touch.
                    debug!("suppressing mouse event after touch");
                    self.touch_stream = false;
                    return Ok(0);
                }
            }
        }

        let point = self.window_to_canvas(event.window);
        let canvas = self.canvas_rect();
        let basis = self.config.percent_basis;

        let mut queue = Vec::new();
        for (index, slot) in self.listeners.iter().enumerate() {
            let Some(listener) = slot else { continue };
            // Eligibility is the node's own visibility only; an invisible
            // bounds parent does not shadow its children.
            if !self.node(listener.node)?.visible {
                continue;
            }
            let b = bounds::resolve_bounds(&self.nodes, canvas, listener.node, basis)?;
            if b.contains_inclusive(point) {
                queue.push(index);
            }
        }
        trace!(matches = queue.len(), ?point, "hit test complete");

        let fired = queue.len();
        for index in queue {
            // Take the listener out while it runs so it can mutate the
            // stage (including the listener list) reentrantly.
            if let Some(mut listener) = self.listeners[index].take() {
                let node = listener.node;
                (listener.handler)(self, node);
                if self.listeners[index].is_none() {
                    self.listeners[index] = Some(listener);
                }
            }
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::assets::MemoryAssets;
    use crate::error::ScrimError;
    use crate::geom::Rgba8;
    use crate::stage::StageConfig;

    fn stage() -> Stage {
        Stage::new(StageConfig::new(1280, 720), Arc::new(MemoryAssets::new())).unwrap()
    }

    fn boxed_fill(s: &mut Stage, x: f32, y: f32, w: f32, h: f32) -> NodeId {
        let id = s.add_fill(Rgba8::WHITE);
        let mut m = s.node_mut(id).unwrap();
        m.set_position(Vec2::new(x, y));
        m.set_size(Vec2::new(w, h));
        id
    }

    fn fired_log(s: &mut Stage, id: NodeId, log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) {
        let log = Rc::clone(log);
        s.on_click(id, move |_, _| log.borrow_mut().push(tag));
    }

    #[test]
    fn window_coordinates_scale_to_canvas() {
        let s = Stage::new(StageConfig::new(2560, 1440), Arc::new(MemoryAssets::new())).unwrap();
        // Displayed 2560x1440, logical 1280x720: everything halves.
        let p = s.window_to_canvas(Vec2::new(100.0, 50.0));
        assert_eq!((p.x, p.y), (50.0, 25.0));
    }

    #[test]
    fn click_inside_fires_outside_does_not() {
        let mut s = stage();
        let id = boxed_fill(&mut s, 10.0, 10.0, 100.0, 100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        fired_log(&mut s, id, &log, "hit");

        assert_eq!(s.pointer_down(PointerEvent::mouse(50.0, 50.0)).unwrap(), 1);
        assert_eq!(s.pointer_down(PointerEvent::mouse(500.0, 50.0)).unwrap(), 0);
        assert_eq!(*log.borrow(), vec!["hit"]);
    }

    #[test]
    fn boundary_point_is_inside_one_past_is_not() {
        let mut s = stage();
        let id = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        fired_log(&mut s, id, &log, "hit");

        assert_eq!(s.pointer_down(PointerEvent::mouse(100.0, 100.0)).unwrap(), 1);
        assert_eq!(s.pointer_down(PointerEvent::mouse(101.0, 100.0)).unwrap(), 0);
    }

    #[test]
    fn invisible_node_is_ineligible() {
        let mut s = stage();
        let id = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        s.on_click(id, |_, _| {});
        s.node_mut(id).unwrap().set_visible(false);

        assert_eq!(s.pointer_down(PointerEvent::mouse(50.0, 50.0)).unwrap(), 0);
    }

    #[test]
    fn listener_on_a_foreign_id_is_a_usage_error() {
        let mut donor = stage();
        donor.add_fill(Rgba8::WHITE);
        let foreign = donor.add_fill(Rgba8::WHITE);

        let mut s = stage();
        s.on_click(foreign, |_, _| {});
        let err = s.pointer_down(PointerEvent::mouse(50.0, 50.0)).unwrap_err();
        assert!(matches!(err, ScrimError::Usage(_)));
    }

    #[test]
    fn invisible_parent_does_not_shadow_a_visible_child() {
        // Eligibility checks only the node's own flag, never the chain.
        let mut s = stage();
        let parent = boxed_fill(&mut s, 0.0, 0.0, 200.0, 200.0);
        let child = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        s.node_mut(child).unwrap().set_bounds_parent(Some(parent));
        s.node_mut(parent).unwrap().set_visible(false);
        s.on_click(child, |_, _| {});

        assert_eq!(s.pointer_down(PointerEvent::mouse(50.0, 50.0)).unwrap(), 1);
    }

    #[test]
    fn matching_finishes_before_any_callback_runs() {
        // A=(0,0,100,100) registered first hides B=(50,50,100,100);
        // a click at (60,60) still fires both.
        let mut s = stage();
        let a = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let b = boxed_fill(&mut s, 50.0, 50.0, 100.0, 100.0);

        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            s.on_click(a, move |stage, _| {
                stage.node_mut(b).unwrap().set_visible(false);
                log.borrow_mut().push("a");
            });
        }
        fired_log(&mut s, b, &log, "b");

        assert_eq!(s.pointer_down(PointerEvent::mouse(60.0, 60.0)).unwrap(), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(!s.node(b).unwrap().visible());
    }

    #[test]
    fn callbacks_fire_in_registration_order() {
        let mut s = stage();
        let top = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        fired_log(&mut s, top, &log, "first");
        fired_log(&mut s, top, &log, "second");
        fired_log(&mut s, top, &log, "third");

        s.pointer_down(PointerEvent::mouse(10.0, 10.0)).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn mouse_event_after_touch_is_suppressed_once() {
        let mut s = stage();
        let id = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        fired_log(&mut s, id, &log, "hit");

        assert_eq!(s.pointer_down(PointerEvent::touch(10.0, 10.0)).unwrap(), 1);
        // The synthetic mouse echo.
        assert_eq!(s.pointer_down(PointerEvent::mouse(10.0, 10.0)).unwrap(), 0);
        // A genuine later mouse press dispatches again.
        assert_eq!(s.pointer_down(PointerEvent::mouse(10.0, 10.0)).unwrap(), 1);
        assert_eq!(*log.borrow(), vec!["hit", "hit"]);
    }

    #[test]
    fn cyclic_parent_aborts_the_dispatch() {
        let mut s = stage();
        let a = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let b = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        s.node_mut(a).unwrap().set_bounds_parent(Some(b));
        s.node_mut(b).unwrap().set_bounds_parent(Some(a));
        s.on_click(a, |_, _| {});

        assert!(s.pointer_down(PointerEvent::mouse(10.0, 10.0)).is_err());
    }

    #[test]
    fn handler_can_register_more_listeners() {
        let mut s = stage();
        let id = boxed_fill(&mut s, 0.0, 0.0, 100.0, 100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            s.on_click(id, move |stage, node| {
                let log = Rc::clone(&log);
                stage.on_click(node, move |_, _| log.borrow_mut().push("late"));
            });
        }

        // The newly registered listener is not part of this event's queue.
        assert_eq!(s.pointer_down(PointerEvent::mouse(10.0, 10.0)).unwrap(), 1);
        assert!(log.borrow().is_empty());
        // It participates in the next one.
        assert_eq!(s.pointer_down(PointerEvent::mouse(10.0, 10.0)).unwrap(), 2);
        assert_eq!(*log.borrow(), vec!["late"]);
    }
}
