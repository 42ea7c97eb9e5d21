//! Host-scene capability: how the stage tells its embedding 3D renderer
//! that the canvas texture changed. Injected per `render` call rather than
//! held globally.

/// Signals the stage raises toward the hosting 3D scene. Both fire only on
/// frames where a redraw actually happened, so a clean frame costs the host
/// nothing.
pub trait HostScene {
    /// The canvas pixels changed; re-upload the projected texture.
    fn texture_dirty(&mut self);

    /// Ask the host to re-render its scene this frame.
    fn request_render(&mut self);
}

/// Host that ignores the signals, for off-screen use and tests.
#[derive(Default)]
pub struct NullHost;

impl HostScene for NullHost {
    fn texture_dirty(&mut self) {}

    fn request_render(&mut self) {}
}

/// Derive the logical canvas width from the host surface's aspect ratio at
/// a fixed logical height.
pub fn derive_logical_width(surface_width: u32, surface_height: u32, logical_height: u32) -> u32 {
    let aspect = f64::from(surface_width) / f64::from(surface_height);
    (f64::from(logical_height) * aspect).round() as u32
}
