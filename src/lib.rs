//! Retained-mode 2D overlay UI (HUDs, menus) painted into an off-screen
//! premultiplied RGBA canvas for projection onto a quad in a host 3D scene.
//!
//! Nodes are positioned by per-axis anchor/stretch rules against a bounds
//! parent, repaints are gated by a single dirty flag, and pointer input is
//! dispatched with a queue-then-fire hit test.

#![forbid(unsafe_code)]

pub mod assets;
pub mod bounds;
pub mod error;
pub mod geom;
pub mod hit;
pub mod host;
pub mod model;
mod paint;
pub mod pixmap;
pub mod stage;
pub mod text;

pub use assets::{
    AssetData, AssetProvider, BitmapFontData, FontData, FrameRect, ImageData, MemoryAssets,
    SheetData,
};
pub use bounds::resolve_bounds;
pub use error::{ScrimError, ScrimResult};
pub use geom::{Rect, Rgba8, Vec2};
pub use hit::{ListenerId, PointerDevice, PointerEvent};
pub use host::{HostScene, NullHost};
pub use model::{Anchor, Axis2, Edges, Node, NodeId, NodeKind, Offset, PercentBasis, TextAlign};
pub use pixmap::Pixmap;
pub use stage::{NodeMut, Stage, StageConfig};
