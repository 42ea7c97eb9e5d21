use crate::{
    error::{ScrimError, ScrimResult},
    geom::{Rgba8, Vec2},
};

/// Stable handle into the stage's node table. Paint-order reshuffling
/// (`move_to_front`) never invalidates it, and bounds-parent references hold
/// ids rather than owning references so a parent cycle cannot leak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-axis pair of values (anchor rules, stretch flags).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Axis2<T> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> Axis2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn splat(v: T) -> Self {
        Self { x: v, y: v }
    }
}

/// Per-axis anchor rule. In the domain these are called left/top (start),
/// right/bottom (end) and center. Meaningless for a stretched axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    #[default]
    Start,
    Center,
    End,
}

/// One edge offset: an absolute pixel value or a percentage of the parent's
/// reference dimension. Serialized as a bare number or a `"<number>%"` string.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Offset {
    Px(f32),
    Percent(f32),
}

impl Default for Offset {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl Offset {
    pub const ZERO: Self = Self::Px(0.0);

    /// Parse the percentage string form. Anything other than `<number>%`
    /// is a usage error.
    pub fn parse(s: &str) -> ScrimResult<Self> {
        let body = s.strip_suffix('%').ok_or_else(|| {
            ScrimError::usage(format!("malformed offset '{s}': expected \"<number>%\""))
        })?;
        let value: f32 = body.parse().map_err(|_| {
            ScrimError::usage(format!("malformed offset '{s}': '{body}' is not a number"))
        })?;
        Ok(Self::Percent(value))
    }

    /// Resolve to pixels against the reference dimension. Which dimension
    /// that is belongs to the caller's [`PercentBasis`] policy.
    pub fn resolve(self, reference_px: f32) -> f32 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => reference_px * p / 100.0,
        }
    }
}

impl std::str::FromStr for Offset {
    type Err = ScrimError;

    fn from_str(s: &str) -> ScrimResult<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for Offset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Px(v) => serializer.serialize_f32(*v),
            Self::Percent(p) => serializer.serialize_str(&format!("{p}%")),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Offset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f32),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Self::Px(v)),
            Repr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// The four edge offsets consumed by stretched axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edges {
    pub left: Offset,
    pub top: Offset,
    pub right: Offset,
    pub bottom: Offset,
}

impl Edges {
    pub fn all(v: Offset) -> Self {
        Self { left: v, top: v, right: v, bottom: v }
    }
}

/// Which dimension percentage offsets resolve against.
///
/// Historically every edge, vertical ones included, resolved against the
/// parent's *width*. That quirk stays the default so existing layouts keep
/// their meaning; `PerAxis` opts into resolving top/bottom against parent
/// height instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentBasis {
    #[default]
    ParentWidth,
    PerAxis,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Kind-specific payload. A closed union: every drawable the stage knows how
/// to paint is one of these, dispatched in the painter rather than through
/// per-node callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Fill {
        color: Rgba8,
    },
    Sprite {
        asset: String,
        /// Sheet frame name; `None` draws the whole image.
        frame: Option<String>,
        smoothing: bool,
        scale: f32,
    },
    Text {
        content: String,
        font: String,
        size_px: f32,
        color: Rgba8,
        align: TextAlign,
    },
    BitmapText {
        content: String,
        font_asset: String,
        scale: f32,
        align: TextAlign,
    },
}

/// One display element. Fields are read through accessors; mutation of
/// tracked fields goes through [`NodeMut`](crate::stage::NodeMut) so every
/// change is seen by the dirty flag.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) position: Vec2,
    /// Raw size. Ignored per-axis when that axis is stretched, but still the
    /// value pivot adjustment multiplies against.
    pub(crate) size: Vec2,
    /// Degrees, applied about the pivot point at draw time only. Never feeds
    /// bounds or hit-test math.
    pub(crate) rotation_deg: f32,
    pub(crate) alpha: f32,
    pub(crate) visible: bool,
    /// Fractions of own raw size, subtracted from the anchored position.
    pub(crate) pivot: Vec2,
    pub(crate) anchor: Axis2<Anchor>,
    pub(crate) stretch: Axis2<bool>,
    pub(crate) offset: Edges,
    pub(crate) bounds_parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        let size = match kind {
            // Fills default to a 1x1 rect until sized; sprite and text
            // factories overwrite this with the natural/measured size.
            NodeKind::Fill { .. } => Vec2::splat(1.0),
            _ => Vec2::ZERO,
        };
        Self {
            position: Vec2::ZERO,
            size,
            rotation_deg: 0.0,
            alpha: 1.0,
            visible: true,
            pivot: Vec2::ZERO,
            anchor: Axis2::splat(Anchor::Start),
            stretch: Axis2::splat(false),
            offset: Edges::default(),
            bounds_parent: None,
            kind,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn anchor(&self) -> Axis2<Anchor> {
        self.anchor
    }

    pub fn stretch(&self) -> Axis2<bool> {
        self.stretch
    }

    pub fn offset(&self) -> Edges {
        self.offset
    }

    pub fn bounds_parent(&self) -> Option<NodeId> {
        self.bounds_parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_parses_percent_strings() {
        assert_eq!(Offset::parse("50%").unwrap(), Offset::Percent(50.0));
        assert_eq!(Offset::parse("-12.5%").unwrap(), Offset::Percent(-12.5));
    }

    #[test]
    fn offset_rejects_malformed_strings() {
        assert!(Offset::parse("50").is_err());
        assert!(Offset::parse("%").is_err());
        assert!(Offset::parse("half%").is_err());
        assert!(Offset::parse("50% ").is_err());
    }

    #[test]
    fn offset_resolves_against_reference() {
        assert_eq!(Offset::Px(32.0).resolve(1280.0), 32.0);
        assert_eq!(Offset::Percent(50.0).resolve(1280.0), 640.0);
    }

    #[test]
    fn edges_json_accepts_numbers_and_percent_strings() {
        let edges: Edges =
            serde_json::from_str(r#"{"left":16,"top":"10%","right":0,"bottom":"0%"}"#).unwrap();
        assert_eq!(edges.left, Offset::Px(16.0));
        assert_eq!(edges.top, Offset::Percent(10.0));
        assert_eq!(edges.bottom, Offset::Percent(0.0));
    }

    #[test]
    fn edges_json_rejects_malformed_percent() {
        let r: Result<Edges, _> =
            serde_json::from_str(r#"{"left":"wide%","top":0,"right":0,"bottom":0}"#);
        assert!(r.is_err());
    }

    #[test]
    fn offset_serializes_back_to_wire_form() {
        let s = serde_json::to_string(&Offset::Percent(25.0)).unwrap();
        assert_eq!(s, "\"25%\"");
    }

    #[test]
    fn fill_nodes_default_to_unit_size() {
        let n = Node::new(NodeKind::Fill { color: Rgba8::WHITE });
        assert_eq!(n.size(), Vec2::splat(1.0));
        assert!(n.visible());
        assert_eq!(n.alpha(), 1.0);
    }
}
