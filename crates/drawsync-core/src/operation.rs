//! Drawing operations and their wire encoding.
//!
//! Every operation carries its own style so that a peer can replay it without
//! knowing anything about the sender's tool state.

use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Color painted by the eraser preset (the canvas backdrop color).
pub const ERASER_COLOR: &str = "#2B353E";

/// Color painted by the translucent "smart" eraser preset.
pub const SMART_ERASER_COLOR: &str = "rgba(255, 255, 255, 0.5)";

/// Errors produced when a wire event cannot be turned into an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Non-finite value in field: {0}")]
    NonFinite(&'static str),
    #[error("Invalid line width: {0}")]
    InvalidLineWidth(f64),
    #[error("Unknown shape kind: {0}")]
    UnknownShape(String),
}

/// Dash pattern of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
}

impl DashStyle {
    /// Name used in the `brushType` wire field.
    pub fn brush_type(self) -> &'static str {
        match self {
            DashStyle::Solid => "normal",
            DashStyle::Dotted => "dotted",
            DashStyle::Dashed => "dashed",
        }
    }

    /// Parse a `brushType` value. Anything unrecognized strokes solid.
    pub fn from_brush_type(value: &str) -> Self {
        match value {
            "dotted" => DashStyle::Dotted,
            "dashed" => DashStyle::Dashed,
            _ => DashStyle::Solid,
        }
    }

    /// Alternating on/off lengths in surface units (empty = continuous).
    pub fn pattern(self) -> &'static [f32] {
        match self {
            DashStyle::Solid => &[],
            DashStyle::Dotted => &[5.0, 15.0],
            DashStyle::Dashed => &[20.0, 10.0],
        }
    }
}

/// Style properties embedded in every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// CSS color string (`black`, `#2B353E`, `rgba(...)`).
    pub color: String,
    /// Stroke width in surface units. Always positive.
    pub line_width: f64,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f64,
    /// Dash pattern.
    #[serde(default)]
    pub dash: DashStyle,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            line_width: 2.0,
            opacity: 1.0,
            dash: DashStyle::Solid,
        }
    }
}

impl StrokeStyle {
    /// Create a solid style.
    pub fn new(color: impl Into<String>, line_width: f64, opacity: f64) -> Self {
        Self::default()
            .with_color(color)
            .with_line_width(line_width)
            .with_opacity(opacity)
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the stroke width. Non-positive or non-finite widths are ignored.
    pub fn with_line_width(mut self, line_width: f64) -> Self {
        if line_width.is_finite() && line_width > 0.0 {
            self.line_width = line_width;
        }
        self
    }

    /// Set the opacity, clamped to `[0, 1]`.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        self
    }

    pub fn with_dash(mut self, dash: DashStyle) -> Self {
        self.dash = dash;
        self
    }

    /// Eraser preset: paints the backdrop color with a continuous stroke.
    pub fn eraser(&self) -> Self {
        self.clone().with_color(ERASER_COLOR).with_dash(DashStyle::Solid)
    }

    /// Translucent eraser preset.
    pub fn smart_eraser(&self) -> Self {
        self.clone()
            .with_color(SMART_ERASER_COLOR)
            .with_dash(DashStyle::Solid)
    }
}

/// Kind of single-shot shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
}

impl ShapeKind {
    /// Name used in the `shape` wire field.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Line => "line",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rectangle" => Some(ShapeKind::Rectangle),
            "circle" => Some(ShapeKind::Circle),
            "line" => Some(ShapeKind::Line),
            _ => None,
        }
    }
}

/// One atomic, self-describing drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOperation {
    /// Freehand stroke piece between two consecutive pointer samples.
    Segment {
        from: Point,
        to: Point,
        style: StrokeStyle,
    },
    /// Shape spanning the drag start and end.
    Shape {
        shape: ShapeKind,
        from: Point,
        to: Point,
        style: StrokeStyle,
    },
}

impl DrawOperation {
    pub fn segment(from: Point, to: Point, style: StrokeStyle) -> Self {
        DrawOperation::Segment { from, to, style }
    }

    pub fn shape(shape: ShapeKind, from: Point, to: Point, style: StrokeStyle) -> Self {
        DrawOperation::Shape {
            shape,
            from,
            to,
            style,
        }
    }

    pub fn style(&self) -> &StrokeStyle {
        match self {
            DrawOperation::Segment { style, .. } | DrawOperation::Shape { style, .. } => style,
        }
    }

    /// Start and end points.
    pub fn endpoints(&self) -> (Point, Point) {
        match self {
            DrawOperation::Segment { from, to, .. } | DrawOperation::Shape { from, to, .. } => {
                (*from, *to)
            }
        }
    }

    pub fn is_segment(&self) -> bool {
        matches!(self, DrawOperation::Segment { .. })
    }
}

/// Flat pub/sub payload: `{x0, y0, x1, y1, color, lineWidth, opacity, brushType?, shape?}`.
///
/// All fields are optional at this layer so that a malformed event from a
/// peer decodes and is rejected by validation instead of failing the whole
/// frame. Numeric fields also accept numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingEvent {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub x0: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub y0: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brush_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Text(String),
        #[allow(dead_code)]
        Other(serde_json::Value),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(n)) => Some(n),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, OperationError> {
    let value = value.ok_or(OperationError::MissingField(field))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OperationError::NonFinite(field))
    }
}

impl From<&DrawOperation> for DrawingEvent {
    fn from(op: &DrawOperation) -> Self {
        let (from, to) = op.endpoints();
        let style = op.style();
        let shape = match op {
            DrawOperation::Segment { .. } => None,
            DrawOperation::Shape { shape, .. } => Some(shape.as_str().to_string()),
        };
        Self {
            x0: Some(from.x),
            y0: Some(from.y),
            x1: Some(to.x),
            y1: Some(to.y),
            color: Some(style.color.clone()),
            line_width: Some(style.line_width),
            opacity: Some(style.opacity),
            brush_type: Some(style.dash.brush_type().to_string()),
            shape,
        }
    }
}

impl TryFrom<DrawingEvent> for DrawOperation {
    type Error = OperationError;

    fn try_from(event: DrawingEvent) -> Result<Self, Self::Error> {
        let from = Point::new(required(event.x0, "x0")?, required(event.y0, "y0")?);
        let to = Point::new(required(event.x1, "x1")?, required(event.y1, "y1")?);
        let color = event.color.ok_or(OperationError::MissingField("color"))?;
        let line_width = required(event.line_width, "lineWidth")?;
        if line_width <= 0.0 {
            return Err(OperationError::InvalidLineWidth(line_width));
        }
        let opacity = required(event.opacity, "opacity")?.clamp(0.0, 1.0);
        let dash = event
            .brush_type
            .as_deref()
            .map(DashStyle::from_brush_type)
            .unwrap_or_default();

        let style = StrokeStyle {
            color,
            line_width,
            opacity,
            dash,
        };

        match event.shape {
            None => Ok(DrawOperation::segment(from, to, style)),
            Some(name) => match ShapeKind::parse(&name) {
                Some(kind) => Ok(DrawOperation::shape(kind, from, to, style)),
                None => Err(OperationError::UnknownShape(name)),
            },
        }
    }
}
