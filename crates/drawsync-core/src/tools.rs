//! Tool selection and stroke projection.
//!
//! The projector turns a pointer drag into discrete operations. It works in
//! surface coordinates only; callers correct for zoom and pan beforehand.

use crate::operation::{DrawOperation, ShapeKind, StrokeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// The tool driving the current drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTool {
    /// Continuous stroke: one segment per pointer sample.
    #[default]
    Freehand,
    /// Single-shot shape from drag start to drag end.
    Shape(ShapeKind),
}

impl ActiveTool {
    pub fn is_freehand(self) -> bool {
        matches!(self, ActiveTool::Freehand)
    }

    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ActiveTool::Freehand => None,
            ActiveTool::Shape(kind) => Some(kind),
        }
    }

    /// Toolbar name (`brush`, `rectangle`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ActiveTool::Freehand => "brush",
            ActiveTool::Shape(kind) => kind.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brush" | "freehand" | "eraser" => Some(ActiveTool::Freehand),
            other => ShapeKind::parse(other).map(ActiveTool::Shape),
        }
    }
}

/// State of a projection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum ProjectorState {
    /// No drag in progress.
    #[default]
    Idle,
    /// Drag in progress.
    Active {
        /// Where the drag started.
        anchor: Point,
        /// Last sampled point (start of the next segment).
        last: Point,
    },
}

/// Converts pointer drags into drawing operations.
#[derive(Debug, Clone, Default)]
pub struct StrokeProjector {
    state: ProjectorState,
}

impl StrokeProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the anchor of a new drag, discarding any unfinished one.
    pub fn begin(&mut self, point: Point) {
        self.state = ProjectorState::Active {
            anchor: point,
            last: point,
        };
    }

    /// Emit the segment from the previous sample to `point` and advance.
    ///
    /// Only freehand tools produce segments; shape tools and idle projectors
    /// return `None`.
    pub fn extend(
        &mut self,
        tool: ActiveTool,
        style: &StrokeStyle,
        point: Point,
    ) -> Option<DrawOperation> {
        if !tool.is_freehand() {
            return None;
        }
        match &mut self.state {
            ProjectorState::Active { last, .. } => {
                let from = std::mem::replace(last, point);
                Some(DrawOperation::segment(from, point, style.clone()))
            }
            ProjectorState::Idle => None,
        }
    }

    /// Finish the drag.
    ///
    /// Shape tools return exactly one shape from the anchor to `point`.
    /// Freehand tools return `None`: their segments were emitted by
    /// [`extend`](Self::extend).
    pub fn end(
        &mut self,
        tool: ActiveTool,
        style: &StrokeStyle,
        point: Point,
    ) -> Option<DrawOperation> {
        let state = std::mem::take(&mut self.state);
        match (state, tool) {
            (ProjectorState::Active { anchor, .. }, ActiveTool::Shape(kind)) => {
                Some(DrawOperation::shape(kind, anchor, point, style.clone()))
            }
            _ => None,
        }
    }

    /// Abandon the drag without emitting anything.
    pub fn cancel(&mut self) {
        self.state = ProjectorState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ProjectorState::Active { .. })
    }

    /// Anchor of the drag in progress.
    pub fn anchor(&self) -> Option<Point> {
        match self.state {
            ProjectorState::Active { anchor, .. } => Some(anchor),
            ProjectorState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freehand_emits_one_segment_per_sample() {
        let style = StrokeStyle::default();
        let mut projector = StrokeProjector::new();
        projector.begin(Point::new(0.0, 0.0));

        let first = projector
            .extend(ActiveTool::Freehand, &style, Point::new(5.0, 0.0))
            .unwrap();
        let second = projector
            .extend(ActiveTool::Freehand, &style, Point::new(10.0, 0.0))
            .unwrap();

        assert_eq!(first.endpoints(), (Point::new(0.0, 0.0), Point::new(5.0, 0.0)));
        assert_eq!(second.endpoints(), (Point::new(5.0, 0.0), Point::new(10.0, 0.0)));
        assert!(projector.end(ActiveTool::Freehand, &style, Point::new(10.0, 0.0)).is_none());
        assert!(!projector.is_active());
    }

    #[test]
    fn test_shape_spans_anchor_to_end() {
        let style = StrokeStyle::default();
        let tool = ActiveTool::Shape(ShapeKind::Circle);
        let mut projector = StrokeProjector::new();
        projector.begin(Point::new(3.0, 4.0));

        assert!(projector.extend(tool, &style, Point::new(8.0, 8.0)).is_none());
        let op = projector.end(tool, &style, Point::new(6.0, 8.0)).unwrap();

        match op {
            DrawOperation::Shape { shape, from, to, .. } => {
                assert_eq!(shape, ShapeKind::Circle);
                assert_eq!(from, Point::new(3.0, 4.0));
                assert_eq!(to, Point::new(6.0, 8.0));
            }
            other => panic!("expected shape, got {:?}", other),
        }
    }

    #[test]
    fn test_idle_projector_emits_nothing() {
        let style = StrokeStyle::default();
        let mut projector = StrokeProjector::new();

        assert!(projector.extend(ActiveTool::Freehand, &style, Point::new(1.0, 1.0)).is_none());
        assert!(projector
            .end(ActiveTool::Shape(ShapeKind::Line), &style, Point::new(1.0, 1.0))
            .is_none());
    }

    #[test]
    fn test_cancel_drops_anchor() {
        let style = StrokeStyle::default();
        let tool = ActiveTool::Shape(ShapeKind::Rectangle);
        let mut projector = StrokeProjector::new();
        projector.begin(Point::new(0.0, 0.0));
        assert_eq!(projector.anchor(), Some(Point::new(0.0, 0.0)));

        projector.cancel();
        assert!(projector.end(tool, &style, Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_operations_carry_style() {
        let style = StrokeStyle::new("#ff0000", 6.0, 0.25);
        let mut projector = StrokeProjector::new();
        projector.begin(Point::ZERO);
        let op = projector
            .extend(ActiveTool::Freehand, &style, Point::new(1.0, 1.0))
            .unwrap();
        assert_eq!(op.style(), &style);
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(ActiveTool::from_name("brush"), Some(ActiveTool::Freehand));
        assert_eq!(
            ActiveTool::from_name("circle"),
            Some(ActiveTool::Shape(ShapeKind::Circle))
        );
        assert_eq!(ActiveTool::from_name("lasso"), None);
        assert_eq!(ActiveTool::Shape(ShapeKind::Line).name(), "line");
    }
}
