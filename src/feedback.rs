use crate::heuristics::{DistanceStatus, ElbowStatus, Gaze};
use crate::posture::Assessment;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Icon {
    Ok,
    Warning,
    Eye,
    Neutral,
    Camera,
    Error,
    Info,
}

impl Icon {
    pub fn as_str(self) -> &'static str {
        match self {
            Icon::Ok => "✅",
            Icon::Warning => "⚠️",
            Icon::Eye => "👁️",
            Icon::Neutral => "⚪",
            Icon::Camera => "📷",
            Icon::Error => "❌",
            Icon::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLine {
    pub icon: Icon,
    pub text: String,
}

impl FeedbackLine {
    pub fn new(icon: Icon, text: impl Into<String>) -> Self {
        Self {
            icon,
            text: text.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.icon, Icon::Warning | Icon::Error)
    }
}

impl fmt::Display for FeedbackLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon.as_str(), self.text)
    }
}

/// What the popup currently shows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub lines: Vec<FeedbackLine>,
}

impl Feedback {
    pub fn single(icon: Icon, text: impl Into<String>) -> Self {
        Self {
            lines: vec![FeedbackLine::new(icon, text)],
        }
    }

    pub fn initializing() -> Self {
        Self::single(Icon::Info, "Initializing…")
    }

    /// Nobody in front of the camera.
    pub fn neutral() -> Self {
        Self::single(Icon::Neutral, "Move into frame")
    }

    pub fn camera_retrying() -> Self {
        Self::single(Icon::Camera, "Camera unavailable, retrying…")
    }

    pub fn camera_lost() -> Self {
        Self::single(Icon::Error, "Camera unavailable")
    }

    pub fn model_unavailable() -> Self {
        Self::single(Icon::Error, "Pose model unavailable, see log")
    }

    /// The worker died unexpectedly.
    pub fn internal_error() -> Self {
        Self::single(Icon::Warning, "Internal error, see log")
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }

    pub fn has_warning(&self) -> bool {
        self.lines.iter().any(FeedbackLine::is_warning)
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

pub fn elbow_line(status: ElbowStatus) -> FeedbackLine {
    match status {
        ElbowStatus::Ok(deg) => FeedbackLine::new(Icon::Ok, format!("Elbow angle OK ({deg:.0}°)")),
        ElbowStatus::Adjust(deg) => {
            FeedbackLine::new(Icon::Warning, format!("Adjust your arm ({deg:.0}°)"))
        }
    }
}

pub fn distance_line(status: DistanceStatus) -> FeedbackLine {
    match status {
        DistanceStatus::Ok(cm) => FeedbackLine::new(Icon::Ok, format!("Distance OK ({cm:.0} cm)")),
        DistanceStatus::TooClose(cm) => {
            FeedbackLine::new(Icon::Warning, format!("Too close, move back ({cm:.0} cm)"))
        }
        DistanceStatus::TooFar(cm) => {
            FeedbackLine::new(Icon::Warning, format!("Too far, move closer ({cm:.0} cm)"))
        }
        DistanceStatus::Recenter => FeedbackLine::new(Icon::Warning, "Re-center for distance"),
    }
}

pub fn gaze_line(gaze: Gaze) -> FeedbackLine {
    let side = match gaze {
        Gaze::Left => "left",
        Gaze::Center => "center",
        Gaze::Right => "right",
    };
    FeedbackLine::new(Icon::Eye, format!("Looking {side}"))
}

/// Each heuristic maps to its own line; indeterminate ones are left out.
pub fn present(assessment: &Assessment) -> Feedback {
    match assessment {
        Assessment::NoPerson => Feedback::neutral(),
        Assessment::Person { elbow, distance, gaze } => {
            let lines: Vec<FeedbackLine> = elbow
                .map(elbow_line)
                .into_iter()
                .chain(distance.map(distance_line))
                .chain(gaze.map(gaze_line))
                .collect();
            if lines.is_empty() {
                Feedback::neutral()
            } else {
                Feedback { lines }
            }
        }
    }
}
