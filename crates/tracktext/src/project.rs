use tt_tracking::TrackerContext;

/// Where the video came from, carried alongside the tracker state so a
/// reopened project can locate and validate its footage.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SourceRef {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
}

/// A saved project: the tracker arrays, the text array and the source
/// reference.
///
/// Derived caches (per-frame homographies, the current homography) are not
/// part of the document; they are rebuilt by tracking. Frame-indexed maps
/// are stored as `(frame, value)` pairs whose on-disk order is irrelevant.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ProjectDoc {
    pub source: SourceRef,
    pub context: TrackerContext,
}

#[derive(thiserror::Error, Debug)]
#[error("project document: {0}")]
pub struct ProjectError(#[from] serde_json::Error);

impl ProjectDoc {
    /// Snapshot of a live session.
    pub fn capture(ctx: &TrackerContext, source: SourceRef) -> Self {
        Self {
            source,
            context: ctx.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Hands the state back to a live session.
    pub fn into_context(self) -> (TrackerContext, SourceRef) {
        (self.context, self.source)
    }
}
