use serde::{Deserialize, Serialize};

/// One upload/evaluation cycle as returned by `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub frames: Vec<String>,
}

/// Video payload for `POST /upload`.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub interval_sec: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnqueueRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "maxFrames")]
    pub max_frames: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl StatusState {
    pub fn is_resolved(self) -> bool {
        matches!(self, StatusState::Completed | StatusState::Failed)
    }
}

/// Body of `GET /evaluate/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStatus {
    pub status: StatusState,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}
