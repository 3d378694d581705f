use thiserror::Error;

pub const MSG_NO_VIDEO: &str = "Selecione um vídeo";
pub const MSG_NO_JOB: &str = "Nenhum conjunto de frames para avaliar";
pub const MSG_INVALID_INTERVAL: &str = "Intervalo entre frames deve ser de pelo menos 1 segundo";
pub const MSG_UPLOAD_FAILED: &str = "Falha ao processar vídeo";
pub const MSG_STATUS_FAILED: &str = "Falha ao verificar status";
pub const MSG_EVALUATION_FAILED: &str = "Falha ao avaliar imagens";
pub const MSG_TIMEOUT: &str = "Timeout: A avaliação está demorando muito. Tente novamente.";

/// Failure talking to the remote upload/evaluation service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {status}")]
    Status { status: u16, message: Option<String> },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Errors surfaced by the evaluation controller. `Display` is the user message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("{}", MSG_NO_JOB)]
    MissingJobId,
    #[error("{0}")]
    Enqueue(String),
}

/// Errors surfaced by the upload controller. `Display` is the user message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("{}", MSG_NO_VIDEO)]
    MissingVideo,
    #[error("{}", MSG_INVALID_INTERVAL)]
    InvalidInterval,
    #[error("{0}")]
    Failed(String),
}
