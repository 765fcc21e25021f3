use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open camera {index}")]
    Open {
        index: u32,
        #[source]
        source: nokhwa::NokhwaError,
    },

    #[error("failed to open camera stream")]
    Stream(#[source] nokhwa::NokhwaError),

    #[error("failed to read frame")]
    Read(#[source] nokhwa::NokhwaError),

    #[error("failed to decode frame")]
    Decode(#[source] nokhwa::NokhwaError),

    #[error("camera returned an empty frame")]
    EmptyFrame,
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("failed to download model {file} from {repo}")]
    Download {
        repo: String,
        file: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    #[error("failed to load model from {1:?}")]
    LoadModel(#[source] candle_core::Error, PathBuf),

    #[error("model graph missing")]
    MissingGraph,

    #[error("model has no {0} tensor")]
    MissingTensor(&'static str),

    #[error("failed to prepare input tensor")]
    Tensor(#[source] candle_core::Error),

    #[error("failed to run model")]
    Eval(#[source] candle_core::Error),

    #[error("model output missing: {0}")]
    MissingOutput(String),

    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot resolve the auto-start directory: {0} is not set")]
    MissingEnv(&'static str),

    #[error("failed to locate the current executable")]
    CurrentExe(#[source] std::io::Error),

    #[error("failed to create {1:?}")]
    CreateDir(#[source] std::io::Error, PathBuf),

    #[error("failed to write {1:?}")]
    Write(#[source] std::io::Error, PathBuf),

    #[error("failed to remove {1:?}")]
    Remove(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("camera unavailable after {attempts} consecutive attempts")]
    CameraLost {
        attempts: u32,
        #[source]
        source: CaptureError,
    },
}
