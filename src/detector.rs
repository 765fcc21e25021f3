use crate::config::{app_dir, Config};
use crate::error::DetectError;
use crate::landmark::{Landmark, LandmarkKind, LandmarkSet, NUM_LANDMARKS};
use candle_core::{DType, Device, Tensor};
use candle_onnx::{onnx, read_file, simple_eval};
use hf_hub::api::sync::Api;
use image::{imageops::FilterType, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Box (4) + person score (1) + 17 keypoints × (x, y, visibility).
const POSE_ROWS: usize = 5 + NUM_LANDMARKS * 3;
const INPUT_SIZE: u32 = 640;

/// Pretrained pose model. Blocking; may be slow.
pub trait PoseDetector {
    /// Keypoints of the most confident person, or `None` when nobody is in
    /// the frame.
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectError>;
}

#[derive(Debug, Copy, Clone)]
pub struct DetectionThresholds {
    pub person: f32,
    pub keypoint: f32,
}

pub struct OnnxPoseDetector {
    model: onnx::ModelProto,
    input_name: String,
    output_name: String,
    device: Device,
    thresholds: DetectionThresholds,
}

impl OnnxPoseDetector {
    pub fn load(cfg: &Config) -> Result<Self, DetectError> {
        let path = resolve_model_path(cfg)?;
        let mut model = read_file(&path).map_err(|e| DetectError::LoadModel(e, path.clone()))?;
        patch_maxpool_padding(&mut model);
        let graph = model.graph.as_ref().ok_or(DetectError::MissingGraph)?;
        let input_name = graph
            .input
            .first()
            .ok_or(DetectError::MissingTensor("input"))?
            .name
            .clone();
        let output_name = graph
            .output
            .first()
            .ok_or(DetectError::MissingTensor("output"))?
            .name
            .clone();
        info!(
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "pose model loaded"
        );
        Ok(Self {
            model,
            input_name,
            output_name,
            device: Device::Cpu,
            thresholds: DetectionThresholds {
                person: cfg.detection_threshold,
                keypoint: cfg.keypoint_threshold,
            },
        })
    }

    fn input_tensor(&self, frame: &RgbImage) -> Result<Tensor, DetectError> {
        let resized = image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let side = INPUT_SIZE as usize;
        Tensor::from_vec(resized.into_raw(), (side, side, 3), &self.device)
            .and_then(|t| t.permute((2, 0, 1)))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.affine(1.0 / 255.0, 0.0))
            .and_then(|t| t.unsqueeze(0))
            .map_err(DetectError::Tensor)
    }
}

impl PoseDetector for OnnxPoseDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.clone(), self.input_tensor(frame)?);
        let mut outputs = simple_eval(&self.model, inputs).map_err(DetectError::Eval)?;
        let output = outputs
            .remove(&self.output_name)
            .ok_or_else(|| DetectError::MissingOutput(self.output_name.clone()))?;
        let dims = output.dims().to_vec();
        if dims.len() != 3 || dims[1] != POSE_ROWS {
            return Err(DetectError::OutputShape(dims));
        }
        let rows = output
            .squeeze(0)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(DetectError::Tensor)?;
        let pose = decode_pose(&rows, INPUT_SIZE, frame.dimensions(), self.thresholds)?;
        debug!(found = pose.is_some(), "pose inference done");
        Ok(pose)
    }
}

/// Picks the highest scoring candidate from a YOLOv8-pose output laid out
/// as `[row][candidate]` and converts its keypoints to normalized
/// coordinates of the captured frame.
pub fn decode_pose(
    rows: &[Vec<f32>],
    input_size: u32,
    frame_size: (u32, u32),
    thresholds: DetectionThresholds,
) -> Result<Option<LandmarkSet>, DetectError> {
    if rows.len() != POSE_ROWS {
        return Err(DetectError::OutputShape(vec![rows.len()]));
    }
    let best = rows[4]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .filter(|&(_, &score)| score >= thresholds.person);
    let Some((candidate, _)) = best else {
        return Ok(None);
    };

    let scale = input_size as f32;
    let mut set = LandmarkSet::new(frame_size.0, frame_size.1);
    for kind in LandmarkKind::ALL {
        let base = 5 + kind.idx() * 3;
        let score = rows[base + 2][candidate];
        if score < thresholds.keypoint {
            continue;
        }
        let x = (rows[base][candidate] / scale).clamp(0.0, 1.0);
        let y = (rows[base + 1][candidate] / scale).clamp(0.0, 1.0);
        set.insert(kind, Landmark::new(x, y, score));
    }
    Ok(Some(set))
}

/// Configured path, then the copy bundled under `assets/` next to the
/// executable, then the Hugging Face cache.
pub fn resolve_model_path(cfg: &Config) -> Result<PathBuf, DetectError> {
    if cfg.model_path.exists() {
        return Ok(cfg.model_path.clone());
    }
    if let Some(name) = cfg.model_path.file_name() {
        let bundled = app_dir().join("assets").join(name);
        if bundled.exists() {
            return Ok(bundled);
        }
    }
    debug!(repo = %cfg.model_repo, file = %cfg.model_repo_file, "fetching pose model");
    Api::new()
        .and_then(|api| api.model(cfg.model_repo.clone()).get(&cfg.model_repo_file))
        .map_err(|source| DetectError::Download {
            repo: cfg.model_repo.clone(),
            file: cfg.model_repo_file.clone(),
            source,
        })
}

pub fn model_is_local(cfg: &Config) -> bool {
    cfg.model_path.exists()
        || cfg
            .model_path
            .file_name()
            .map(|name| app_dir().join("assets").join(name))
            .as_deref()
            .is_some_and(Path::exists)
}

/// candle's MaxPool ignores `pads`; move explicit padding into a Pad node.
fn patch_maxpool_padding(model: &mut onnx::ModelProto) {
    let Some(graph) = model.graph.as_mut() else {
        return;
    };
    let mut new_nodes = Vec::with_capacity(graph.node.len());
    for mut node in std::mem::take(&mut graph.node) {
        if node.op_type == "MaxPool" {
            let pads = node
                .attribute
                .iter_mut()
                .find(|attr| attr.name == "pads")
                .filter(|attr| attr.ints.len() == 4 && attr.ints.iter().any(|&v| v != 0))
                .map(|attr| std::mem::replace(&mut attr.ints, vec![0; 4]));
            if let Some(pads) = pads {
                let pad_init_name = format!("{}_pads", node.name);
                let full_pads = vec![0, 0, pads[0], pads[1], 0, 0, pads[2], pads[3]];
                graph.initializer.push(onnx::TensorProto {
                    name: pad_init_name.clone(),
                    dims: vec![full_pads.len() as i64],
                    data_type: onnx::tensor_proto::DataType::Int64 as i32,
                    int64_data: full_pads,
                    ..Default::default()
                });

                let pad_output = format!("{}_pad_out", node.name);
                let mut pad_node = onnx::NodeProto {
                    input: vec![node.input[0].clone(), pad_init_name],
                    output: vec![pad_output.clone()],
                    name: format!("{}_pad", node.name),
                    op_type: "Pad".to_string(),
                    ..Default::default()
                };
                pad_node.attribute.push(onnx::AttributeProto {
                    name: "mode".to_string(),
                    r#type: onnx::attribute_proto::AttributeType::String as i32,
                    s: b"reflect".to_vec(),
                    ..Default::default()
                });
                new_nodes.push(pad_node);
                node.input[0] = pad_output;
            }
        }
        new_nodes.push(node);
    }
    graph.node = new_nodes;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with(candidates: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0; candidates]; POSE_ROWS]
    }

    const THRESHOLDS: DetectionThresholds = DetectionThresholds {
        person: 0.5,
        keypoint: 0.5,
    };

    #[test]
    fn no_candidate_above_threshold_is_no_person() {
        let mut rows = rows_with(3);
        rows[4] = vec![0.1, 0.3, 0.2];
        let pose = decode_pose(&rows, 640, (640, 480), THRESHOLDS).unwrap();
        assert!(pose.is_none());
    }

    #[test]
    fn best_candidate_keypoints_are_normalized() {
        let mut rows = rows_with(2);
        rows[4] = vec![0.6, 0.9];
        let nose = 5 + LandmarkKind::Nose.idx() * 3;
        rows[nose] = vec![0.0, 320.0];
        rows[nose + 1] = vec![0.0, 160.0];
        rows[nose + 2] = vec![0.0, 0.8];
        let wrist = 5 + LandmarkKind::LeftWrist.idx() * 3;
        rows[wrist + 2] = vec![0.9, 0.2];

        let pose = decode_pose(&rows, 640, (1280, 720), THRESHOLDS)
            .unwrap()
            .unwrap();
        let n = pose.get(LandmarkKind::Nose).unwrap();
        assert_eq!((n.x, n.y), (0.5, 0.25));
        assert_eq!(pose.pixel(LandmarkKind::Nose), Some((640.0, 180.0)));
        assert!(pose.get(LandmarkKind::LeftWrist).is_none());
    }

    #[test]
    fn person_with_only_weak_keypoints_has_no_landmarks() {
        let mut rows = rows_with(1);
        rows[4] = vec![0.9];
        for kind in LandmarkKind::ALL {
            rows[5 + kind.idx() * 3 + 2] = vec![0.3];
        }
        let pose = decode_pose(&rows, 640, (640, 480), THRESHOLDS)
            .unwrap()
            .unwrap();
        assert!(pose.is_empty());
    }

    #[test]
    fn wrong_row_count_is_rejected() {
        let rows = vec![vec![0.0; 4]; 6];
        assert!(matches!(
            decode_pose(&rows, 640, (640, 480), THRESHOLDS),
            Err(DetectError::OutputShape(_))
        ));
    }
}
