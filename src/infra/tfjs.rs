// ============================================================
// Layer 6 — TensorFlow.js Layers-Model Export
// ============================================================
// Writes the trained network in the layout tf.loadLayersModel()
// reads in the browser extension:
//
//   ad_detection_model/
//     model.json              ← topology + weights manifest
//     group1-shard1of1.bin    ← little-endian float32 weights
//
// model.json describes a Keras Sequential model with one Dense
// layer per network layer. The manifest lists, in order, the
// kernel then the bias of every layer:
//
//   dense/kernel    [6, 64]     dense/bias    [64]
//   dense_1/kernel  [64, 32]    dense_1/bias  [32]
//   ...
//
// Burn stores a Linear weight as [d_input, d_output], which is
// the Keras kernel layout, so values are written unchanged.
//
// Weights larger than 4 MiB are split across several shards,
// the converter's default shard size.
//
// The same module reads an export back: `read_topology` for the
// structural summary, `load_model` for a usable Burn model.

use anyhow::{anyhow, bail, ensure, Context, Result};
use burn::{module::Param, nn::Linear, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::{Activation, AdDetectorConfig, AdDetectorModel};

pub const MODEL_JSON: &str = "model.json";
pub const SHARD_BYTES: usize = 4 * 1024 * 1024;

const FORMAT: &str = "layers-model";
const DTYPE: &str = "float32";
const KERAS_VERSION: &str = "2.15.0";

// ─── model.json schema ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelJson {
    format:           String,
    generated_by:     String,
    #[serde(default)]
    converted_by:     Option<String>,
    model_topology:   ModelTopology,
    weights_manifest: Vec<WeightGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelTopology {
    keras_version: String,
    backend:       String,
    model_config:  SequentialSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    training_config: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SequentialSpec {
    class_name: String,
    config:     SequentialConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct SequentialConfig {
    name:   String,
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerSpec {
    class_name: String,
    config:     DenseSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct DenseSpec {
    name:      String,
    #[serde(default = "default_trainable")]
    trainable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    batch_input_shape: Option<Vec<Option<usize>>>,
    dtype:      String,
    units:      usize,
    activation: String,
    use_bias:   bool,
    #[serde(default)]
    kernel_initializer: Value,
    #[serde(default)]
    bias_initializer:   Value,
    #[serde(default)]
    kernel_regularizer: Value,
    #[serde(default)]
    bias_regularizer:   Value,
    #[serde(default)]
    activity_regularizer: Value,
    #[serde(default)]
    kernel_constraint:  Value,
    #[serde(default)]
    bias_constraint:    Value,
}

fn default_trainable() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct WeightGroup {
    paths:   Vec<String>,
    weights: Vec<WeightEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeightEntry {
    name:  String,
    shape: Vec<usize>,
    dtype: String,
}

// ─── Public summaries ─────────────────────────────────────────────────────────

/// One dense layer as described by an exported model.json.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub name:       String,
    pub input_dim:  usize,
    pub units:      usize,
    pub activation: Activation,
}

/// Structural description of an exported model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedTopology {
    pub layers: Vec<LayerSummary>,
}

impl ExportedTopology {
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.input_dim).unwrap_or(0)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.units).unwrap_or(0)
    }
}

/// What an export wrote and where.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub dir:          PathBuf,
    pub files:        Vec<PathBuf>,
    pub weight_bytes: usize,
}

// ─── Exporter ─────────────────────────────────────────────────────────────────

/// Writes a trained model as a TF.js layers-model directory.
pub struct TfjsExporter {
    dir:           PathBuf,
    learning_rate: Option<f64>,
}

impl TfjsExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), learning_rate: None }
    }

    /// Record the Adam/BCE training setup in model.json.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn export<B: Backend>(&self, model: &AdDetectorModel<B>) -> Result<ExportSummary> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create export directory '{}'", self.dir.display()))?;

        let mut layers  = Vec::new();
        let mut entries = Vec::new();
        let mut buffer: Vec<u8> = Vec::new();

        for (index, (linear, activation)) in model.layers().into_iter().enumerate() {
            let name = layer_name(index);
            let [d_input, units] = linear.weight.val().dims();

            let kernel = tensor_values(linear.weight.val())?;
            push_weight(&mut entries, &mut buffer, format!("{name}/kernel"), vec![d_input, units], &kernel);

            let use_bias = linear.bias.is_some();
            if let Some(bias) = &linear.bias {
                let bias = tensor_values(bias.val())?;
                push_weight(&mut entries, &mut buffer, format!("{name}/bias"), vec![units], &bias);
            }

            layers.push(LayerSpec {
                class_name: "Dense".to_string(),
                config:     dense_spec(name, index, d_input, units, activation, use_bias),
            });
        }

        let shards = shard_names(buffer.len());
        let mut files = Vec::with_capacity(shards.len() + 1);
        for (name, chunk) in shards.iter().zip(buffer.chunks(SHARD_BYTES)) {
            let path = self.dir.join(name);
            fs::write(&path, chunk)
                .with_context(|| format!("Cannot write weight shard '{}'", path.display()))?;
            files.push(path);
        }

        let model_json = ModelJson {
            format:       FORMAT.to_string(),
            generated_by: format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            converted_by: None,
            model_topology: ModelTopology {
                keras_version: KERAS_VERSION.to_string(),
                backend:       "tensorflow".to_string(),
                model_config:  SequentialSpec {
                    class_name: "Sequential".to_string(),
                    config:     SequentialConfig { name: "sequential".to_string(), layers },
                },
                training_config: self.learning_rate.map(training_config),
            },
            weights_manifest: vec![WeightGroup { paths: shards, weights: entries }],
        };

        let json_path = self.dir.join(MODEL_JSON);
        fs::write(&json_path, serde_json::to_string_pretty(&model_json)?)
            .with_context(|| format!("Cannot write '{}'", json_path.display()))?;
        files.insert(0, json_path);

        tracing::info!(
            "Exported {} layers ({} weight bytes) to '{}'",
            model_json.model_topology.model_config.config.layers.len(),
            buffer.len(),
            self.dir.display()
        );

        Ok(ExportSummary { dir: self.dir.clone(), files, weight_bytes: buffer.len() })
    }
}

/// Keras auto-naming: dense, dense_1, dense_2, ...
fn layer_name(index: usize) -> String {
    if index == 0 { "dense".to_string() } else { format!("dense_{index}") }
}

fn shard_names(total_bytes: usize) -> Vec<String> {
    let count = total_bytes.div_ceil(SHARD_BYTES).max(1);
    (1..=count).map(|i| format!("group1-shard{i}of{count}.bin")).collect()
}

fn dense_spec(
    name:       String,
    index:      usize,
    d_input:    usize,
    units:      usize,
    activation: Activation,
    use_bias:   bool,
) -> DenseSpec {
    DenseSpec {
        name,
        trainable: true,
        batch_input_shape: (index == 0).then(|| vec![None, Some(d_input)]),
        dtype: DTYPE.to_string(),
        units,
        activation: activation.as_str().to_string(),
        use_bias,
        kernel_initializer: json!({"class_name": "GlorotUniform", "config": {"seed": null}}),
        bias_initializer:   json!({"class_name": "Zeros", "config": {}}),
        kernel_regularizer:   Value::Null,
        bias_regularizer:     Value::Null,
        activity_regularizer: Value::Null,
        kernel_constraint:    Value::Null,
        bias_constraint:      Value::Null,
    }
}

fn training_config(learning_rate: f64) -> Value {
    json!({
        "loss": "binary_crossentropy",
        "metrics": ["accuracy"],
        "weighted_metrics": null,
        "loss_weights": null,
        "optimizer_config": {
            "class_name": "Adam",
            "config": {
                "name": "Adam",
                "learning_rate": learning_rate,
                "beta_1": 0.9,
                "beta_2": 0.999,
                "epsilon": 1e-7,
                "amsgrad": false
            }
        }
    })
}

fn push_weight(
    entries: &mut Vec<WeightEntry>,
    buffer:  &mut Vec<u8>,
    name:    String,
    shape:   Vec<usize>,
    values:  &[f32],
) {
    buffer.extend(values.iter().flat_map(|v| v.to_le_bytes()));
    entries.push(WeightEntry { name, shape, dtype: DTYPE.to_string() });
}

fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read weights: {e:?}"))
}

// ─── Reading an export back ───────────────────────────────────────────────────

fn read_model_json(dir: &Path) -> Result<ModelJson> {
    let path = dir.join(MODEL_JSON);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read '{}'. Has the model been exported?", path.display()))?;
    let model: ModelJson = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a layers-model description", path.display()))?;
    ensure!(
        model.format == FORMAT,
        "Unsupported model format '{}' in '{}'",
        model.format,
        path.display()
    );
    Ok(model)
}

fn summarise(model: &ModelJson) -> Result<ExportedTopology> {
    let specs = &model.model_topology.model_config.config.layers;
    ensure!(!specs.is_empty(), "Exported model has no layers");

    let mut layers = Vec::with_capacity(specs.len());
    let mut input_dim = specs[0]
        .config
        .batch_input_shape
        .as_ref()
        .and_then(|shape| shape.last().copied().flatten())
        .ok_or_else(|| anyhow!("First layer does not declare its input shape"))?;

    for spec in specs {
        ensure!(spec.class_name == "Dense", "Unsupported layer class '{}'", spec.class_name);
        let activation = Activation::parse(&spec.config.activation)
            .ok_or_else(|| anyhow!("Unsupported activation '{}'", spec.config.activation))?;
        layers.push(LayerSummary {
            name: spec.config.name.clone(),
            input_dim,
            units: spec.config.units,
            activation,
        });
        input_dim = spec.config.units;
    }

    Ok(ExportedTopology { layers })
}

/// Parse the topology of an exported model directory.
pub fn read_topology(dir: &Path) -> Result<ExportedTopology> {
    summarise(&read_model_json(dir)?)
}

/// Rebuild a Burn model from an exported directory.
///
/// The topology must be the ad-detector shape: relu hidden layers
/// followed by a single sigmoid unit.
pub fn load_model<B: Backend>(dir: &Path, device: &B::Device) -> Result<AdDetectorModel<B>> {
    let model_json = read_model_json(dir)?;
    let topology   = summarise(&model_json)?;

    let (output, hidden) = topology
        .layers
        .split_last()
        .ok_or_else(|| anyhow!("Exported model has no layers"))?;
    ensure!(
        output.units == 1 && output.activation == Activation::Sigmoid,
        "Last layer must be a single sigmoid unit, found {} x {}",
        output.units,
        output.activation.as_str()
    );
    if let Some(bad) = hidden.iter().find(|l| l.activation != Activation::Relu) {
        bail!("Hidden layer '{}' must use relu, found {}", bad.name, bad.activation.as_str());
    }

    let mut weights = read_weights(dir, &model_json.weights_manifest)?;

    let mut model: AdDetectorModel<B> = AdDetectorConfig::new()
        .with_input_dim(topology.input_dim())
        .with_hidden_units(hidden.iter().map(|l| l.units).collect())
        .init(device);

    for (index, layer) in topology.layers.iter().enumerate() {
        let linear: &mut Linear<B> = if index < model.hidden.len() {
            &mut model.hidden[index]
        } else {
            &mut model.output
        };

        let kernel = take_weight(&mut weights, &format!("{}/kernel", layer.name), &[layer.input_dim, layer.units])?;
        linear.weight = Param::from_tensor(Tensor::from_data(
            TensorData::new(kernel, [layer.input_dim, layer.units]),
            device,
        ));

        let bias = take_weight(&mut weights, &format!("{}/bias", layer.name), &[layer.units])?;
        linear.bias = Some(Param::from_tensor(Tensor::from_data(
            TensorData::new(bias, [layer.units]),
            device,
        )));
    }

    tracing::info!("Loaded {} layers from '{}'", topology.layer_count(), dir.display());
    Ok(model)
}

type NamedWeights = HashMap<String, (Vec<usize>, Vec<f32>)>;

/// Read every shard of every group and slice it by the manifest.
fn read_weights(dir: &Path, manifest: &[WeightGroup]) -> Result<NamedWeights> {
    let mut named = HashMap::new();

    for group in manifest {
        let mut bytes = Vec::new();
        for shard in &group.paths {
            let path = dir.join(shard);
            bytes.extend(
                fs::read(&path)
                    .with_context(|| format!("Cannot read weight shard '{}'", path.display()))?,
            );
        }

        let mut offset = 0usize;
        for entry in &group.weights {
            ensure!(entry.dtype == DTYPE, "Weight '{}' has unsupported dtype '{}'", entry.name, entry.dtype);
            let len = entry
                .shape
                .iter()
                .try_fold(4usize, |acc, &dim| acc.checked_mul(dim))
                .ok_or_else(|| anyhow!("Weight '{}' has an oversized shape {:?}", entry.name, entry.shape))?;
            let end = offset
                .checked_add(len)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| anyhow!("Weight data ends before '{}'", entry.name))?;

            let values = bytes[offset..end]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            named.insert(entry.name.clone(), (entry.shape.clone(), values));
            offset = end;
        }
        ensure!(
            offset == bytes.len(),
            "Weight shards hold {} bytes but the manifest accounts for {}",
            bytes.len(),
            offset
        );
    }

    Ok(named)
}

fn take_weight(weights: &mut NamedWeights, name: &str, expected: &[usize]) -> Result<Vec<f32>> {
    let (shape, values) = weights
        .remove(name)
        .ok_or_else(|| anyhow!("Weight '{name}' missing from the manifest"))?;
    ensure!(
        shape == expected,
        "Weight '{name}' has shape {shape:?}, expected {expected:?}"
    );
    Ok(values)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ad-detect-tfjs-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn fresh_model() -> AdDetectorModel<TestBackend> {
        AdDetectorConfig::new().init(&Default::default())
    }

    #[test]
    fn test_export_writes_descriptor_and_single_shard() {
        let dir     = temp_dir("layout");
        let model   = fresh_model();
        let summary = TfjsExporter::new(&dir).with_learning_rate(1e-3).export(&model).unwrap();

        assert_eq!(summary.weight_bytes, 4 * model.num_params());
        assert!(dir.join(MODEL_JSON).exists());
        let shard = dir.join("group1-shard1of1.bin");
        assert_eq!(fs::metadata(&shard).unwrap().len() as usize, summary.weight_bytes);
        assert_eq!(summary.files.len(), 2);
    }

    #[test]
    fn test_model_json_is_a_keras_sequential_description() {
        let dir = temp_dir("json");
        TfjsExporter::new(&dir).export(&fresh_model()).unwrap();

        let v: Value = serde_json::from_str(&fs::read_to_string(dir.join(MODEL_JSON)).unwrap()).unwrap();
        assert_eq!(v["format"], "layers-model");
        assert_eq!(v["modelTopology"]["model_config"]["class_name"], "Sequential");

        let layers = v["modelTopology"]["model_config"]["config"]["layers"].as_array().unwrap();
        let units: Vec<u64> = layers.iter().map(|l| l["config"]["units"].as_u64().unwrap()).collect();
        assert_eq!(units, vec![64, 32, 16, 1]);
        assert_eq!(layers[0]["config"]["batch_input_shape"], json!([null, 6]));
        assert_eq!(layers[3]["config"]["activation"], "sigmoid");

        let weights = v["weightsManifest"][0]["weights"].as_array().unwrap();
        assert_eq!(weights.len(), 8);
        assert_eq!(weights[0]["name"], "dense/kernel");
        assert_eq!(weights[0]["shape"], json!([6, 64]));
        assert_eq!(weights[7]["name"], "dense_3/bias");
    }

    #[test]
    fn test_topology_reads_back() {
        let dir = temp_dir("topology");
        TfjsExporter::new(&dir).export(&fresh_model()).unwrap();

        let topology = read_topology(&dir).unwrap();
        assert_eq!(topology.layer_count(), 4);
        assert_eq!(topology.input_dim(), 6);
        assert_eq!(topology.output_dim(), 1);
        assert_eq!(topology.layers[1].input_dim, 64);
        assert_eq!(topology.layers[3].activation, Activation::Sigmoid);
    }

    #[test]
    fn test_reloaded_model_predicts_the_same() {
        let dir    = temp_dir("reload");
        let device = Default::default();
        let model  = fresh_model();
        TfjsExporter::new(&dir).export(&model).unwrap();

        let loaded: AdDetectorModel<TestBackend> = load_model(&dir, &device).unwrap();
        let input = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![300.0f32, 250.0, 1.0, 0.0, 0.0, 1.0, 20.0, 640.0, 0.0, 0.0, 0.0, 0.0], [2, 6]),
            &device,
        );

        let a = tensor_values(model.forward(input.clone())).unwrap();
        let b = tensor_values(loaded.forward(input)).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_truncated_shard_is_rejected() {
        let dir = temp_dir("truncated");
        TfjsExporter::new(&dir).export(&fresh_model()).unwrap();
        fs::write(dir.join("group1-shard1of1.bin"), [0u8; 16]).unwrap();

        assert!(load_model::<TestBackend>(&dir, &Default::default()).is_err());
    }

    #[test]
    fn test_export_under_a_regular_file_fails() {
        let dir = temp_dir("blocked");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let err = TfjsExporter::new(file.join("out")).export(&fresh_model()).unwrap_err();
        assert!(err.to_string().contains("Cannot create export directory"));
        assert!(!file.join("out").join(MODEL_JSON).exists());
    }

    #[test]
    fn test_oversized_manifest_shape_is_rejected() {
        let dir = temp_dir("oversized");
        TfjsExporter::new(&dir).export(&fresh_model()).unwrap();

        let path = dir.join(MODEL_JSON);
        let mut v: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        v["weightsManifest"][0]["weights"][0]["shape"] = json!([usize::MAX, 2]);
        fs::write(&path, serde_json::to_string(&v).unwrap()).unwrap();

        let err = load_model::<TestBackend>(&dir, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("oversized shape"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = temp_dir("missing");
        assert!(read_topology(&dir).is_err());
    }

    #[test]
    fn test_shard_naming() {
        assert_eq!(shard_names(10), vec!["group1-shard1of1.bin"]);
        assert_eq!(
            shard_names(SHARD_BYTES + 1),
            vec!["group1-shard1of2.bin", "group1-shard2of2.bin"]
        );
    }
}
