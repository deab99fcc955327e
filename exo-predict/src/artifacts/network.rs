//! Layered neural network artifact
//!
//! A `Sequential` network is an ordered list of layers with a declared input
//! shape. Shapes are inferred layer by layer when the network is built (or
//! deserialized), so an inconsistent network never reaches a pipeline.
//!
//! Supported layers:
//! - `dense`: `activation(W·x + b)` on a rank-1 input
//! - `conv1d`: 1-D convolution over a `[length, channels]` input
//! - `global_average_pooling1d`: mean over the length axis, `[length, channels] → [channels]`
//! - `flatten`: any shape → rank-1
//!
//! Sequence samples are laid out row-major: value `(t, c)` sits at `t * channels + c`.
//! Evaluation runs on `candle_core` tensors of shape `(1, ...sample dims)`.

use candle_core::{Device, Tensor, D};
use serde::{Deserialize, Serialize};

use super::{affine, check_len, check_matrix, into_values, matrix, sample_tensor, vector, ArtifactError};
use crate::types::{Shape, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    /// Apply element-wise; softmax normalizes over the last axis
    fn apply(&self, xs: &Tensor) -> Result<Tensor, ArtifactError> {
        let out = match self {
            Activation::Linear => xs.clone(),
            Activation::Relu => xs.relu()?,
            Activation::Sigmoid => candle_nn::ops::sigmoid(xs)?,
            Activation::Tanh => xs.tanh()?,
            Activation::Softmax => candle_nn::ops::softmax(xs, D::Minus1)?,
        };
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// No padding: output length is `length - kernel_size + 1`
    #[default]
    Valid,
    /// Zero padding keeping the output length equal to the input length
    Same,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Dense {
        /// One row per output unit
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        activation: Activation,
    },
    Conv1d {
        /// `[filters][kernel_size][in_channels]`
        kernels: Vec<Vec<Vec<f64>>>,
        bias: Vec<f64>,
        #[serde(default)]
        padding: Padding,
        #[serde(default)]
        activation: Activation,
    },
    GlobalAveragePooling1d,
    Flatten,
}

impl Layer {
    fn name(&self) -> &'static str {
        match self {
            Layer::Dense { .. } => "dense",
            Layer::Conv1d { .. } => "conv1d",
            Layer::GlobalAveragePooling1d => "global_average_pooling1d",
            Layer::Flatten => "flatten",
        }
    }

    /// Infer the output shape for `input`, checking parameter consistency
    fn output_shape(&self, input: &Shape) -> Result<Shape, ArtifactError> {
        match self {
            Layer::Dense { weights, bias, .. } => {
                let Some(width) = input.as_vector() else {
                    return Err(ArtifactError::Invalid(format!(
                        "dense layer needs a rank-1 input, got {}",
                        input
                    )));
                };
                if weights.is_empty() {
                    return Err(ArtifactError::Invalid("dense layer has no units".to_string()));
                }
                check_matrix("dense weight", weights, width)?;
                if bias.len() != weights.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "dense layer has {} units but {} bias terms",
                        weights.len(),
                        bias.len()
                    )));
                }
                Ok(Shape::vector(weights.len()))
            }
            Layer::Conv1d {
                kernels,
                bias,
                padding,
                ..
            } => {
                let [length, channels] = input.dims() else {
                    return Err(ArtifactError::Invalid(format!(
                        "conv1d layer needs a [length, channels] input, got {}",
                        input
                    )));
                };
                let kernel_size = kernels.first().map(Vec::len).unwrap_or(0);
                if kernel_size == 0 {
                    return Err(ArtifactError::Invalid("conv1d layer has no kernels".to_string()));
                }
                for (f, kernel) in kernels.iter().enumerate() {
                    if kernel.len() != kernel_size {
                        return Err(ArtifactError::Invalid(format!(
                            "conv1d filter {} has kernel size {}, expected {}",
                            f,
                            kernel.len(),
                            kernel_size
                        )));
                    }
                    check_matrix("conv1d kernel tap", kernel, *channels)?;
                }
                if bias.len() != kernels.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "conv1d layer has {} filters but {} bias terms",
                        kernels.len(),
                        bias.len()
                    )));
                }
                let out_len = match padding {
                    Padding::Same => *length,
                    Padding::Valid if kernel_size <= *length => length - kernel_size + 1,
                    Padding::Valid => {
                        return Err(ArtifactError::Invalid(format!(
                            "conv1d kernel size {} exceeds sequence length {}",
                            kernel_size, length
                        )))
                    }
                };
                Ok(Shape(vec![out_len, kernels.len()]))
            }
            Layer::GlobalAveragePooling1d => match input.dims() {
                [length, channels] if *length > 0 => Ok(Shape::vector(*channels)),
                _ => Err(ArtifactError::Invalid(format!(
                    "global_average_pooling1d needs a non-empty [length, channels] input, got {}",
                    input
                ))),
            },
            Layer::Flatten => Ok(Shape::vector(input.volume())),
        }
    }

    /// Evaluate on a `(1, ...sample dims)` tensor whose dims were checked at build time
    fn forward(&self, xs: &Tensor) -> Result<Tensor, ArtifactError> {
        match self {
            Layer::Dense {
                weights,
                bias,
                activation,
            } => activation.apply(&affine(xs, &matrix(weights)?, &vector(bias)?)?),
            Layer::Conv1d {
                kernels,
                bias,
                padding,
                activation,
            } => activation.apply(&conv1d(xs, kernels, bias, *padding)?),
            Layer::GlobalAveragePooling1d => Ok(xs.mean(1)?),
            Layer::Flatten => Ok(xs.flatten_from(1)?),
        }
    }
}

/// `(1, length, channels)` → `(1, out_len, filters)`
///
/// Same padding puts `(kernel_size - 1) / 2` zeros on the left and the rest on
/// the right.
fn conv1d(xs: &Tensor, kernels: &[Vec<Vec<f64>>], bias: &[f64], padding: Padding) -> Result<Tensor, ArtifactError> {
    let filters = kernels.len();
    let kernel_size = kernels.first().map(Vec::len).unwrap_or(0);
    let channels = xs.dim(2)?;

    // candle convolves (batch, channels, length) with (filters, channels, kernel_size)
    let taps: Vec<f64> = kernels.iter().flatten().flatten().copied().collect();
    let kernel = Tensor::from_vec(taps, (filters, kernel_size, channels), &Device::Cpu)?
        .transpose(1, 2)?
        .contiguous()?;
    let mut input = xs.transpose(1, 2)?.contiguous()?;
    if padding == Padding::Same {
        let total = kernel_size.saturating_sub(1);
        let left = total / 2;
        input = input.pad_with_zeros(2, left, total - left)?;
    }

    let out = input
        .conv1d(&kernel, 0, 1, 1, 1)?
        .broadcast_add(&vector(bias)?.reshape((1, filters, 1))?)?;
    Ok(out.transpose(1, 2)?.contiguous()?)
}

/// Serialized form of a network, before shape inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialSpec {
    pub input_shape: Vec<usize>,
    pub layers: Vec<Layer>,
}

/// Shape-checked layered network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SequentialSpec", into = "SequentialSpec")]
pub struct Sequential {
    input_shape: Shape,
    layers: Vec<Layer>,
    /// Input shape of every layer, followed by the network output shape
    shapes: Vec<Shape>,
}

impl Sequential {
    /// Build a network, inferring and checking every layer shape
    pub fn new(input_shape: Vec<usize>, layers: Vec<Layer>) -> Result<Self, ArtifactError> {
        let input_shape = Shape(input_shape);
        let shapes = infer_shapes(&input_shape, &layers)?;
        Ok(Self {
            input_shape,
            layers,
            shapes,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        infer_shapes(&self.input_shape, &self.layers).map(|_| ())
    }
}

fn infer_shapes(input_shape: &Shape, layers: &[Layer]) -> Result<Vec<Shape>, ArtifactError> {
    if input_shape.rank() == 0 || input_shape.volume() == 0 {
        return Err(ArtifactError::Invalid(format!(
            "network input shape {} is empty",
            input_shape
        )));
    }
    if layers.is_empty() {
        return Err(ArtifactError::Invalid("network has no layers".to_string()));
    }

    let mut shapes = vec![input_shape.clone()];
    for (i, layer) in layers.iter().enumerate() {
        let current = &shapes[shapes.len() - 1];
        let next = layer
            .output_shape(current)
            .map_err(|e| ArtifactError::Invalid(format!("layer {} ({}): {}", i, layer.name(), e)))?;
        shapes.push(next);
    }
    Ok(shapes)
}

impl TryFrom<SequentialSpec> for Sequential {
    type Error = ArtifactError;

    fn try_from(spec: SequentialSpec) -> Result<Self, Self::Error> {
        Sequential::new(spec.input_shape, spec.layers)
    }
}

impl From<Sequential> for SequentialSpec {
    fn from(network: Sequential) -> Self {
        SequentialSpec {
            input_shape: network.input_shape.0,
            layers: network.layers,
        }
    }
}

impl Transform for Sequential {
    fn kind(&self) -> &'static str {
        "sequential"
    }

    fn input_shape(&self) -> Shape {
        self.input_shape.clone()
    }

    fn output_shape(&self) -> Shape {
        self.shapes[self.shapes.len() - 1].clone()
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.input_shape.volume())?;
        let mut current = sample_tensor(sample, self.input_shape.dims())?;
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        into_values(&current)
    }
}
