//! ONNX Runtime implementation of the provider seam.
//!
//! Builds one `ort` session per execution path: the portable path is the
//! plain CPU provider, the accelerated path registers the CUDA execution
//! provider (crate feature `cuda`). Tensors cross the seam as named
//! little-endian byte buffers and are converted here.

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use downshift_core::{
    DType, ExecutionPath, Feeds, IOName, ModelSource, ModelSpec, OptimizationLevel, Outputs,
    ProviderFactory, ProviderSession, SessionOptions, Shape, Tensor, TensorSpec,
};
use ort::{
    session::{builder::SessionBuilder, Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, ValueType},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct OrtFactory;

impl OrtFactory {
    pub fn new() -> Self {
        Self
    }
}

pub struct OrtSession {
    spec: ModelSpec,
    session: Session,
}

impl ProviderFactory for OrtFactory {
    fn create(
        &self,
        source: &ModelSource,
        path: ExecutionPath,
        options: &SessionOptions,
    ) -> Result<Box<dyn ProviderSession>> {
        let builder = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(optimization_level(options.optimization))
            .context("failed to set graph optimization level")?
            .with_memory_pattern(options.memory_arena)
            .context("failed to configure memory arena")?;

        let builder = configure_path(builder, path)?;

        let session = builder
            .commit_from_file(source.path())
            .with_context(|| format!("failed to load ONNX model from {:?}", source.path()))?;

        let spec = build_model_spec(&session)?;

        Ok(Box::new(OrtSession { spec, session }))
    }
}

impl ProviderSession for OrtSession {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn run(&mut self, feeds: Feeds) -> Result<Outputs> {
        let mut ort_inputs = Vec::with_capacity(feeds.len());
        for (name, tensor) in feeds.into_inner() {
            let value = tensor_to_ort_value(tensor)
                .with_context(|| format!("invalid feed tensor '{name}'"))?;
            ort_inputs.push((name.0, SessionInputValue::from(value)));
        }

        let outputs = self.session.run(ort_inputs)?;
        let mut out_tensors = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            out_tensors.push((IOName::new(name), ort_value_to_tensor(&value)?));
        }

        Ok(out_tensors)
    }
}

fn optimization_level(
    level: OptimizationLevel,
) -> ort::session::builder::GraphOptimizationLevel {
    use ort::session::builder::GraphOptimizationLevel;
    match level {
        OptimizationLevel::Disabled => GraphOptimizationLevel::Disable,
        OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
        OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
        OptimizationLevel::All => GraphOptimizationLevel::Level3,
    }
}

fn configure_path(builder: SessionBuilder, path: ExecutionPath) -> Result<SessionBuilder> {
    match path {
        ExecutionPath::Portable => Ok(builder),
        ExecutionPath::Accelerated => configure_cuda(builder),
    }
}

fn configure_cuda(builder: SessionBuilder) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::cuda::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default().build();
        builder
            .with_execution_providers([ep])
            .context("failed to enable ORT CUDA execution provider")
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = builder;
        bail!("accelerated path requested but downshift-backend-ort was built without the `cuda` feature")
    }
}

fn build_model_spec(session: &Session) -> Result<ModelSpec> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| tensor_spec_from_value_type(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs
        .iter()
        .map(|output| tensor_spec_from_value_type(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelSpec { inputs, outputs })
}

fn tensor_spec_from_value_type(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("unsupported non-tensor IO value type");
    };

    let dtype = ort_tensor_element_to_dtype(*ty)?;
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect::<Vec<_>>();

    Ok(TensorSpec {
        name: IOName(name.to_string()),
        dtype,
        rank: shape.len(),
        dims,
    })
}

fn ort_tensor_element_to_dtype(ty: TensorElementType) -> Result<DType> {
    match ty {
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Float16 => Ok(DType::F16),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Uint8 => Ok(DType::U8),
        _ => bail!("unsupported tensor element type: {ty}"),
    }
}

fn tensor_to_ort_value(tensor: Tensor) -> Result<DynValue> {
    let shape: Vec<usize> = tensor.shape.dims().to_vec();
    let expected_bytes = tensor.shape.numel() * tensor.dtype.byte_size();
    ensure!(
        tensor.byte_len() == expected_bytes,
        "input byte size mismatch: got {}, expected {}",
        tensor.byte_len(),
        expected_bytes
    );

    let value = match tensor.dtype {
        DType::F32 => {
            let data = tensor.to_f32()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::I64 => {
            let data = tensor.to_i64()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::I32 => {
            let data = tensor.to_i32()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::U8 => {
            let data = tensor.data.to_vec();
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::F16 => bail!("f16 inputs are not supported yet"),
    };

    Ok(value)
}

fn ort_value_to_tensor(value: &ort::value::ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        bail!("non-tensor outputs are not supported");
    };

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let out_shape = Shape::from_slice(&dims);

    match *ty {
        TensorElementType::Float32 => {
            let array = value.try_extract_array::<f32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_bytes(
                DType::F32,
                out_shape,
                downshift_core::bytes_from_slice(slice),
            ))
        }
        TensorElementType::Int64 => {
            let array = value.try_extract_array::<i64>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_bytes(
                DType::I64,
                out_shape,
                downshift_core::bytes_from_slice(slice),
            ))
        }
        TensorElementType::Int32 => {
            let array = value.try_extract_array::<i32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_bytes(
                DType::I32,
                out_shape,
                downshift_core::bytes_from_slice(slice),
            ))
        }
        TensorElementType::Uint8 => {
            let array = value.try_extract_array::<u8>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_bytes(
                DType::U8,
                out_shape,
                Bytes::copy_from_slice(slice),
            ))
        }
        TensorElementType::Float16 => bail!("f16 outputs are not supported yet"),
        _ => bail!("unsupported output tensor element type: {ty}"),
    }
}
