use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use downshift_core::{
    CapabilityProbe, DType, ExecutionPath, Feeds, IOName, ModelSource, ModelSpec, Outputs,
    ProviderFactory, ProviderSession, SessionError, SessionOptions, SessionState, Tensor,
    TensorSpec,
};
use downshift_session::ModelSession;

fn test_spec() -> ModelSpec {
    ModelSpec {
        inputs: vec![TensorSpec {
            name: IOName::new("a"),
            dtype: DType::F32,
            rank: 2,
            dims: vec![Some(3), Some(4)],
        }],
        outputs: vec![TensorSpec {
            name: IOName::new("out"),
            dtype: DType::F32,
            rank: 2,
            dims: vec![Some(3), Some(4)],
        }],
    }
}

struct MockRuntimeSession {
    spec: ModelSpec,
    run_calls: Arc<AtomicUsize>,
}

impl ProviderSession for MockRuntimeSession {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn run(&mut self, feeds: Feeds) -> Result<Outputs> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        for (name, tensor) in feeds.iter() {
            let Some(input) = self.spec.inputs.iter().find(|i| i.name == *name) else {
                bail!("unknown input '{name}'");
            };
            let expected: Vec<usize> = input.dims.iter().map(|d| d.unwrap_or(1)).collect();
            if tensor.shape.dims() != expected.as_slice() {
                bail!(
                    "shape mismatch for '{name}': got {}, expected {:?}",
                    tensor.shape,
                    expected
                );
            }
        }
        Ok(vec![(
            IOName::new("out"),
            Tensor::from_f32(&[3, 4], &[0.0; 12]),
        )])
    }
}

struct MockFactory {
    portable_ok: bool,
    accelerated_ok: bool,
    created: Mutex<Vec<ExecutionPath>>,
    run_calls: Arc<AtomicUsize>,
}

impl MockFactory {
    fn new(portable_ok: bool, accelerated_ok: bool) -> Self {
        Self {
            portable_ok,
            accelerated_ok,
            created: Mutex::new(Vec::new()),
            run_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn created_paths(&self) -> Vec<ExecutionPath> {
        self.created.lock().unwrap().clone()
    }
}

impl ProviderFactory for MockFactory {
    fn create(
        &self,
        _source: &ModelSource,
        path: ExecutionPath,
        _options: &SessionOptions,
    ) -> Result<Box<dyn ProviderSession>> {
        self.created.lock().unwrap().push(path);
        let ok = match path {
            ExecutionPath::Portable => self.portable_ok,
            ExecutionPath::Accelerated => self.accelerated_ok,
        };
        if !ok {
            bail!("simulated {path:?} construction failure");
        }
        Ok(Box::new(MockRuntimeSession {
            spec: test_spec(),
            run_calls: Arc::clone(&self.run_calls),
        }))
    }
}

struct FixedProbe {
    available: bool,
    calls: AtomicUsize,
}

impl FixedProbe {
    fn new(available: bool) -> Self {
        Self {
            available,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CapabilityProbe for FixedProbe {
    async fn probe(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available
    }
}

fn source() -> ModelSource {
    ModelSource::from(std::path::PathBuf::from("model.onnx"))
}

fn valid_feeds() -> Feeds {
    let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
    Feeds::new().with("a", Tensor::from_f32(&[3, 4], &data))
}

#[tokio::test]
async fn gpu_absent_stays_on_portable() {
    let factory = MockFactory::new(true, true);
    let probe = FixedProbe::new(false);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    assert_eq!(session.active_path(), Some(ExecutionPath::Portable));
    assert!(session.status_line().contains("CPU"));
    assert_eq!(factory.created_paths(), vec![ExecutionPath::Portable]);
}

#[tokio::test]
async fn gpu_present_upgrades_to_accelerated() {
    let factory = MockFactory::new(true, true);
    let probe = FixedProbe::new(true);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    assert_eq!(session.active_path(), Some(ExecutionPath::Accelerated));
    assert!(session.status_line().contains("CUDA"));
    assert_eq!(
        factory.created_paths(),
        vec![ExecutionPath::Portable, ExecutionPath::Accelerated]
    );
}

#[tokio::test]
async fn accelerated_failure_falls_back_to_portable() {
    let factory = MockFactory::new(true, false);
    let probe = FixedProbe::new(true);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    assert_eq!(session.active_path(), Some(ExecutionPath::Portable));
    assert!(session.fallback_error().is_some());

    // The surviving portable session still serves inference.
    let outputs = session.run(valid_feeds()).unwrap();
    assert_eq!(outputs.len(), 1);
}

#[tokio::test]
async fn portable_failure_is_terminal() {
    let factory = MockFactory::new(false, true);
    let probe = FixedProbe::new(true);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    assert!(matches!(session.state(), SessionState::Failed { .. }));
    assert!(session.status_line().starts_with("Error loading model:"));
    // No upgrade attempt once the baseline is gone: the probe is never
    // consulted and only the portable construction was tried.
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    assert_eq!(factory.created_paths(), vec![ExecutionPath::Portable]);

    let err = session.run(valid_feeds()).unwrap_err();
    assert!(matches!(err, SessionError::NotReady));
}

#[tokio::test]
async fn run_before_initialize_is_rejected_without_runtime_call() {
    let factory = MockFactory::new(true, true);
    let mut session = ModelSession::new(source(), SessionOptions::default());

    let err = session.run(valid_feeds()).unwrap_err();
    assert!(matches!(err, SessionError::NotReady));
    assert_eq!(factory.run_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inference_failure_leaves_session_ready() {
    let factory = MockFactory::new(true, true);
    let probe = FixedProbe::new(false);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    // [4, 3] fed into an input declared [3, 4].
    let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
    let bad = Feeds::new().with("a", Tensor::from_f32(&[4, 3], &data));
    let err = session.run(bad).unwrap_err();
    assert!(matches!(err, SessionError::Inference(_)));
    assert!(err.to_string().contains("shape mismatch"));

    // Still Ready on the same path; a retry with valid feeds succeeds.
    assert_eq!(session.active_path(), Some(ExecutionPath::Portable));
    assert!(session.run(valid_feeds()).is_ok());
}

#[tokio::test]
async fn repeated_runs_return_identical_output_shapes() {
    let factory = MockFactory::new(true, true);
    let probe = FixedProbe::new(true);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;

    let first = session.run(valid_feeds()).unwrap();
    let second = session.run(valid_feeds()).unwrap();
    assert_eq!(first.len(), second.len());
    for ((n1, t1), (n2, t2)) in first.iter().zip(second.iter()) {
        assert_eq!(n1, n2);
        assert_eq!(t1.shape, t2.shape);
        assert_eq!(t1.dtype, t2.dtype);
    }
}

#[tokio::test]
async fn initialize_is_a_no_op_after_a_terminal_state() {
    let factory = MockFactory::new(true, true);
    let probe = FixedProbe::new(true);
    let mut session = ModelSession::new(source(), SessionOptions::default());
    session.initialize(&factory, &probe).await;
    session.initialize(&factory, &probe).await;

    assert_eq!(
        factory.created_paths(),
        vec![ExecutionPath::Portable, ExecutionPath::Accelerated]
    );
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}
