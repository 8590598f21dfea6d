mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use downshift_backend_ort::OrtFactory;
use downshift_core::{
    CapabilityProbe, DType, Feeds, ModelSource, OptimizationLevel, SessionOptions, Tensor,
    TensorSpec,
};
use downshift_probe::WgpuProbe;
use downshift_session::ModelSession;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    std::env::set_var("RUST_LOG", &cli.log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match cli.command {
        Command::GpuInfo => gpu_info().await,
        Command::Run {
            model,
            opt_level,
            no_mem_arena,
            force_portable,
        } => {
            let options = SessionOptions {
                optimization: parse_opt_level(&opt_level)?,
                memory_arena: !no_mem_arena,
            };
            run(model.into(), options, force_portable).await
        }
    }
}

async fn gpu_info() -> Result<()> {
    let probe = WgpuProbe::new();

    match probe.describe().await {
        Ok(report) => println!("{report}"),
        Err(err) => println!("GPU information unavailable: {err:#}"),
    }

    let usable = probe.probe().await;
    println!(
        "Accelerated execution: {}",
        if usable { "usable" } else { "not usable" }
    );
    Ok(())
}

/// Probe that always declines, for `--force-portable`.
struct NoUpgrade;

impl CapabilityProbe for NoUpgrade {
    async fn probe(&self) -> bool {
        false
    }
}

async fn run(
    model_path: std::path::PathBuf,
    options: SessionOptions,
    force_portable: bool,
) -> Result<()> {
    let factory = OrtFactory::new();
    let mut session = ModelSession::new(ModelSource::from(model_path), options);

    println!("{}", session.status_line());
    if force_portable {
        session.initialize(&factory, &NoUpgrade).await;
    } else {
        session.initialize(&factory, &WgpuProbe::new()).await;
    }
    println!("{}", session.status_line());

    let Some(path) = session.active_path() else {
        bail!("{}", session.status_line());
    };

    let spec_inputs = session
        .model_spec()
        .context("ready session has no model spec")?
        .inputs
        .clone();
    let feeds = demo_feeds(&spec_inputs)?;

    match session.run(feeds) {
        Ok(outputs) => {
            println!("Inference results ({} path):", path.label());
            for (name, tensor) in &outputs {
                println!(
                    "  {name}: {} {} {}",
                    tensor.dtype,
                    tensor.shape,
                    leading_values(tensor)?
                );
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("Inference error:");
            eprintln!("  {}", err.chain());
            Err(err.into())
        }
    }
}

/// Deterministic ramp-filled feeds built from the model's declared inputs;
/// dynamic dims default to 3.
fn demo_feeds(inputs: &[TensorSpec]) -> Result<Feeds> {
    let mut feeds = Feeds::new();
    for input in inputs {
        let mut shape: Vec<usize> = input.dims.iter().map(|d| d.unwrap_or(3)).collect();
        if shape.is_empty() {
            shape.push(3);
        }
        let numel = shape.iter().product::<usize>().max(1);

        let tensor = match input.dtype {
            DType::F32 => {
                Tensor::from_f32(&shape, &(0..numel).map(|i| i as f32).collect::<Vec<_>>())
            }
            DType::I64 => {
                Tensor::from_i64(&shape, &(0..numel).map(|i| i as i64).collect::<Vec<_>>())
            }
            DType::I32 => {
                Tensor::from_i32(&shape, &(0..numel).map(|i| i as i32).collect::<Vec<_>>())
            }
            DType::U8 => Tensor::from_u8(&shape, &(0..numel).map(|i| i as u8).collect::<Vec<_>>()),
            DType::F16 => bail!("demo feeds do not support f16 input '{}'", input.name),
        };
        feeds.insert(input.name.clone(), tensor);
    }
    Ok(feeds)
}

/// First ten elements, rendered for the result dump.
fn leading_values(tensor: &Tensor) -> Result<String> {
    const N: usize = 10;
    let rendered = match tensor.dtype {
        DType::F32 => render(&tensor.to_f32()?, N),
        DType::I64 => render(&tensor.to_i64()?, N),
        DType::I32 => render(&tensor.to_i32()?, N),
        DType::U8 => render(&tensor.data[..], N),
        DType::F16 => bail!("f16 outputs are not rendered"),
    };
    Ok(rendered)
}

fn render<T: std::fmt::Display>(values: &[T], limit: usize) -> String {
    let shown: Vec<String> = values.iter().take(limit).map(|v| v.to_string()).collect();
    let suffix = if values.len() > limit { ", ..." } else { "" };
    format!("[{}{}]", shown.join(", "), suffix)
}

fn parse_opt_level(raw: &str) -> Result<OptimizationLevel> {
    match raw.to_ascii_lowercase().as_str() {
        "disabled" => Ok(OptimizationLevel::Disabled),
        "basic" => Ok(OptimizationLevel::Basic),
        "extended" => Ok(OptimizationLevel::Extended),
        "all" => Ok(OptimizationLevel::All),
        other => bail!("unsupported optimization level: {other} (expected disabled, basic, extended or all)"),
    }
}
