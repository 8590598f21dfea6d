use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "downshift", version, about = "ONNX inference demo with GPU fallback")]
pub struct Cli {
    /// Log filter (RUST_LOG syntax)
    #[arg(long, default_value = "info", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show GPU adapter information and the probe verdict
    GpuInfo,

    /// Load a model (portable first, upgrading to the GPU path when
    /// possible) and run one inference with demo feeds
    Run {
        /// Path to ONNX model file
        #[arg(long, default_value = "models/model.onnx")]
        model: String,

        /// Graph optimization level (disabled, basic, extended, all)
        #[arg(long, default_value = "all")]
        opt_level: String,

        /// Disable the runtime memory arena
        #[arg(long)]
        no_mem_arena: bool,

        /// Skip the GPU upgrade attempt and stay on the portable path
        #[arg(long)]
        force_portable: bool,
    },
}
