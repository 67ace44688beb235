use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use prost::Message;
use prost_types::FileDescriptorSet;
use protosol::{decode_to_json, Decoder};
use protosol_cli::logging;
use protosol_compiler::{compile_request, GeneratorOptions};
use tracing::{info, level_filters::LevelFilter};

#[derive(Parser)]
#[command(name = "protosol")]
#[command(about = "Generate Solidity decoders from proto3 schemas, inspect their plans, or decode buffers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GeneratorArgs {
    /// Generator parameters in plugin form, e.g. `license=MIT,reject_default_values=false`
    #[arg(short, long, default_value = "")]
    parameter: String,

    /// SPDX license identifier for the generated header
    #[arg(long)]
    license: Option<String>,

    /// Import path of ProtobufLib
    #[arg(long)]
    protobuf_lib: Option<String>,

    /// Accept proto3 default values on the wire instead of rejecting them
    #[arg(long)]
    allow_default_values: bool,
}

impl GeneratorArgs {
    fn options(&self) -> Result<GeneratorOptions> {
        let mut options = GeneratorOptions::from_parameter(&self.parameter)?;
        if let Some(license) = &self.license {
            options.set("license", license)?;
        }
        if let Some(path) = &self.protobuf_lib {
            options.set("protobuf_lib", path)?;
        }
        if self.allow_default_values {
            options.reject_default_values = false;
        }
        Ok(options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate `.sol` files from a descriptor set written by `protoc --descriptor_set_out`
    Gen {
        /// Input descriptor set
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Proto files to generate (defaults to every file in the set)
        #[arg(short, long)]
        file: Vec<String>,

        /// Output directory (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Print the decoder plans of a descriptor set as JSON
    Inspect {
        /// Input descriptor set
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Only print this message's plan
        #[arg(short, long)]
        message: Option<String>,

        #[command(flatten)]
        generator: GeneratorArgs,
    },

    /// Decode a buffer the way the generated codec would, printing JSON
    Decode {
        /// Input descriptor set
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Message type of the buffer
        #[arg(short, long)]
        message: String,

        /// Buffer as hex, with or without a `0x` prefix
        #[arg(long, conflicts_with = "input")]
        hex: Option<String>,

        /// Buffer as a raw binary file
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        generator: GeneratorArgs,
    },
}

fn read_descriptor_set(path: &Path) -> Result<FileDescriptorSet> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    FileDescriptorSet::decode(bytes.as_slice())
        .with_context(|| format!("{} is not a FileDescriptorSet", path.display()))
}

fn main() -> Result<()> {
    logging::init(LevelFilter::INFO);
    let cli = Cli::parse();

    match &cli.command {
        Commands::Gen { descriptor_set, file, out, generator } => {
            let set = read_descriptor_set(descriptor_set)?;
            let to_generate: Vec<String> = if file.is_empty() {
                set.file.iter().map(|f| f.name().to_string()).collect()
            } else {
                file.clone()
            };

            let compilation = compile_request(&set.file, &to_generate, &generator.options()?)?;
            let out_dir = out.clone().unwrap_or_else(|| PathBuf::from("."));
            for generated in &compilation.files {
                let path = out_dir.join(&generated.name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                fs::write(&path, &generated.content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), "wrote solidity");
            }
            println!("Generated {} file(s) in {}", compilation.files.len(), out_dir.display());
            Ok(())
        }

        Commands::Inspect { descriptor_set, message, generator } => {
            let set = read_descriptor_set(descriptor_set)?;
            let decoder = Decoder::from_descriptor_set(&set, &generator.options()?)?;
            let json = match message {
                Some(name) => match decoder.plan(name) {
                    Some(plan) => serde_json::to_string_pretty(plan)?,
                    None => bail!("Message {name:?} is not declared in {}", descriptor_set.display()),
                },
                None => {
                    let plans: Vec<_> = decoder.messages().filter_map(|name| decoder.plan(name)).collect();
                    serde_json::to_string_pretty(&plans)?
                }
            };
            println!("{}", json);
            Ok(())
        }

        Commands::Decode { descriptor_set, message, hex: hex_text, input, generator } => {
            let set = read_descriptor_set(descriptor_set)?;
            let decoder = Decoder::from_descriptor_set(&set, &generator.options()?)?;
            let bytes = match (hex_text, input) {
                (Some(text), _) => {
                    let text = text.trim();
                    hex::decode(text.strip_prefix("0x").unwrap_or(text)).context("Invalid hex buffer")?
                }
                (None, Some(path)) => {
                    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
                }
                (None, None) => bail!("Pass the buffer with --hex or --input"),
            };
            println!("{}", decode_to_json(&decoder, message, &bytes)?);
            Ok(())
        }
    }
}
