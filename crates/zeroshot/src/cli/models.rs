//! The `zeroshot models` command for managing the local NLI model.

use clap::{Args, Subcommand};
use futures_util::{Stream, StreamExt};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use zeroshot_core::inference::nli::{
    NliClassifier, CONFIG_FILENAME, MODEL_FILENAME, TOKENIZER_FILENAME,
};
use zeroshot_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the configured ONNX model (weights + tokenizer + config)
    Download {
        /// Fetch the int8-quantized weights instead of fp32
        #[arg(long)]
        quantized: bool,

        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// Show which model files are installed
    List,

    /// Show the model directory path
    Path,
}

/// One file of a hub model repository and where it lands locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    pub remote_path: &'static str,
    pub local_name: &'static str,
}

/// Files to fetch for an NLI model exported to ONNX.
pub fn model_files(quantized: bool) -> [ModelFile; 3] {
    [
        ModelFile {
            remote_path: if quantized {
                "onnx/model_quantized.onnx"
            } else {
                "onnx/model.onnx"
            },
            local_name: MODEL_FILENAME,
        },
        ModelFile {
            remote_path: "tokenizer.json",
            local_name: TOKENIZER_FILENAME,
        },
        ModelFile {
            remote_path: "config.json",
            local_name: CONFIG_FILENAME,
        },
    ]
}

/// Download URL of a file in a hub repository.
pub fn download_url(repo: &str, remote_path: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{remote_path}")
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { quantized, force } => {
            if config.inference.backend == "remote" {
                tracing::warn!(
                    "inference.backend is \"remote\"; the local model is only used with --backend onnx"
                );
            }
            download(config, quantized, force).await?;
        }

        ModelsCommand::List => {
            let model_dir = config.onnx_model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `zeroshot models download` to download {}.", config.onnx.model);
                return Ok(());
            }

            println!("Model: {}", config.onnx.model);
            println!("  Directory: {}\n", model_dir.display());

            for path in NliClassifier::model_files(&model_dir) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let status = match std::fs::metadata(&path) {
                    Ok(meta) => format!("ready ({:.1} MB)", meta.len() as f64 / (1024.0 * 1024.0)),
                    Err(_) => "not installed".to_string(),
                };
                println!("    - {name:20} {status}");
            }

            if !NliClassifier::model_exists(&model_dir) {
                println!("\nSome files are missing. Run `zeroshot models download`.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.onnx_model_dir().display());
        }
    }

    Ok(())
}

/// Download every model file into the configured model directory.
///
/// Skips files that already exist unless `force` is set.
async fn download(config: &Config, quantized: bool, force: bool) -> anyhow::Result<()> {
    let repo = &config.onnx.model;
    let model_dir = config.onnx_model_dir();
    tokio::fs::create_dir_all(&model_dir).await?;

    let client = reqwest::Client::new();

    for file in model_files(quantized) {
        let dest = model_dir.join(file.local_name);
        if dest.exists() && !force {
            tracing::info!("{} already exists at {:?}", file.local_name, dest);
            continue;
        }

        let url = download_url(repo, file.remote_path);
        tracing::info!("Downloading {}...", file.local_name);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(&client, &url, &dest).await?;

        let file_size = tokio::fs::metadata(&dest).await?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            file.local_name,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    tracing::info!("All downloads complete.");
    Ok(())
}

/// Stream a URL to disk.
///
/// Writes to a `.part` file first and renames on success, so an interrupted
/// download never looks installed.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    save_stream(response.bytes_stream(), total_size, dest).await
}

/// Write a byte stream to `dest` through a `.part` file.
///
/// Any read or write failure removes the partial file.
async fn save_stream<S, B, E>(
    stream: S,
    total_size: Option<u64>,
    dest: &Path,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let partial = dest.with_extension("part");
    let file = tokio::fs::File::create(&partial).await?;

    if let Err(e) = write_stream(stream, file, total_size).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    tokio::fs::rename(&partial, dest).await?;

    Ok(())
}

/// Copy a byte stream into `writer`, logging progress every 50 MB.
async fn write_stream<S, B, E, W>(
    mut stream: S,
    mut writer: W,
    total_size: Option<u64>,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    W: AsyncWrite + Unpin,
{
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| anyhow::anyhow!("Download interrupted: {e}"))?;
        let chunk = chunk.as_ref();
        writer
            .write_all(chunk)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write download: {e}"))?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    writer.flush().await?;
    Ok(())
}
