use crate::{
    config::Config,
    document::{export_pdf, status_file_name, PageGeometry},
    evaluation::{EvaluationController, EvaluationOutcome, JobState, PollSettings},
    normalize::NormalizedResult,
    report::{assemble, render_text},
    service::{http::HttpEvaluationService, EvaluationService, EvaluationStatus},
    upload::UploadController,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "snapauto")]
#[command(about = "Vehicle conservation evaluation client (upload, evaluate, report)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./snapauto.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a video and print the job id and extracted frames.
    Upload {
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        interval_sec: Option<u32>,
    },
    /// Evaluate an uploaded job and export the report.
    Evaluate {
        #[arg(long)]
        job_id: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Upload, then evaluate.
    Run {
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        interval_sec: Option<u32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Re-render a saved status payload.
    Report {
        #[arg(long)]
        status: PathBuf,
        #[arg(long)]
        job_id: Option<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = match &cfg_path {
        Some(p) => Config::load(p)?,
        None => Config::default().with_env_overrides(),
    };
    let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
    if let Some(p) = &cfg_path {
        info!("config {}", p.display());
    }

    let runtime = tokio::runtime::Runtime::new().with_context(|| "starting tokio runtime")?;
    runtime.block_on(run_command(&args.cmd, &cfg))
}

async fn run_command(cmd: &Command, cfg: &Config) -> Result<()> {
    match cmd {
        Command::Upload {
            video,
            interval_sec,
        } => {
            let service = Arc::new(HttpEvaluationService::new(cfg)?);
            let interval = interval_sec.unwrap_or(cfg.upload.interval_sec);
            let mut uploader = UploadController::new(service);
            let job = uploader
                .submit(Some(video.as_path()), interval)
                .await
                .map_err(|e| anyhow!("{e}"))?;
            println!("{}", serde_json::to_string_pretty(job)?);
            Ok(())
        }
        Command::Evaluate { job_id, out_dir } => {
            let service = Arc::new(HttpEvaluationService::new(cfg)?);
            evaluate(cfg, service, job_id, out_dir.as_deref()).await
        }
        Command::Run {
            video,
            interval_sec,
            out_dir,
        } => {
            let service = Arc::new(HttpEvaluationService::new(cfg)?);
            let interval = interval_sec.unwrap_or(cfg.upload.interval_sec);
            let mut uploader = UploadController::new(Arc::clone(&service));
            let job = uploader
                .submit(Some(video.as_path()), interval)
                .await
                .map_err(|e| anyhow!("{e}"))?
                .clone();
            info!("frames: {}", job.frames.len());
            evaluate(cfg, service, &job.id, out_dir.as_deref()).await
        }
        Command::Report {
            status,
            job_id,
            out_dir,
        } => report_from_file(cfg, status, job_id.as_deref(), out_dir.as_deref()),
    }
}

/// Enqueue, poll to a terminal state, then print and export the report.
pub async fn evaluate<S: EvaluationService + 'static>(
    cfg: &Config,
    service: Arc<S>,
    job_id: &str,
    out_dir: Option<&Path>,
) -> Result<()> {
    let controller = EvaluationController::new(service, PollSettings::from_config(&cfg.evaluation));
    controller
        .evaluate(job_id)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    match controller.wait().await {
        JobState::Completed(outcome) => publish(cfg, &outcome, out_dir),
        JobState::Failed(msg) | JobState::TimedOut(msg) => Err(anyhow!(msg)),
        other => Err(anyhow!("evaluation ended in state {}", other.name())),
    }
}

fn publish(cfg: &Config, outcome: &EvaluationOutcome, out_dir: Option<&Path>) -> Result<()> {
    let blocks = assemble(&outcome.result, &outcome.job_id, &outcome.files, &now_rfc3339());
    print!("{}", render_text(&blocks));

    let out_root = out_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.export.out_dir));
    if let Err(err) = ensure_dir(&out_root) {
        warn!("{err:#}");
    }

    if cfg.export.write_status_json {
        let path = out_root.join(status_file_name(&outcome.job_id));
        std::fs::write(&path, serde_json::to_string_pretty(&outcome.status)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if cfg.export.write_pdf {
        let geometry = PageGeometry::from_config(&cfg.export);
        if let Some(path) = export_pdf(&blocks, &geometry, &out_root, &outcome.job_id) {
            println!("PDF: {}", path.display());
        }
    }
    Ok(())
}

fn report_from_file(
    cfg: &Config,
    status_path: &Path,
    job_id: Option<&str>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let raw = std::fs::read_to_string(status_path)
        .with_context(|| format!("reading status: {}", status_path.display()))?;
    let status: EvaluationStatus = serde_json::from_str(&raw).with_context(|| "parsing status JSON")?;
    let outcome = EvaluationOutcome {
        job_id: job_id.unwrap_or_default().to_string(),
        result: NormalizedResult::from_value(status.result.as_ref()),
        files: status.files.clone(),
        status,
    };
    let cfg = Config {
        export: crate::config::Export {
            write_status_json: false,
            ..cfg.export.clone()
        },
        ..cfg.clone()
    };
    publish(&cfg, &outcome, out_dir)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["snapauto.toml", "snapauto.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.export.out_dir).join("snapauto.log"))
}
