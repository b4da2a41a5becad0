//! Lightweight metrics recorder (JSONL) for the initializer stages.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub format: MetricsFormat,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output: None,
            format: MetricsFormat::JsonLines,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsFormat {
    JsonLines,
}

impl Default for MetricsFormat {
    fn default() -> Self {
        Self::JsonLines
    }
}

pub struct MetricsRecorder {
    writer: Mutex<File>,
    format: MetricsFormat,
}

impl MetricsRecorder {
    pub fn new(path: &Path, format: MetricsFormat) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(file),
            format,
        })
    }

    pub fn emit(&self, event: MetricsEvent) {
        if let Err(err) = self.write_event(event) {
            eprintln!("[metrics] failed to write event: {err}");
        }
    }

    fn write_event(&self, event: MetricsEvent) -> io::Result<()> {
        match self.format {
            MetricsFormat::JsonLines => {
                let envelope = EventEnvelope {
                    timestamp_ms: now_millis(),
                    event,
                };
                let mut guard = self.writer.lock().expect("metrics writer poisoned");
                serde_json::to_writer(&mut *guard, &envelope)?;
                guard.write_all(b"\n")?;
                guard.flush()
            }
        }
    }
}

#[derive(Serialize)]
struct EventEnvelope {
    timestamp_ms: f64,
    #[serde(flatten)]
    event: MetricsEvent,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MetricsEvent {
    InitStart {
        rows: usize,
        cols: usize,
        gamma: f64,
        max_subspace: usize,
        max_restarts: usize,
        tol: f64,
    },
    MaskSelected {
        included: usize,
        excluded: usize,
        duration_ms: f64,
    },
    EigenSolve {
        eigenvalue: f64,
        residual: f64,
        applications: usize,
        restarts: usize,
        duration_ms: f64,
    },
    Rescale {
        scale: f64,
        held_out: usize,
        duration_ms: f64,
    },
    InitDone {
        duration_ms: f64,
    },
}

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

impl MetricsConfig {
    pub fn build_recorder(&self) -> io::Result<Option<MetricsRecorder>> {
        if !self.enabled {
            return Ok(None);
        }
        let path = self.output.as_ref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "metrics.output must be set when metrics are enabled",
            )
        })?;
        MetricsRecorder::new(path, self.format).map(Some)
    }
}
