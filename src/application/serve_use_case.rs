// ============================================================
// Layer 2 — ServeUseCase
// ============================================================
// Loads one model artifact and runs the HTTP server around it:
//
//   Step 1: Load the artifact            (Layer 6 - infra)
//   Step 2: Build the model service      (server)
//   Step 3: Build a tokio runtime for the selected mode
//   Step 4: Bind, serve, and wait for Ctrl-C
//
// Modes:
//   dev        — current-thread runtime on 127.0.0.1:<port>;
//                Ctrl-C stops at once
//   production — 4 worker threads on 0.0.0.0:<port>; Ctrl-C
//                stops accepting and drains in-flight requests
//                for up to 30 seconds
//
// A missing or unreadable artifact is fatal unless the caller
// explicitly asks to serve without a model.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tokio::sync::oneshot;

use crate::domain::traits::Predictor;
use crate::infra::artifact_store::{ArtifactError, ArtifactStore};
use crate::server::{self, ModelService};

pub const DEFAULT_PORT: u16 = 5000;

// ─── Serving mode ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeMode {
    Dev,
    Production,
}

impl ServeMode {
    pub fn bind_ip(self) -> IpAddr {
        match self {
            ServeMode::Dev        => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ServeMode::Production => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// `None` means a current-thread runtime.
    pub fn worker_threads(self) -> Option<usize> {
        match self {
            ServeMode::Dev        => None,
            ServeMode::Production => Some(4),
        }
    }

    /// How long in-flight requests may run after Ctrl-C.
    /// `None` stops without draining.
    pub fn shutdown_timeout(self) -> Option<Duration> {
        match self {
            ServeMode::Dev        => None,
            ServeMode::Production => Some(Duration::from_secs(30)),
        }
    }

    fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let runtime = match self.worker_threads() {
            None => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build(),
            Some(workers) => tokio::runtime::Builder::new_multi_thread()
                .worker_threads(workers)
                .enable_all()
                .build(),
        };
        runtime.context("Failed to build the tokio runtime")
    }
}

// ─── Serve configuration ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    pub model_dir:           PathBuf,
    pub model_name:          String,
    pub mode:                ServeMode,
    pub port:                u16,
    pub serve_without_model: bool,
}

impl ServeConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.mode.bind_ip(), self.port)
    }
}

// ─── Model loading ────────────────────────────────────────────────────────────
/// Load the named artifact, logging the outcome. Any failure is
/// reported and turned into `None` for the caller to act on.
pub fn load_model(store: &ArtifactStore, model_name: &str) -> Option<Arc<dyn Predictor>> {
    match store.load_pipeline(model_name) {
        Ok(pipeline) => {
            tracing::info!(
                "Loaded {} model '{}' ({} features, trained on {})",
                pipeline.kind(),
                model_name,
                pipeline.feature_names().len(),
                pipeline.summary().dataset,
            );
            Some(Arc::new(pipeline))
        }
        Err(ArtifactError::NotFound(path)) => {
            tracing::error!("Model file {} not found.", path.display());
            None
        }
        Err(e) => {
            tracing::error!("An error occurred loading the model: {e}");
            None
        }
    }
}

// ─── ServeUseCase ─────────────────────────────────────────────────────────────
pub struct ServeUseCase {
    config: ServeConfig,
}

impl ServeUseCase {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    /// Build the service the route tree will share. Fails when the
    /// model cannot be loaded and serving without one is not allowed.
    pub fn build_service(&self) -> Result<Arc<ModelService>> {
        let cfg   = &self.config;
        let store = ArtifactStore::new(&cfg.model_dir);

        let service = match load_model(&store, &cfg.model_name) {
            Some(model) => ModelService::ready(&cfg.model_name, model),
            None if cfg.serve_without_model => {
                tracing::warn!("Serving without a model; /predict will answer 500");
                ModelService::not_ready(&cfg.model_name)
            }
            None => bail!("Failed to start the API due to model loading issues"),
        };
        Ok(Arc::new(service))
    }

    /// Serve until Ctrl-C.
    pub fn execute(&self) -> Result<()> {
        let cfg     = &self.config;
        let service = self.build_service()?;
        let runtime = cfg.mode.build_runtime()?;

        runtime.block_on(serve(service, cfg.bind_addr(), cfg.mode))
    }
}

async fn serve(service: Arc<ModelService>, addr: SocketAddr, mode: ServeMode) -> Result<()> {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let (bound, server) = warp::serve(server::routes(service))
        .try_bind_with_graceful_shutdown(addr, async {
            stop_rx.await.ok();
        })
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Serving on http://{bound} ({mode:?} mode)");

    let mut server = tokio::spawn(server);

    tokio::select! {
        finished = &mut server => {
            finished.context("Server task failed")?;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Cannot listen for Ctrl-C")?;
        }
    }

    tracing::info!("Shutdown requested");
    let _ = stop_tx.send(());

    match mode.shutdown_timeout() {
        None => server.abort(),
        Some(grace) => match tokio::time::timeout(grace, &mut server).await {
            Ok(finished) => {
                finished.context("Server task failed")?;
                tracing::info!("All connections drained");
            }
            Err(_) => {
                tracing::warn!("Graceful shutdown timed out after {}s", grace.as_secs());
                server.abort();
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::StandardScaler;
    use crate::ml::bundle::{Evaluation, ModelBundle, ModelParams, TrainingSummary};
    use crate::domain::prediction::Prediction;

    fn linear_bundle() -> ModelBundle {
        ModelBundle {
            feature_names: vec!["a".into(), "b".into()],
            scaler: StandardScaler { mean: vec![0.0, 0.0], scale: vec![1.0, 1.0] },
            params: ModelParams::Linear { coefficients: vec![2.0, -1.0], intercept: 0.5 },
            summary: TrainingSummary {
                dataset:    "synthetic".into(),
                seed:       42,
                test_size:  0.2,
                n_train:    8,
                n_test:     2,
                evaluation: Evaluation::Regression { mse: 0.0, r2: 1.0 },
            },
        }
    }

    fn config(dir: &std::path::Path, name: &str, serve_without_model: bool) -> ServeConfig {
        ServeConfig {
            model_dir: dir.to_path_buf(),
            model_name: name.to_string(),
            mode: ServeMode::Dev,
            port: DEFAULT_PORT,
            serve_without_model,
        }
    }

    #[test]
    fn test_missing_artifact_loads_nothing() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(load_model(&store, "absent.bin").is_none());
    }

    #[test]
    fn test_corrupt_artifact_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("junk.bin"), b"not a model").unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(load_model(&store, "junk.bin").is_none());
    }

    #[test]
    fn test_saved_artifact_loads_and_predicts() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save("lin.bin", &linear_bundle()).unwrap();

        let model = load_model(&store, "lin.bin").unwrap();
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.predict(&[1.0, 1.0]).unwrap(), Prediction::Value(1.5));
    }

    #[test]
    fn test_refuses_to_start_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServeUseCase::new(config(dir.path(), "absent.bin", false))
            .build_service()
            .unwrap_err();
        assert!(err.to_string().contains("model loading issues"));
    }

    #[test]
    fn test_serve_without_model_builds_unready_service() {
        let dir = tempfile::tempdir().unwrap();
        let service = ServeUseCase::new(config(dir.path(), "absent.bin", true))
            .build_service()
            .unwrap();
        assert!(service.model().is_none());
    }

    #[test]
    fn test_mode_settings() {
        assert_eq!(ServeMode::Dev.bind_ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(ServeMode::Production.bind_ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(ServeMode::Production.worker_threads(), Some(4));
        assert_eq!(ServeMode::Production.shutdown_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(ServeMode::Dev.worker_threads(), None);
    }
}
