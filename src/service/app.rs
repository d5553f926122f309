//! Main application state and service coordination
//!
//! This module contains the AppState that wires the participant store, the
//! rating model, the ladder operations, principal resolution and metrics, and
//! owns the background tasks.

use crate::auth::{PrincipalProvider, TokenPrincipalProvider};
use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::rating::{InMemoryParticipantRepository, ParticipantRepository, RatingModel};
use crate::service::ladder::LadderService;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Participant and match history store
    repository: Arc<dyn ParticipantRepository>,

    /// Role-checked ladder operations
    ladder: LadderService,

    /// Caller resolution
    principal_provider: Arc<dyn PrincipalProvider>,

    /// Metrics collector shared with every component
    metrics_collector: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: RwLock<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with the in-memory store
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing ladder service");
        info!(
            "Configuration: service={}, starting_rating={}, k_factor={}",
            config.service.name, config.rating.starting_rating, config.rating.k_factor
        );

        let repository: Arc<dyn ParticipantRepository> = Arc::new(
            InMemoryParticipantRepository::new(
                config.rating.starting_rating,
                config.lock_timeout(),
            ),
        );
        let principal_provider: Arc<dyn PrincipalProvider> =
            Arc::new(TokenPrincipalProvider::new(&config.auth, repository.clone()));

        Self::with_components(config, repository, principal_provider)
    }

    /// Initialize the application around an existing store and provider
    pub fn with_components(
        config: AppConfig,
        repository: Arc<dyn ParticipantRepository>,
        principal_provider: Arc<dyn PrincipalProvider>,
    ) -> Result<Self, ServiceError> {
        let model =
            RatingModel::new(config.rating.clone()).map_err(|e| ServiceError::Configuration {
                message: format!("Invalid rating configuration: {}", e),
            })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let ladder = LadderService::new(repository.clone(), model, metrics_collector.clone());

        Ok(Self {
            config,
            repository,
            ladder,
            principal_provider,
            metrics_collector,
            background_tasks: RwLock::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Mark the service running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting ladder service");
        *self.is_running.write().await = true;

        let gauge_task = {
            let repository = self.repository.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));
                debug!("Participant gauge task started");

                while *is_running.read().await {
                    interval.tick().await;

                    match repository.participant_count().await {
                        Ok(count) => {
                            metrics_collector.update_participant_count(count);
                            metrics_collector.update_component_health("participant_store", true);
                        }
                        Err(e) => {
                            warn!("Failed to count participants for metrics update: {}", e);
                            metrics_collector.update_component_health("participant_store", false);
                        }
                    }
                }

                debug!("Participant gauge task stopped");
            })
        };
        self.background_tasks.write().await.push(gauge_task);

        info!("Ladder service started");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of ladder service");
        *self.is_running.write().await = false;

        let mut tasks = self.background_tasks.write().await;
        let task_count = tasks.len();
        for task in tasks.drain(..) {
            task.abort();
        }
        debug!("Aborted {} background task(s)", task_count);

        let participants = self.repository.participant_count().await.map_err(|e| {
            ServiceError::BackgroundTask {
                message: format!("Failed to get final participant count: {}", e),
            }
        })?;
        info!(
            "Ladder service shutdown completed - {} participant(s) in store",
            participants
        );
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the ladder operations
    pub fn ladder(&self) -> &LadderService {
        &self.ladder
    }

    /// Get the participant store
    pub fn repository(&self) -> Arc<dyn ParticipantRepository> {
        self.repository.clone()
    }

    /// Get the principal provider
    pub fn principal_provider(&self) -> Arc<dyn PrincipalProvider> {
        self.principal_provider.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }
}
