// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Tasks service for asynchronous analysis requests.
//!
//! Each request becomes an HTTP task that Cloud Tasks delivers to the
//! analysis worker with an OIDC token. Uses the official
//! google-cloud-tasks-v2 SDK.

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Payload sent to the analysis worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequestPayload {
    pub username: String,
    /// Unix seconds
    pub requested_at: i64,
}

/// Something that can hand an analysis request to the worker.
#[async_trait]
pub trait AnalysisNotifier: Send + Sync {
    /// Enqueue the request and return its message ID.
    async fn request_analysis(&self, payload: AnalysisRequestPayload) -> Result<String>;
}

/// Cloud Tasks client wrapper.
pub struct TasksService {
    project_id: String,
    location: String,
    queue_name: String,
    worker_url: String,
}

impl TasksService {
    pub fn new(project_id: &str, region: &str, worker_url: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            location: region.to_string(),
            queue_name: crate::config::ANALYSIS_QUEUE_NAME.to_string(),
            worker_url: worker_url.trim_end_matches('/').to_string(),
        }
    }

    fn queue_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location, self.queue_name
        )
    }

    /// Generic task queuing helper. Returns the created task's name.
    async fn queue_task<T: Serialize>(&self, endpoint: &str, payload: &T) -> Result<String> {
        use google_cloud_tasks_v2::client::CloudTasks;
        use google_cloud_tasks_v2::model::{HttpRequest, OidcToken, Task};

        let client = CloudTasks::builder()
            .build()
            .await
            .map_err(|e| AppError::Queue(format!("Cloud Tasks client error: {}", e)))?;

        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;

        let http_request = HttpRequest::default()
            .set_url(format!("{}{}", self.worker_url, endpoint))
            .set_http_method("POST")
            .set_body(axum::body::Bytes::from(body))
            .set_headers(std::collections::HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]))
            .set_oidc_token(
                OidcToken::default()
                    .set_service_account_email(format!(
                        "gains-iq-api@{}.iam.gserviceaccount.com",
                        self.project_id
                    ))
                    .set_audience(self.worker_url.clone()),
            );

        let task = Task::default().set_http_request(http_request);

        let created = client
            .create_task()
            .set_parent(self.queue_path())
            .set_task(task)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Cloud Tasks create error: {}", e)))?;

        Ok(created.name)
    }
}

#[async_trait]
impl AnalysisNotifier for TasksService {
    async fn request_analysis(&self, payload: AnalysisRequestPayload) -> Result<String> {
        tracing::info!(username = %payload.username, "Queuing analysis request");
        self.queue_task("/tasks/analyze", &payload).await
    }
}

/// Notifier matching the storage backend.
///
/// The in-memory backend runs without a worker, so its requests are only
/// recorded; Firestore deployments enqueue Cloud Tasks.
pub fn notifier_for(config: &Config) -> Arc<dyn AnalysisNotifier> {
    match config.storage_backend {
        StorageBackend::Firestore => {
            tracing::info!(
                project = %config.gcp_project_id,
                worker = %config.analysis_worker_url,
                "Cloud Tasks service initialized"
            );
            Arc::new(TasksService::new(
                &config.gcp_project_id,
                &config.gcp_region,
                &config.analysis_worker_url,
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("Analysis requests are recorded locally, not enqueued");
            Arc::new(RecordingNotifier::new())
        }
    }
}

/// Notifier that records requests in memory. Used in tests and with the
/// in-memory storage backend.
#[derive(Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<AnalysisRequestPayload>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<AnalysisRequestPayload> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnalysisNotifier for RecordingNotifier {
    async fn request_analysis(&self, payload: AnalysisRequestPayload) -> Result<String> {
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| AppError::Queue("recording notifier lock poisoned".to_string()))?;
        requests.push(payload);
        Ok(format!("local-{}", requests.len()))
    }
}
