//! Comparison runs
//!
//! [`Orchestrator`] executes every planned iteration against the configured
//! APIs and turns each exchange into a [`ComparisonResult`]. Failures of a
//! single call become ERROR rows; a run never aborts half way.

use crate::error::{RunnerError, RunnerResult};
use crate::plan::{operation_label, plan_iterations, PreparedOperation};
use crate::result::{ApiCallResult, BaselineInfo, ComparisonResult, RunSummary};
use drift_baseline::{
    BaselineIteration, BaselineRepository, CaptureSettings, FileBaselineStore, IterationMetadata,
    ResponseMetadata, RunMetadata,
};
use drift_client::{ApiRequest, ApiResponse, HttpTransport, Transport};
use drift_compare::{compare_with_options, CompareOptions};
use drift_config::{BaselineConfig, BaselineOperation, ComparisonMode, Config, ConfigError};
use drift_core::{ApiKind, IterationAssignment};
use drift_iteration::IterationStrategy;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs comparisons for one configuration
pub struct Orchestrator {
    config: Config,
    kind: ApiKind,
    mode: ComparisonMode,
    strategy: IterationStrategy,
    iterations: Vec<IterationAssignment>,
    api1: Arc<dyn Transport>,
    api2: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn BaselineRepository>>,
}

impl Orchestrator {
    /// HTTP transports for the configured APIs and a file store for baselines
    pub fn from_config(config: Config) -> RunnerResult<Self> {
        let api1: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.api1()?.authentication.as_ref())?);

        let api2: Option<Arc<dyn Transport>> = match config.mode()? {
            ComparisonMode::Live => Some(Arc::new(HttpTransport::new(
                config.api2()?.authentication.as_ref(),
            )?)),
            ComparisonMode::Baseline => None,
        };

        let store: Option<Arc<dyn BaselineRepository>> = config
            .baseline
            .as_ref()
            .map(|b| Arc::new(FileBaselineStore::new(&b.storage_dir)) as Arc<dyn BaselineRepository>);

        Self::new(config, api1, api2, store)
    }

    /// Use the given transports and store
    pub fn new(
        config: Config,
        api1: Arc<dyn Transport>,
        api2: Option<Arc<dyn Transport>>,
        store: Option<Arc<dyn BaselineRepository>>,
    ) -> RunnerResult<Self> {
        config.validate()?;
        let kind = config.api_kind()?;
        let mode = config.mode()?;
        let strategy = config.strategy()?;

        match mode {
            ComparisonMode::Live if api2.is_none() => {
                return Err(RunnerError::MissingTransport("api2"))
            }
            ComparisonMode::Baseline if store.is_none() => return Err(RunnerError::MissingStore),
            _ => {}
        }

        // Capped before any request is issued
        let iterations = plan_iterations(&config.token_spec()?, config.max_iterations, strategy);
        debug!("Planned {} iterations ({})", iterations.len(), strategy);

        Ok(Self {
            config,
            kind,
            mode,
            strategy,
            iterations,
            api1,
            api2,
            store,
        })
    }

    pub fn iterations(&self) -> &[IterationAssignment] {
        &self.iterations
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    /// Execute the run; errors are reported as ERROR results
    pub async fn run(&self) -> Vec<ComparisonResult> {
        info!(
            "Starting {} {} comparison with {} iterations",
            self.mode,
            self.kind,
            self.iterations.len()
        );

        let results = match self.mode {
            ComparisonMode::Live => self.run_live().await.unwrap_or_else(|e| {
                error!("Live comparison failed: {}", e);
                vec![failed_run("Live comparison", format!("Live mode failed: {}", e))]
            }),
            ComparisonMode::Baseline => self.run_baseline().await.unwrap_or_else(|e| {
                error!("Error in baseline mode: {}", e);
                vec![failed_run("Baseline run", format!("Baseline mode failed: {}", e))]
            }),
        };

        RunSummary::from_results(&results).log();
        results
    }

    async fn run_live(&self) -> RunnerResult<Vec<ComparisonResult>> {
        let api2_transport = self
            .api2
            .as_ref()
            .ok_or(RunnerError::MissingTransport("api2"))?;
        let api1 = self.config.api1()?;
        let api2 = self.config.api2()?;

        let pairs: Vec<_> = api1
            .operations
            .iter()
            .filter_map(|op1| match api2.operation(&op1.name) {
                Some(op2) => Some((
                    PreparedOperation::new(api1, op1, self.kind),
                    PreparedOperation::new(api2, op2, self.kind),
                )),
                None => {
                    warn!("Operation '{}' not found in api2, skipping", op1.name);
                    None
                }
            })
            .collect();

        let mut results = Vec::with_capacity(self.iterations.len() * pairs.len());
        for (index, assignment) in self.iterations.iter().enumerate() {
            let number = index + 1;
            debug!("Iteration {}: {}", number, assignment);
            for (left, right) in &pairs {
                results.push(
                    self.compare_live(left, right, api2_transport.as_ref(), assignment, number)
                        .await,
                );
            }
        }
        Ok(results)
    }

    async fn compare_live(
        &self,
        left: &PreparedOperation,
        right: &PreparedOperation,
        api2: &dyn Transport,
        assignment: &IterationAssignment,
        number: usize,
    ) -> ComparisonResult {
        let mut result =
            ComparisonResult::new(operation_label(&left.name, number), assignment.clone());

        let (request1, fallback1) = left.request(assignment);
        let (request2, fallback2) = right.request(assignment);
        let (response1, response2) =
            futures::join!(self.api1.send(&request1), api2.send(&request2));

        let mut call1 = request_call(&request1, fallback1);
        let mut call2 = request_call(&request2, fallback2);
        if let Ok(response) = &response1 {
            record_response(&mut call1, response);
        }
        if let Ok(response) = &response2 {
            record_response(&mut call2, response);
        }

        match (&response1, &response2) {
            (Ok(r1), Ok(r2)) => {
                let verdict = compare_with_options(
                    Some(r1.body.as_str()),
                    Some(r2.body.as_str()),
                    self.kind.format(),
                    &CompareOptions::live(),
                );
                result.apply_verdict(verdict);
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Operation {} failed in iteration {}: {}", left.name, number, e);
                result.fail(format!("Operation failed: {}", e));
            }
        }

        result.api1 = Some(call1);
        result.api2 = Some(call2);
        result
    }

    async fn run_baseline(&self) -> RunnerResult<Vec<ComparisonResult>> {
        let baseline = self.config.baseline.as_ref().ok_or_else(|| {
            missing_setting("comparisonMode BASELINE requires a 'baseline' section")
        })?;
        let store = self.store.as_deref().ok_or(RunnerError::MissingStore)?;

        match baseline.operation()? {
            BaselineOperation::Capture => self.capture(baseline, store).await,
            BaselineOperation::Compare => self.compare_baseline(baseline, store).await,
        }
    }

    fn baseline_operation(&self) -> RunnerResult<PreparedOperation> {
        let api = self.config.api1()?;
        let operation = api
            .operations
            .first()
            .ok_or_else(|| missing_setting("api1 has no operations"))?;
        if api.operations.len() > 1 {
            warn!(
                "Baseline mode uses only the first operation '{}' of api1",
                operation.name
            );
        }
        Ok(PreparedOperation::new(api, operation, self.kind))
    }

    async fn capture(
        &self,
        baseline: &BaselineConfig,
        store: &dyn BaselineRepository,
    ) -> RunnerResult<Vec<ComparisonResult>> {
        let service = required(baseline.service_name.as_deref(), "baseline.serviceName")?;
        let operation = self.baseline_operation()?;
        let date = drift_baseline::today();

        // Held until the run is saved
        let _guard = store.lock_captures(service, &date).await;
        let run_id = store.generate_run_id(service, &date).await?;
        let location = store.location(service, &date, &run_id);
        let capture_timestamp = chrono::Local::now().to_rfc3339();
        info!("Capturing baseline {} ({} iterations)", location, self.iterations.len());

        let info = BaselineInfo {
            baseline_service_name: service.to_string(),
            baseline_date: date.clone(),
            baseline_run_id: run_id.clone(),
            baseline_path: location.clone(),
            baseline_description: Some(format!("Baseline captured to: {}", location)),
            baseline_tags: baseline.tags.clone(),
            baseline_capture_timestamp: Some(capture_timestamp.clone()),
        };

        let mut results = Vec::with_capacity(self.iterations.len());
        let mut captured = Vec::with_capacity(self.iterations.len());
        for (index, assignment) in self.iterations.iter().enumerate() {
            let number = index + 1;
            let mut result =
                ComparisonResult::new(operation_label(&operation.name, number), assignment.clone());
            result.baseline = Some(info.clone());

            let (request, fallback) = operation.request(assignment);
            let mut call = request_call(&request, fallback);
            match self.api1.send(&request).await {
                Ok(response) => {
                    record_response(&mut call, &response);
                    captured.push(self.baseline_iteration(
                        number,
                        assignment,
                        &operation,
                        &request,
                        &response,
                    ));
                }
                Err(e) => {
                    error!("Capture of iteration {} failed: {}", number, e);
                    result.fail(format!("Capture failed: {}", e));
                }
            }
            result.api1 = Some(call);
            results.push(result);
        }

        let metadata = RunMetadata {
            run_id,
            service_name: service.to_string(),
            capture_date: date,
            capture_timestamp,
            test_type: self.kind,
            endpoint: operation.url.clone(),
            operation: operation.name.clone(),
            total_iterations: captured.len(),
            description: baseline.description.clone(),
            tags: baseline.tags.clone(),
            config_used: CaptureSettings {
                max_iterations: self.config.max_iterations,
                iteration_controller: self.strategy.as_str().to_string(),
                test_type: self.kind,
            },
        };
        store.save(&metadata, &captured).await?;

        info!(
            "Baseline saved to {} ({} of {} iterations captured)",
            location,
            captured.len(),
            self.iterations.len()
        );
        Ok(results)
    }

    fn baseline_iteration(
        &self,
        number: usize,
        assignment: &IterationAssignment,
        operation: &PreparedOperation,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> BaselineIteration {
        let timestamp = chrono::Local::now().to_rfc3339();
        let content_type = response
            .header("content-type")
            .unwrap_or(self.kind.format().content_type())
            .to_string();

        BaselineIteration {
            iteration_number: number,
            request_payload: request.body.clone().unwrap_or_default(),
            request_headers: request.headers.clone(),
            request_metadata: IterationMetadata {
                iteration_number: number,
                timestamp: timestamp.clone(),
                tokens_used: assignment.to_recorded(),
                endpoint: request.url.clone(),
                method: request.method.clone(),
                soap_action: operation.soap_action(),
                authentication: self.api1.auth_descriptor(),
            },
            response_payload: response.body.clone(),
            response_headers: response.headers.clone(),
            response_metadata: ResponseMetadata {
                status_code: response.status,
                duration: response.duration_ms,
                timestamp,
                content_type: Some(content_type),
            },
        }
    }

    async fn compare_baseline(
        &self,
        baseline: &BaselineConfig,
        store: &dyn BaselineRepository,
    ) -> RunnerResult<Vec<ComparisonResult>> {
        let service = required(baseline.service_name.as_deref(), "baseline.serviceName")?;
        let date = required(baseline.compare_date.as_deref(), "baseline.compareDate")?;
        let run_id = required(baseline.compare_run_id.as_deref(), "baseline.compareRunId")?;

        let run = store.load(service, date, run_id).await?;
        let location = store.location(service, date, run_id);
        let operation = self.baseline_operation()?;

        if run.metadata.test_type != self.kind {
            warn!(
                "Baseline {} was captured as {} but this run is {}",
                location, run.metadata.test_type, self.kind
            );
        }
        if run.metadata.operation != operation.name {
            warn!(
                "Baseline {} was captured for operation '{}', comparing '{}'",
                location, run.metadata.operation, operation.name
            );
        }
        info!(
            "Comparing against baseline {} ({} iterations)",
            location,
            run.iterations.len()
        );

        let info = BaselineInfo {
            baseline_service_name: service.to_string(),
            baseline_date: date.to_string(),
            baseline_run_id: run_id.to_string(),
            baseline_path: location,
            baseline_description: run.metadata.description.clone(),
            baseline_tags: run.metadata.tags.clone(),
            baseline_capture_timestamp: Some(run.metadata.capture_timestamp.clone()),
        };

        let mut results = Vec::with_capacity(run.iterations.len());
        for stored in &run.iterations {
            let number = stored.iteration_number;
            let assignment = IterationAssignment::from_recorded(&stored.request_metadata.tokens_used);
            let mut result =
                ComparisonResult::new(operation_label(&operation.name, number), assignment.clone());
            result.baseline = Some(info.clone());
            result.api2 = Some(stored_call(stored));

            let (request, fallback) = operation.request(&assignment);
            let mut call = request_call(&request, fallback);
            match self.api1.send(&request).await {
                Ok(response) => {
                    record_response(&mut call, &response);
                    let verdict = compare_with_options(
                        Some(response.body.as_str()),
                        Some(stored.response_payload.as_str()),
                        self.kind.format(),
                        &CompareOptions::baseline(),
                    );
                    result.apply_verdict(verdict);
                }
                Err(e) => {
                    error!("Comparison of iteration {} failed: {}", number, e);
                    result.fail(format!("Comparison failed: {}", e));
                }
            }
            result.api1 = Some(call);
            results.push(result);
        }
        Ok(results)
    }
}

fn failed_run(name: &str, message: String) -> ComparisonResult {
    let mut result = ComparisonResult::new(name, IterationAssignment::empty());
    result.fail(message);
    result
}

fn missing_setting(message: &str) -> RunnerError {
    RunnerError::Config(ConfigError::ValidationFailed {
        message: message.to_string(),
    })
}

fn required<'a>(value: Option<&'a str>, key: &str) -> RunnerResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing_setting(&format!("{} is required in BASELINE mode", key)))
}

fn request_call(request: &ApiRequest, payload_fallback: Option<String>) -> ApiCallResult {
    ApiCallResult {
        url: request.url.clone(),
        method: request.method.clone(),
        request_headers: request.headers.clone(),
        request_payload: request.body.clone(),
        payload_fallback,
        ..ApiCallResult::default()
    }
}

fn record_response(call: &mut ApiCallResult, response: &ApiResponse) {
    call.status_code = Some(response.status);
    call.response_headers = response.headers.clone();
    call.response_payload = Some(response.body.clone());
    call.duration = response.duration_ms;
}

fn stored_call(stored: &BaselineIteration) -> ApiCallResult {
    ApiCallResult {
        url: stored.request_metadata.endpoint.clone(),
        method: stored.request_metadata.method.clone(),
        request_headers: stored.request_headers.clone(),
        request_payload: Some(stored.request_payload.clone()),
        status_code: Some(stored.response_metadata.status_code),
        response_headers: stored.response_headers.clone(),
        response_payload: Some(stored.response_payload.clone()),
        duration: stored.response_metadata.duration,
        payload_fallback: None,
    }
}
