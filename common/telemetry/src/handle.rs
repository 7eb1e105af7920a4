use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::global;
use opentelemetry::metrics::MetricsError;
use opentelemetry::trace::TraceError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{BatchConfig, RandomIdGenerator, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::TelemetryConfig;
use crate::error::{FlushError, TelemetryError};
use crate::guard::GLOBAL_HOOKS;
use crate::identity::ServiceIdentity;
use crate::instrumentation::InstrumentationSet;

/// Interval between two periodic metric exports.
pub const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandleState {
    Created,
    Started,
    ShutDown,
}

#[derive(Default)]
struct Pipelines {
    tracer_provider: Option<TracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

/// Owns the process-wide telemetry pipeline: trace exporter, metrics exporter and the
/// `tracing` subscriber bridging to them.
///
/// `create` only records configuration. `start` installs the global hooks and may be
/// called once per process; `shutdown` flushes and releases them. The handle is unusable
/// afterwards.
pub struct TelemetryHandle {
    identity: ServiceIdentity,
    config: TelemetryConfig,
    instrumentations: InstrumentationSet,
    pipelines: Pipelines,
    state: HandleState,
}

impl TelemetryHandle {
    /// No I/O happens here: exporters are only built by [`start`](lifecycle::Telemetry::start).
    pub fn create(identity: ServiceIdentity, config: TelemetryConfig) -> Self {
        Self {
            identity,
            config,
            instrumentations: InstrumentationSet::default(),
            pipelines: Pipelines::default(),
            state: HandleState::Created,
        }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn instrumentations(&self) -> &InstrumentationSet {
        &self.instrumentations
    }

    pub fn is_started(&self) -> bool {
        self.state == HandleState::Started
    }

    fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.config.otel_export_timeout_ms)
    }

    fn install(&mut self) -> Result<(), TelemetryError> {
        let level = LevelFilter::from_level(self.config.otel_log_level);

        // Instantiate tracing outputs:
        //   - stdout with a level configured by the RUST_LOG envvar (default=INFO)
        //   - OpenTelemetry if enabled, for levels `otel_log_level` and higher
        let log_filter = self.instrumentations.suppressions()?.into_iter().fold(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
            EnvFilter::add_directive,
        );
        let otel_filter = self.instrumentations.directives(level)?.into_iter().fold(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .parse_lossy(""),
            EnvFilter::add_directive,
        );

        let resource = self.identity.resource();
        let tracer = match self.config.otel_url.as_deref() {
            Some(url) => Some(init_tracer(
                url,
                self.config.otel_sampling_rate,
                resource.clone(),
                self.export_timeout(),
            )?),
            None => None,
        };
        self.pipelines.tracer_provider = tracer.as_ref().and_then(Tracer::provider);

        if let Some(url) = self.config.metrics_url() {
            let provider = init_meter_provider(url, resource, self.export_timeout())?;
            global::set_meter_provider(provider.clone());
            self.pipelines.meter_provider = Some(provider);
        }

        // SDK-internal failures (export errors, dropped spans) surface as error events only.
        if let Err(e) = global::set_error_handler(|err| error!(target: "opentelemetry", "{err}")) {
            error!("failed to install OpenTelemetry error handler: {e}");
        }

        let log_layer = tracing_subscriber::fmt::layer().with_filter(log_filter);
        let otel_layer = tracer
            .map(OpenTelemetryLayer::new)
            .with_filter(otel_filter);
        tracing_subscriber::registry()
            .with(log_layer)
            .with(otel_layer)
            .try_init()?;

        Ok(())
    }
}

#[async_trait]
impl lifecycle::Telemetry for TelemetryHandle {
    type StartError = TelemetryError;
    type FlushError = FlushError;

    fn start(&mut self) -> Result<(), TelemetryError> {
        match self.state {
            HandleState::Created => {}
            HandleState::Started => return Err(TelemetryError::AlreadyActive),
            HandleState::ShutDown => return Err(TelemetryError::AlreadyShutDown),
        }
        GLOBAL_HOOKS.activate()?;

        if let Err(e) = self.install() {
            let pipelines = std::mem::take(&mut self.pipelines);
            if pipelines.tracer_provider.is_some() {
                global::shutdown_tracer_provider();
            }
            drop(pipelines);
            GLOBAL_HOOKS.abandon();
            return Err(e);
        }

        self.state = HandleState::Started;
        info!(
            service_name = self.identity.name(),
            service_version = self.identity.version(),
            traces = self.config.otel_url.is_some(),
            metrics = self.config.metrics_url().is_some(),
            "telemetry started"
        );
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), FlushError> {
        if self.state != HandleState::Started {
            return Err(FlushError::NotStarted);
        }
        self.state = HandleState::ShutDown;
        let pipelines = std::mem::take(&mut self.pipelines);

        // The SDK flushes by blocking on its exporter tasks, keep that off the async workers.
        let result = tokio::task::spawn_blocking(move || flush(pipelines)).await;
        GLOBAL_HOOKS.retire();
        result?
    }
}

fn flush(pipelines: Pipelines) -> Result<(), FlushError> {
    let mut first_error: Option<FlushError> = None;

    if let Some(provider) = pipelines.tracer_provider {
        for result in provider.force_flush() {
            if let Err(e) = result {
                first_error.get_or_insert(FlushError::Trace(e));
            }
        }
        global::shutdown_tracer_provider();
    }

    if let Some(provider) = pipelines.meter_provider {
        if let Err(e) = provider.force_flush() {
            first_error.get_or_insert(FlushError::Metrics(e));
        }
        if let Err(e) = provider.shutdown() {
            first_error.get_or_insert(FlushError::Metrics(e));
        }
    }

    first_error.map_or(Ok(()), Err)
}

fn init_tracer(
    sink_url: &str,
    sampling_rate: f64,
    resource: Resource,
    timeout: Duration,
) -> Result<Tracer, TraceError> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                    sampling_rate,
                ))))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .with_batch_config(BatchConfig::default())
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(sink_url)
                .with_timeout(timeout),
        )
        .install_batch(runtime::Tokio)
}

fn init_meter_provider(
    sink_url: &str,
    resource: Resource,
    timeout: Duration,
) -> Result<SdkMeterProvider, MetricsError> {
    opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(sink_url)
                .with_timeout(timeout),
        )
        .with_resource(resource)
        .with_period(METRICS_EXPORT_INTERVAL)
        .with_timeout(timeout)
        .build()
}
