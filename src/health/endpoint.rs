//! A reporting surface: which probes, which body, which status codes.

use axum::http::StatusCode;

use crate::config::schema::HealthEndpointConfig;
use crate::health::mapper::StatusMapper;
use crate::health::registry::Selection;
use crate::health::report::ReportShape;
use crate::health::scheduler::{HealthCheckService, HealthReport};

/// Rendered endpoint output, ready for the response sink.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub status_code: StatusCode,
    pub body: String,
    pub report: HealthReport,
}

#[derive(Debug, Clone)]
pub struct HealthEndpoint {
    service: HealthCheckService,
    selection: Selection,
    mapper: StatusMapper,
    shape: ReportShape,
}

impl HealthEndpoint {
    /// Create an endpoint from its parts.
    pub fn new(
        service: HealthCheckService,
        selection: Selection,
        mapper: StatusMapper,
        shape: ReportShape,
    ) -> Self {
        Self {
            service,
            selection,
            mapper,
            shape,
        }
    }

    /// Build an endpoint from its configuration section.
    pub fn from_config(
        service: HealthCheckService,
        config: &HealthEndpointConfig,
    ) -> Result<Self, axum::http::status::InvalidStatusCode> {
        let selection = if config.include_tagged {
            Selection::Tagged(config.tag.clone())
        } else {
            Selection::Untagged(config.tag.clone())
        };
        let mapper = StatusMapper::from_config(&config.status_codes)?;
        Ok(Self::new(service, selection, mapper, config.shape))
    }

    /// Get the probe selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Run the selected probes and render the configured body.
    pub async fn evaluate(&self) -> Result<RenderedReport, serde_json::Error> {
        let report = self.service.run(&self.selection).await;
        let body = self.shape.render(&report)?;
        Ok(RenderedReport {
            status_code: self.mapper.map(report.status),
            body,
            report,
        })
    }
}
