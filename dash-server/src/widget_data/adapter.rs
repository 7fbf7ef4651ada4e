//! Widget data adapter
//!
//! Metric and chart widgets never surface an error: a failed or unusable
//! fetch degrades to zero/empty and is logged. Table and list widgets
//! propagate fetch failures and unusable payloads so the renderer can
//! offer a retry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ChartData, ListData, ListKind, ListProps, MetricData, MetricProps, TableData, TableProps,
    WidgetConfig, WidgetData, WidgetKind,
};
use shared::store::WidgetBackend;

use super::envelope::candidates;
use super::normalize::{normalize_chart, normalize_list, normalize_metric, normalize_table};

/// Failure of a propagating widget family
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("widget '{0}' has no data source")]
    NoDataSource(String),

    #[error("widget '{0}' returned a payload of unusable shape")]
    Payload(String),

    #[error(transparent)]
    Fetch(#[from] AppError),
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NoDataSource(widget_id) => AppError::with_message(
                ErrorCode::WidgetNoDataSource,
                format!("Widget '{}' has no data source", widget_id),
            )
            .with_detail("widget_id", widget_id),
            AdapterError::Payload(widget_id) => AppError::widget_payload(format!(
                "Widget '{}' returned a payload of unusable shape",
                widget_id
            ))
            .with_detail("widget_id", widget_id),
            AdapterError::Fetch(e) => e,
        }
    }
}

/// Fetches widget data through a [`WidgetBackend`] and normalizes it
#[derive(Clone)]
pub struct WidgetDataAdapter {
    backend: Arc<dyn WidgetBackend>,
    timeout: Duration,
}

impl WidgetDataAdapter {
    pub fn new(backend: Arc<dyn WidgetBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    async fn fetch(&self, widget: &WidgetConfig) -> Result<Value, AdapterError> {
        let source = widget
            .data_source
            .as_ref()
            .ok_or_else(|| AdapterError::NoDataSource(widget.id.clone()))?;

        match tokio::time::timeout(self.timeout, self.backend.fetch(source)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::timeout(format!(
                "Widget '{}' fetch timed out after {}ms",
                widget.id,
                self.timeout.as_millis()
            ))
            .with_detail("endpoint", source.endpoint.clone())
            .into()),
        }
    }

    pub async fn metric(&self, widget: &WidgetConfig, props: &MetricProps) -> MetricData {
        match self.fetch(widget).await {
            Ok(body) => normalize_metric(&body, props),
            Err(e) => {
                tracing::warn!(widget_id = %widget.id, error = %e, "Metric fetch failed, showing zero");
                MetricData::default()
            }
        }
    }

    pub async fn chart(&self, widget: &WidgetConfig) -> ChartData {
        match self.fetch(widget).await {
            Ok(body) => normalize_chart(&body),
            Err(e) => {
                tracing::warn!(widget_id = %widget.id, error = %e, "Chart fetch failed, showing empty chart");
                ChartData::default()
            }
        }
    }

    pub async fn table(&self, widget: &WidgetConfig, props: &TableProps) -> Result<TableData, AdapterError> {
        let body = self.fetch(widget).await?;
        normalize_table(&body, props).ok_or_else(|| AdapterError::Payload(widget.id.clone()))
    }

    pub async fn list(
        &self,
        widget: &WidgetConfig,
        kind: ListKind,
        props: &ListProps,
    ) -> Result<ListData, AdapterError> {
        let body = self.fetch(widget).await?;
        normalize_list(&body, kind, props).ok_or_else(|| AdapterError::Payload(widget.id.clone()))
    }

    /// Load data for any widget kind
    ///
    /// Custom widgets receive the first envelope candidate untouched.
    pub async fn load(&self, widget: &WidgetConfig) -> Result<WidgetData, AdapterError> {
        let data = match &widget.kind {
            WidgetKind::Metric(props) => WidgetData::Metric(self.metric(widget, props).await),
            WidgetKind::Chart(_) => WidgetData::Chart(self.chart(widget).await),
            WidgetKind::Table(props) => WidgetData::Table(self.table(widget, props).await?),
            WidgetKind::List(kind, props) => WidgetData::List(self.list(widget, *kind, props).await?),
            WidgetKind::Custom(_) => {
                let body = self.fetch(widget).await?;
                let payload = candidates(&body).first().map(|v| (*v).clone()).unwrap_or(Value::Null);
                WidgetData::Custom(payload)
            }
        };
        Ok(data)
    }
}
