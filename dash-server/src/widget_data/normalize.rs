//! Payload normalizers
//!
//! Each normalizer walks [`candidates`] and takes the first payload with a
//! usable shape. With no usable candidate, metric and chart yield their
//! zero/empty value while table and list yield `None`.

use serde_json::{Map, Value};

use shared::models::{
    ChartData, ListData, ListKind, ListProps, MetricData, MetricProps, Record, TableColumn,
    TableData, TableProps, Trend,
};

use super::envelope::candidates;

/// Keys probed, in order, for a metric's headline number
const METRIC_VALUE_KEYS: [&str; 4] = ["value", "total", "count", "amount"];
const METRIC_LABEL_KEYS: [&str; 3] = ["label", "title", "name"];
const LIST_KEYS: [&str; 4] = ["tasks", "alerts", "activities", "items"];

pub fn normalize_metric(body: &Value, props: &MetricProps) -> MetricData {
    candidates(body)
        .into_iter()
        .find_map(|candidate| metric_from(candidate, props))
        .unwrap_or_default()
}

fn metric_from(candidate: &Value, props: &MetricProps) -> Option<MetricData> {
    let fallback_unit = || {
        props
            .unit
            .clone()
            .or_else(|| props.format.map(|f| f.default_unit().to_string()))
            .unwrap_or_default()
    };

    if let Some(value) = number(candidate) {
        return Some(MetricData {
            value,
            unit: fallback_unit(),
            ..Default::default()
        });
    }

    let obj = candidate.as_object()?;
    let value = METRIC_VALUE_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(number))?;

    let unit = obj
        .get("unit")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(fallback_unit);
    let label = METRIC_LABEL_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    Some(MetricData {
        value,
        unit,
        label,
        trend: trend_from(obj),
    })
}

/// `trend: {value, isPositive?, period?}` or a bare `change` number
fn trend_from(obj: &Map<String, Value>) -> Option<Trend> {
    let period = |source: &Map<String, Value>| {
        source
            .get("period")
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    match obj.get("trend") {
        Some(Value::Object(trend)) => {
            let value = trend.get("value").and_then(number)?;
            let is_positive = trend
                .get("isPositive")
                .and_then(Value::as_bool)
                .unwrap_or(value >= 0.0);
            Some(Trend {
                value,
                is_positive,
                period: period(trend),
            })
        }
        Some(other) => number(other).map(|value| Trend {
            value,
            is_positive: value >= 0.0,
            period: period(obj),
        }),
        None => obj.get("change").and_then(number).map(|value| Trend {
            value,
            is_positive: value >= 0.0,
            period: period(obj),
        }),
    }
}

pub fn normalize_chart(body: &Value) -> ChartData {
    candidates(body)
        .into_iter()
        .find_map(chart_from)
        .unwrap_or_default()
}

fn chart_from(candidate: &Value) -> Option<ChartData> {
    let (points, labels) = match candidate {
        Value::Array(points) => (points, None),
        Value::Object(obj) => {
            let points = obj.get("data")?.as_array()?;
            (points, obj.get("labels").and_then(string_list))
        }
        _ => return None,
    };

    let data = points
        .iter()
        .enumerate()
        .map(|(index, point)| match point {
            Value::Object(record) => record.clone(),
            scalar => {
                let mut record = Record::new();
                record.insert("value".into(), scalar.clone());
                if let Some(label) = labels.as_ref().and_then(|l: &Vec<String>| l.get(index)) {
                    record.insert("label".into(), Value::String(label.clone()));
                }
                record
            }
        })
        .collect();

    Some(ChartData { data, labels })
}

/// Table rows with columns from props, then the payload, then the first row
pub fn normalize_table(body: &Value, props: &TableProps) -> Option<TableData> {
    let (payload_columns, rows) = candidates(body).into_iter().find_map(table_from)?;

    let columns = props
        .columns
        .clone()
        .filter(|columns| !columns.is_empty())
        .or(payload_columns)
        .unwrap_or_else(|| infer_columns(&rows));

    Some(TableData { columns, rows })
}

fn table_from(candidate: &Value) -> Option<(Option<Vec<TableColumn>>, Vec<Record>)> {
    match candidate {
        Value::Array(rows) => Some((None, records(rows))),
        Value::Object(obj) => {
            let rows = obj.get("rows")?.as_array()?;
            let columns = obj
                .get("columns")
                .and_then(Value::as_array)
                .map(|cols| cols.iter().filter_map(column_from).collect::<Vec<_>>())
                .filter(|cols| !cols.is_empty());
            Some((columns, records(rows)))
        }
        _ => None,
    }
}

fn column_from(value: &Value) -> Option<TableColumn> {
    match value {
        Value::String(key) => Some(TableColumn {
            key: key.clone(),
            label: key.clone(),
        }),
        Value::Object(obj) => {
            let key = obj
                .get("key")
                .or_else(|| obj.get("field"))
                .and_then(Value::as_str)?;
            let label = obj
                .get("label")
                .or_else(|| obj.get("title"))
                .and_then(Value::as_str)
                .unwrap_or(key);
            Some(TableColumn {
                key: key.to_string(),
                label: label.to_string(),
            })
        }
        _ => None,
    }
}

fn infer_columns(rows: &[Record]) -> Vec<TableColumn> {
    rows.first()
        .map(|row| {
            row.keys()
                .map(|key| TableColumn {
                    key: key.clone(),
                    label: key.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// List entries; a bare array lands under the key native to `kind`
pub fn normalize_list(body: &Value, kind: ListKind, props: &ListProps) -> Option<ListData> {
    let mut data = candidates(body)
        .into_iter()
        .find_map(|candidate| list_from(candidate, kind))?;

    if let Some(max) = props.max_items {
        let max = max as usize;
        for entries in [
            &mut data.tasks,
            &mut data.alerts,
            &mut data.activities,
            &mut data.items,
        ]
        .into_iter()
        .flatten()
        {
            entries.truncate(max);
        }
    }
    Some(data)
}

fn list_from(candidate: &Value, kind: ListKind) -> Option<ListData> {
    match candidate {
        Value::Array(entries) => {
            let entries = Some(records(entries));
            let mut data = ListData::default();
            match kind {
                ListKind::TaskList => data.tasks = entries,
                ListKind::ApprovalQueue => data.items = entries,
                ListKind::Alert => data.alerts = entries,
                ListKind::ActivityTimeline => data.activities = entries,
            }
            Some(data)
        }
        Value::Object(obj) => {
            if !LIST_KEYS.iter().any(|key| obj.get(*key).is_some_and(Value::is_array)) {
                return None;
            }
            let take = |key: &str| obj.get(key).and_then(Value::as_array).map(|a| records(a));
            Some(ListData {
                tasks: take("tasks"),
                alerts: take("alerts"),
                activities: take("activities"),
                items: take("items"),
            })
        }
        _ => None,
    }
}

fn records(values: &[Value]) -> Vec<Record> {
    values
        .iter()
        .map(|value| match value {
            Value::Object(record) => record.clone(),
            scalar => {
                let mut record = Record::new();
                record.insert("value".into(), scalar.clone());
                record
            }
        })
        .collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let labels = value.as_array()?;
    Some(
        labels
            .iter()
            .map(|label| match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}
