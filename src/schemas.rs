//! Resource documents returned by the HERMES service.
//!
//! Only the fields the client tiers rely on are strict; everything else is
//! optional so that additions on the service side do not break decoding.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state shared by forecasts and model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pending,
    Scheduled,
    Paused,
    Running,
    Cancelled,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "PENDING",
            Status::Scheduled => "SCHEDULED",
            Status::Paused => "PAUSED",
            Status::Running => "RUNNING",
            Status::Cancelled => "CANCELLED",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(alias = "oid")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub starttime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub endtime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub creationinfo: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionPlan {
    #[serde(default, alias = "oid")]
    pub id: Option<Uuid>,
    pub name: String,
    /// Hydraulics document of the plan, only present on the full template.
    #[serde(default)]
    pub borehole_hydraulics: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, alias = "oid")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw result type tag, e.g. `GRID` or `CATALOG`.
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub sfm_module: Option<String>,
    #[serde(default)]
    pub sfm_function: Option<String>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub model_parameters: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

fn enabled_default() -> bool {
    true
}

/// A forecast series as listed under a project, or its full metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeriesInfo {
    #[serde(alias = "oid")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, alias = "project_oid")]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
    /// Series-level state, kept as the service spells it.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// WKT polygon, kept verbatim.
    #[serde(default)]
    pub bounding_polygon: Option<String>,
    #[serde(default)]
    pub depth_min: Option<f64>,
    #[serde(default)]
    pub depth_max: Option<f64>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub observation_starttime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub observation_endtime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub observation_window: Option<i64>,
    #[serde(default)]
    pub forecastinterval: Option<i64>,
    #[serde(default)]
    pub fdsnws_url: Option<String>,
    #[serde(default)]
    pub hydws_url: Option<String>,
    #[serde(default)]
    pub creationinfo: Option<Value>,
    /// Settings passed to every model of the series.
    #[serde(default)]
    pub model_settings: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub injectionplans: Vec<InjectionPlan>,
    /// Usually names only; see `ForecastSeries::modelconfig_details` for full configs.
    #[serde(default, deserialize_with = "nullable")]
    pub modelconfigs: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInfo {
    #[serde(alias = "oid")]
    pub id: Uuid,
    #[serde(default = "unknown_status")]
    pub status: Status,
    #[serde(default, deserialize_with = "service_time::option")]
    pub starttime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "service_time::option")]
    pub endtime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub creationinfo: Option<Value>,
    #[serde(default, deserialize_with = "sorted_names")]
    pub injectionplans: Vec<String>,
    #[serde(default, deserialize_with = "sorted_names")]
    pub modelconfigs: Vec<String>,
    /// Model runs embedded in the forecast document.
    #[serde(default, deserialize_with = "nullable")]
    pub modelruns: Vec<ModelRunInfo>,
}

fn unknown_status() -> Status {
    Status::Unknown
}

impl ForecastInfo {
    /// Whether `time` falls in `[starttime, endtime)`. False while either bound is unset.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        match (self.starttime, self.endtime) {
            (Some(start), Some(end)) => start <= time && time < end,
            _ => false,
        }
    }
}

/// The computation behind one (injection plan, model config) pair of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawModelRun")]
pub struct ModelRunInfo {
    pub id: Uuid,
    pub status: Status,
    pub modelconfig: Option<String>,
    pub injectionplan: Option<String>,
    pub result_type: Option<String>,
}

impl ModelRunInfo {
    pub fn matches(&self, injectionplan: &str, modelconfig: &str) -> bool {
        self.injectionplan.as_deref() == Some(injectionplan)
            && self.modelconfig.as_deref() == Some(modelconfig)
    }
}

// Model runs embed their config and plan either by name or as documents.
#[derive(Deserialize)]
struct RawModelRun {
    #[serde(alias = "oid")]
    id: Uuid,
    #[serde(default = "unknown_status")]
    status: Status,
    #[serde(default)]
    modelconfig: Option<NameRef>,
    #[serde(default)]
    injectionplan: Option<NameRef>,
    #[serde(default)]
    result_type: Option<String>,
}

impl From<RawModelRun> for ModelRunInfo {
    fn from(raw: RawModelRun) -> Self {
        let nested_type = match &raw.modelconfig {
            Some(NameRef::Document { result_type, .. }) => result_type.clone(),
            _ => None,
        };
        ModelRunInfo {
            id: raw.id,
            status: raw.status,
            result_type: raw.result_type.or(nested_type),
            modelconfig: raw.modelconfig.map(NameRef::into_name),
            injectionplan: raw.injectionplan.map(NameRef::into_name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameRef {
    Name(String),
    Document {
        name: String,
        #[serde(default)]
        result_type: Option<String>,
    },
}

impl NameRef {
    fn into_name(self) -> String {
        match self {
            NameRef::Name(name) | NameRef::Document { name, .. } => name,
        }
    }
}

// `null` and a missing key both mean an empty list.
fn nullable<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn sorted_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Option::<Vec<NameRef>>::deserialize(deserializer)?.unwrap_or_default();
    let mut names: Vec<String> = refs.into_iter().map(NameRef::into_name).collect();
    names.sort();
    Ok(names)
}

/// Service timestamps are ISO-8601, usually without an offset; naive values are UTC.
pub(crate) mod service_time {
    use super::*;

    pub(crate) fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Some(t.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|t| t.and_utc())
    }

    pub(crate) fn required<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {s:?}")))
    }

    pub(crate) fn option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {s:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const FC: &str = "1d0f4c1e-9b6e-4e55-a7f6-0b0d1a1b2c3d";
    const MR: &str = "5b1c2d3e-4f50-4a6b-8c7d-9e0f1a2b3c4d";

    #[test]
    fn timestamps_accept_naive_fractional_and_offset_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        for s in [
            "2024-01-01T10:00:00",
            "2024-01-01T10:00:00.000000",
            "2024-01-01T10:00:00Z",
            "2024-01-01T11:00:00+01:00",
            "2024-01-01 10:00:00",
        ] {
            assert_eq!(service_time::parse(s), Some(expected), "{s}");
        }
        assert_eq!(service_time::parse("yesterday"), None);
    }

    #[test]
    fn forecast_names_are_flattened_and_sorted() {
        let info: ForecastInfo = serde_json::from_value(json!({
            "oid": FC,
            "status": "COMPLETED",
            "starttime": "2024-01-01T10:00:00",
            "endtime": "2024-01-01T11:00:00",
            "injectionplans": [{"name": "plan-b"}, {"name": "plan-a"}],
            "modelconfigs": ["etas", "em1"]
        }))
        .unwrap();

        assert_eq!(info.status, Status::Completed);
        assert_eq!(info.injectionplans, vec!["plan-a", "plan-b"]);
        assert_eq!(info.modelconfigs, vec!["em1", "etas"]);
    }

    #[test]
    fn forecast_interval_is_half_open() {
        let info: ForecastInfo = serde_json::from_value(json!({
            "oid": FC,
            "starttime": "2024-01-01T10:00:00",
            "endtime": "2024-01-01T11:00:00"
        }))
        .unwrap();

        assert_eq!(info.status, Status::Unknown);
        assert!(info.contains(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
        assert!(info.contains(Utc.with_ymd_and_hms(2024, 1, 1, 10, 59, 59).unwrap()));
        assert!(!info.contains(Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()));
    }

    #[test]
    fn unknown_status_strings_do_not_fail() {
        let s: Status = serde_json::from_value(json!("ARCHIVED")).unwrap();
        assert_eq!(s, Status::Unknown);
    }

    #[test]
    fn modelrun_reads_nested_documents() {
        let run: ModelRunInfo = serde_json::from_value(json!({
            "oid": MR,
            "status": "COMPLETED",
            "modelconfig": {"name": "etas", "result_type": "CATALOG"},
            "injectionplan": {"name": "plan-a", "borehole_hydraulics": {}}
        }))
        .unwrap();

        assert_eq!(run.modelconfig.as_deref(), Some("etas"));
        assert_eq!(run.injectionplan.as_deref(), Some("plan-a"));
        assert_eq!(run.result_type.as_deref(), Some("CATALOG"));
        assert!(run.matches("plan-a", "etas"));
        assert!(!run.matches("plan-a", "ETAS"));
    }

    #[test]
    fn modelrun_prefers_its_own_result_type() {
        let run: ModelRunInfo = serde_json::from_value(json!({
            "id": MR,
            "modelconfig": {"name": "em1", "result_type": "CATALOG"},
            "injectionplan": "plan-a",
            "result_type": "GRID"
        }))
        .unwrap();

        assert_eq!(run.status, Status::Unknown);
        assert_eq!(run.result_type.as_deref(), Some("GRID"));
    }

    #[test]
    fn modelrun_without_plan_matches_nothing() {
        let run: ModelRunInfo = serde_json::from_value(json!({
            "oid": MR,
            "modelconfig": "em1",
            "injectionplan": null
        }))
        .unwrap();

        assert_eq!(run.injectionplan, None);
        assert!(!run.matches("", "em1"));
    }

    #[test]
    fn series_metadata_defaults_optional_parts() {
        let fs: ForecastSeriesInfo = serde_json::from_value(json!({
            "oid": FC,
            "name": "fs1",
            "project_oid": MR
        }))
        .unwrap();

        assert_eq!(fs.project_id, Some(Uuid::parse_str(MR).unwrap()));
        assert!(fs.modelconfigs.is_empty());
        assert!(fs.injectionplans.is_empty());
        assert_eq!(fs.model_settings, Value::Null);
    }

    #[test]
    fn null_lists_read_as_empty() {
        let fs: ForecastSeriesInfo = serde_json::from_value(json!({
            "oid": FC,
            "name": "fs1",
            "status": "ACTIVE",
            "tags": null,
            "injectionplans": null,
            "modelconfigs": null,
            "model_settings": null
        }))
        .unwrap();

        assert!(fs.tags.is_empty());
        assert!(fs.injectionplans.is_empty());
        assert!(fs.modelconfigs.is_empty());
        assert_eq!(fs.status.as_deref(), Some("ACTIVE"));

        let config: ModelConfig =
            serde_json::from_value(json!({"name": "em1", "tags": null})).unwrap();
        assert!(config.tags.is_empty());
    }

    #[test]
    fn forecast_without_times_contains_nothing() {
        let info: ForecastInfo = serde_json::from_value(json!({
            "oid": FC,
            "status": "PENDING",
            "starttime": "2024-01-01T10:00:00",
            "endtime": null,
            "injectionplans": null,
            "modelconfigs": null,
            "modelruns": null
        }))
        .unwrap();

        assert_eq!(info.endtime, None);
        assert!(info.modelruns.is_empty());
        assert!(!info.contains(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn forecast_document_embeds_modelruns() {
        let info: ForecastInfo = serde_json::from_value(json!({
            "oid": FC,
            "status": "COMPLETED",
            "starttime": "2024-01-01T10:00:00",
            "endtime": "2024-01-01T11:00:00",
            "modelruns": [{
                "oid": MR,
                "status": "COMPLETED",
                "modelconfig": {"name": "em1", "result_type": "GRID"},
                "injectionplan": {"name": "low"}
            }]
        }))
        .unwrap();

        assert_eq!(info.modelruns.len(), 1);
        assert!(info.modelruns[0].matches("low", "em1"));
        assert_eq!(info.modelruns[0].result_type.as_deref(), Some("GRID"));
    }
}
