//! Forecast result payloads: rate grids and synthetic catalogs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::schemas::service_time;

/// Result type recorded on a model config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultType {
    Grid,
    Catalog,
    /// Binned rates. Known to the service, not decoded by this crate.
    Bins,
}

impl ResultType {
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("GRID") {
            Some(ResultType::Grid)
        } else if tag.eq_ignore_ascii_case("CATALOG") {
            Some(ResultType::Catalog)
        } else if tag.eq_ignore_ascii_case("BINS") {
            Some(ResultType::Bins)
        } else {
            None
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultType::Grid => "GRID",
            ResultType::Catalog => "CATALOG",
            ResultType::Bins => "BINS",
        })
    }
}

/// Results of one model run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResultPayload {
    /// One grid per forecast window.
    RateGrid(Vec<RateGrid>),
    /// One catalog per realization.
    Catalog(Vec<Catalog>),
}

impl ResultPayload {
    pub fn result_type(&self) -> ResultType {
        match self {
            ResultPayload::RateGrid(_) => ResultType::Grid,
            ResultPayload::Catalog(_) => ResultType::Catalog,
        }
    }

    pub fn as_rate_grids(&self) -> Option<&[RateGrid]> {
        match self {
            ResultPayload::RateGrid(grids) => Some(grids),
            ResultPayload::Catalog(_) => None,
        }
    }

    pub fn as_catalogs(&self) -> Option<&[Catalog]> {
        match self {
            ResultPayload::Catalog(catalogs) => Some(catalogs),
            ResultPayload::RateGrid(_) => None,
        }
    }
}

/// Gutenberg-Richter rates of every cell for one forecast window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateGrid {
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub cells: Vec<RateCell>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RateCell {
    #[serde(default, alias = "realization_id")]
    pub grid_id: Option<i64>,
    #[serde(default, deserialize_with = "quantity")]
    pub latitude_min: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub latitude_max: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub longitude_min: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub longitude_max: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub depth_min: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub depth_max: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub number_events: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub a: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub b: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub mc: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub alpha: Option<f64>,
}

#[derive(Deserialize)]
pub(crate) struct RateRow {
    #[serde(deserialize_with = "service_time::required")]
    starttime: DateTime<Utc>,
    #[serde(deserialize_with = "service_time::required")]
    endtime: DateTime<Utc>,
    #[serde(flatten)]
    cell: RateCell,
}

/// One synthetic event catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub realization_id: Option<i64>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "service_time::required")]
    pub time: DateTime<Utc>,
    #[serde(default, deserialize_with = "quantity")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub depth: Option<f64>,
    #[serde(default, deserialize_with = "quantity")]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub magnitude_type: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct EventRow {
    #[serde(default)]
    realization_id: Option<i64>,
    #[serde(flatten)]
    event: Event,
}

/// Rates of one model run, as listed per forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRunRates {
    pub modelrun_id: Option<Uuid>,
    pub modelconfig: Option<String>,
    pub injectionplan: Option<String>,
    pub grids: Vec<RateGrid>,
}

#[derive(Deserialize)]
pub(crate) struct RawModelRunRates {
    #[serde(default, alias = "modelrun_oid", alias = "oid")]
    modelrun_id: Option<Uuid>,
    #[serde(default, alias = "modelconfig_name")]
    modelconfig: Option<String>,
    #[serde(default, alias = "injectionplan_name")]
    injectionplan: Option<String>,
    #[serde(default)]
    rateforecasts: Vec<RateRow>,
}

impl From<RawModelRunRates> for ModelRunRates {
    fn from(raw: RawModelRunRates) -> Self {
        ModelRunRates {
            modelrun_id: raw.modelrun_id,
            modelconfig: raw.modelconfig,
            injectionplan: raw.injectionplan,
            grids: group_rates(raw.rateforecasts),
        }
    }
}

/// Body of `modelruns/{id}/rates`: either wrapped in `rateforecasts` or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RateRows {
    Wrapped { rateforecasts: Vec<RateRow> },
    Bare(Vec<RateRow>),
}

impl RateRows {
    pub(crate) fn into_grids(self) -> Vec<RateGrid> {
        match self {
            RateRows::Wrapped { rateforecasts } => group_rates(rateforecasts),
            RateRows::Bare(rows) => group_rates(rows),
        }
    }
}

/// Body of `modelruns/{id}/catalogs`: either wrapped in `events` or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum EventRows {
    Wrapped { events: Vec<EventRow> },
    Bare(Vec<EventRow>),
}

impl EventRows {
    pub(crate) fn into_catalogs(self) -> Vec<Catalog> {
        match self {
            EventRows::Wrapped { events } => group_events(events),
            EventRows::Bare(rows) => group_events(rows),
        }
    }
}

fn group_rates(rows: Vec<RateRow>) -> Vec<RateGrid> {
    let mut index: HashMap<(DateTime<Utc>, DateTime<Utc>), usize> = HashMap::new();
    let mut grids: Vec<RateGrid> = Vec::new();

    for row in rows {
        let i = *index.entry((row.starttime, row.endtime)).or_insert_with(|| {
            grids.push(RateGrid {
                starttime: row.starttime,
                endtime: row.endtime,
                cells: Vec::new(),
            });
            grids.len() - 1
        });
        grids[i].cells.push(row.cell);
    }
    grids
}

fn group_events(rows: Vec<EventRow>) -> Vec<Catalog> {
    let mut index: HashMap<Option<i64>, usize> = HashMap::new();
    let mut catalogs: Vec<Catalog> = Vec::new();

    for row in rows {
        let i = *index.entry(row.realization_id).or_insert_with(|| {
            catalogs.push(Catalog {
                realization_id: row.realization_id,
                events: Vec::new(),
            });
            catalogs.len() - 1
        });
        catalogs[i].events.push(row.event);
    }
    catalogs
}

// QuakeML-style values come either bare or as {"value": x, "uncertainty": ...}.
fn quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Scalar(f64),
        Object {
            #[serde(default)]
            value: Option<f64>,
        },
    }

    Ok(match Option::<Quantity>::deserialize(deserializer)? {
        None => None,
        Some(Quantity::Scalar(v)) => Some(v),
        Some(Quantity::Object { value }) => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn result_type_tags() {
        assert_eq!(ResultType::parse("GRID"), Some(ResultType::Grid));
        assert_eq!(ResultType::parse("catalog"), Some(ResultType::Catalog));
        assert_eq!(ResultType::parse("BINS"), Some(ResultType::Bins));
        assert_eq!(ResultType::parse("HISTOGRAM"), None);
        assert_eq!(ResultType::Catalog.to_string(), "CATALOG");
    }

    #[test]
    fn rate_rows_group_by_window_in_first_seen_order() {
        let rows: RateRows = serde_json::from_value(json!({
            "rateforecasts": [
                {"starttime": "2024-01-01T11:00:00", "endtime": "2024-01-01T12:00:00",
                 "realization_id": 0, "number_events": {"value": 1.5}, "b": 1.0},
                {"starttime": "2024-01-01T10:00:00", "endtime": "2024-01-01T11:00:00",
                 "realization_id": 0, "number_events": {"value": 2.0, "uncertainty": 0.1}},
                {"starttime": "2024-01-01T11:00:00", "endtime": "2024-01-01T12:00:00",
                 "realization_id": 1, "number_events": 0.5, "mc": null}
            ]
        }))
        .unwrap();

        let grids = rows.into_grids();
        assert_eq!(grids.len(), 2);
        assert_eq!(
            grids[0].starttime,
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(grids[0].cells.len(), 2);
        assert_eq!(grids[0].cells[0].number_events, Some(1.5));
        assert_eq!(grids[0].cells[0].b, Some(1.0));
        assert_eq!(grids[0].cells[1].grid_id, Some(1));
        assert_eq!(grids[0].cells[1].mc, None);
        assert_eq!(grids[1].cells[0].number_events, Some(2.0));
    }

    #[test]
    fn bare_rate_list_is_accepted() {
        let rows: RateRows = serde_json::from_value(json!([
            {"starttime": "2024-01-01T10:00:00", "endtime": "2024-01-01T11:00:00", "a": -1.2}
        ]))
        .unwrap();
        let grids = rows.into_grids();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].cells[0].a, Some(-1.2));
    }

    #[test]
    fn events_group_by_realization() {
        let rows: EventRows = serde_json::from_value(json!([
            {"realization_id": 3, "time": "2024-01-01T10:05:00",
             "magnitude": {"value": 1.1}, "latitude": 47.0, "magnitude_type": "Mw"},
            {"realization_id": 1, "time": "2024-01-01T10:06:00", "magnitude": 0.4},
            {"realization_id": 3, "time": "2024-01-01T10:07:00", "magnitude": 2.0}
        ]))
        .unwrap();

        let catalogs = rows.into_catalogs();
        assert_eq!(catalogs.len(), 2);
        assert_eq!(catalogs[0].realization_id, Some(3));
        assert_eq!(catalogs[0].events.len(), 2);
        assert_eq!(catalogs[0].events[0].magnitude, Some(1.1));
        assert_eq!(catalogs[0].events[0].magnitude_type.as_deref(), Some("Mw"));
        assert_eq!(catalogs[1].events[0].magnitude, Some(0.4));
    }

    #[test]
    fn payload_reports_its_type() {
        let grid = ResultPayload::RateGrid(vec![]);
        let catalog = ResultPayload::Catalog(vec![]);
        assert_eq!(grid.result_type(), ResultType::Grid);
        assert_eq!(catalog.result_type(), ResultType::Catalog);
        assert!(grid.as_catalogs().is_none());
        assert_eq!(catalog.as_catalogs().map(|c| c.len()), Some(0));
    }
}
