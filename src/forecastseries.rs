use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Reverse;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Query};
use crate::forecast::{Forecast, SeriesContext, SeriesModelConfigs};
use crate::schemas::{ForecastInfo, ForecastSeriesInfo, InjectionPlan, ModelConfig, Status};
use crate::util::cached;

/// How [`ForecastSeries::find_forecast`] picks a forecast for a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSelection {
    /// The forecast whose `[starttime, endtime)` contains the time.
    #[default]
    Containing,
    /// The forecast whose start time is closest to the time.
    Nearest,
    /// The latest forecast starting at or before the time.
    Previous,
    /// The earliest forecast starting at or after the time.
    Next,
}

/// Client bound to one forecast series.
///
/// Metadata and the forecast list are fetched on first access and kept for the
/// lifetime of the value; later changes on the service are not observed.
#[derive(Debug)]
pub struct ForecastSeries {
    fetcher: Fetcher,
    id: Uuid,
    metadata: OnceLock<ForecastSeriesInfo>,
    forecasts: OnceLock<Vec<Forecast>>,
    injectionplan_templates: OnceLock<Vec<InjectionPlan>>,
    modelconfig_details: Arc<SeriesModelConfigs>,
}

impl ForecastSeries {
    pub(crate) fn new(fetcher: Fetcher, id: Uuid) -> Self {
        Self {
            modelconfig_details: Arc::new(SeriesModelConfigs::new(fetcher.clone(), id)),
            fetcher,
            id,
            metadata: OnceLock::new(),
            forecasts: OnceLock::new(),
            injectionplan_templates: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn metadata(&self) -> Result<&ForecastSeriesInfo> {
        cached(&self.metadata, || {
            debug!(forecastseries = %self.id, "fetching forecast series metadata");
            self.fetcher
                .fetch(&format!("forecastseries/{}", self.id), &Query::new())
        })
    }

    /// Model settings passed to every model of the series.
    pub fn modelsettings(&self) -> Result<&Value> {
        Ok(&self.metadata()?.model_settings)
    }

    pub fn injectionplans(&self) -> Result<&[InjectionPlan]> {
        Ok(self.metadata()?.injectionplans.as_slice())
    }

    /// Model configs as embedded in the metadata, usually reduced to their names.
    pub fn modelconfigs(&self) -> Result<&[ModelConfig]> {
        Ok(self.metadata()?.modelconfigs.as_slice())
    }

    /// Full model configs of the series, including result types and parameters.
    ///
    /// Fetched once and shared with this series' forecasts.
    pub fn modelconfig_details(&self) -> Result<&[ModelConfig]> {
        self.modelconfig_details.get()
    }

    pub fn injectionplan_names(&self) -> Result<Vec<&str>> {
        let mut names: Vec<&str> = self
            .injectionplans()?
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    pub fn modelconfig_names(&self) -> Result<Vec<&str>> {
        let mut names: Vec<&str> = self
            .modelconfigs()?
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Injection plan templates including their hydraulics, sorted by name.
    pub fn injectionplan_templates(&self) -> Result<&[InjectionPlan]> {
        let plans = cached(&self.injectionplan_templates, || {
            let mut plans: Vec<InjectionPlan> = self.fetcher.fetch(
                &format!("forecastseries/{}/injectionplans", self.id),
                &Query::new(),
            )?;
            plans.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(plans)
        })?;
        Ok(plans.as_slice())
    }

    /// Forecasts of the series in the order the service lists them.
    ///
    /// Built once; every call returns the same `Forecast` values.
    pub fn forecasts(&self) -> Result<&[Forecast]> {
        let forecasts = cached(&self.forecasts, || {
            let context = Arc::new(SeriesContext::from_series(
                self.metadata()?,
                Arc::clone(&self.modelconfig_details),
            ));
            let entries: Vec<ForecastInfo> = self
                .fetcher
                .fetch(&format!("forecastseries/{}/forecasts", self.id), &Query::new())?;
            debug!(forecastseries = %self.id, count = entries.len(), "building forecasts");
            Ok(entries
                .into_iter()
                .map(|entry| Forecast::new(self.fetcher.clone(), entry, Arc::clone(&context)))
                .collect())
        })?;
        Ok(forecasts.as_slice())
    }

    /// The first forecast whose `[starttime, endtime)` contains `time`.
    pub fn get_forecast_by_time(&self, time: DateTime<Utc>) -> Result<&Forecast> {
        self.find_forecast(time, TimeSelection::Containing, &[])
    }

    /// Picks a forecast for `time` according to `selection`, considering only
    /// forecasts whose status is in `statuses` (all of them when empty).
    pub fn find_forecast(
        &self,
        time: DateTime<Utc>,
        selection: TimeSelection,
        statuses: &[Status],
    ) -> Result<&Forecast> {
        let mut candidates = self
            .forecasts()?
            .iter()
            .filter(|f| statuses.is_empty() || statuses.contains(&f.summary().status));

        let found = match selection {
            TimeSelection::Containing => candidates.find(|f| f.summary().contains(time)),
            TimeSelection::Nearest => candidates
                .filter_map(|f| Some((f, (f.summary().starttime? - time).abs())))
                .min_by_key(|(_, delta)| *delta)
                .map(|(f, _)| f),
            TimeSelection::Previous => candidates
                .filter(|f| f.summary().starttime.is_some_and(|start| start <= time))
                .min_by_key(|f| Reverse(f.summary().starttime)),
            TimeSelection::Next => candidates
                .filter(|f| f.summary().starttime.is_some_and(|start| start >= time))
                .min_by_key(|f| f.summary().starttime),
        };

        found.ok_or_else(|| {
            Error::not_found(format!(
                "forecast of series {} for {} ({:?})",
                self.id, time, selection
            ))
        })
    }
}
