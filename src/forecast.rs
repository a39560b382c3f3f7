use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Query};
use crate::results::{
    EventRows, ModelRunRates, RateRows, RawModelRunRates, ResultPayload, ResultType,
};
use crate::schemas::{ForecastInfo, ForecastSeriesInfo, ModelConfig, ModelRunInfo};
use crate::util::cached;

/// Full model configs of one series, fetched once and shared by the series
/// and all of its forecasts.
#[derive(Debug)]
pub(crate) struct SeriesModelConfigs {
    fetcher: Fetcher,
    series_id: Uuid,
    configs: OnceLock<Vec<ModelConfig>>,
}

impl SeriesModelConfigs {
    pub(crate) fn new(fetcher: Fetcher, series_id: Uuid) -> Self {
        Self {
            fetcher,
            series_id,
            configs: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> Result<&[ModelConfig]> {
        let configs = cached(&self.configs, || {
            debug!(forecastseries = %self.series_id, "fetching model configs");
            self.fetcher.fetch(
                &format!("forecastseries/{}/modelconfigs", self.series_id),
                &Query::new(),
            )
        })?;
        Ok(configs.as_slice())
    }

    fn result_type(&self, modelconfig: &str) -> Result<Option<String>> {
        Ok(self
            .get()?
            .iter()
            .find(|m| m.name == modelconfig)
            .and_then(|m| m.result_type.clone()))
    }
}

/// What a forecast needs to know about its series to resolve model runs.
#[derive(Debug)]
pub(crate) struct SeriesContext {
    pub(crate) series_id: Uuid,
    pub(crate) injectionplans: Vec<String>,
    pub(crate) modelconfigs: Arc<SeriesModelConfigs>,
}

impl SeriesContext {
    pub(crate) fn from_series(info: &ForecastSeriesInfo, modelconfigs: Arc<SeriesModelConfigs>) -> Self {
        SeriesContext {
            series_id: info.id,
            injectionplans: info.injectionplans.iter().map(|i| i.name.clone()).collect(),
            modelconfigs,
        }
    }
}

/// One forecast of a series.
///
/// Only obtainable through [`ForecastSeries::forecasts`](crate::ForecastSeries::forecasts).
/// Metadata is fetched once; model runs and results are fetched on every call.
#[derive(Debug)]
pub struct Forecast {
    fetcher: Fetcher,
    summary: ForecastInfo,
    context: Arc<SeriesContext>,
    metadata: OnceLock<ForecastInfo>,
}

impl Forecast {
    pub(crate) fn new(fetcher: Fetcher, summary: ForecastInfo, context: Arc<SeriesContext>) -> Self {
        Self {
            fetcher,
            summary,
            context,
            metadata: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.summary.id
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> &SeriesContext {
        &self.context
    }

    /// The entry the series listing returned for this forecast.
    pub fn summary(&self) -> &ForecastInfo {
        &self.summary
    }

    /// Full forecast document, fetched on first access.
    pub fn metadata(&self) -> Result<&ForecastInfo> {
        cached(&self.metadata, || {
            debug!(forecast = %self.id(), "fetching forecast metadata");
            self.fetcher
                .fetch(&format!("forecasts/{}", self.id()), &Query::new())
        })
    }

    /// Model runs as embedded in a freshly fetched forecast document.
    pub fn list_modelruns(&self) -> Result<Vec<ModelRunInfo>> {
        let forecast: ForecastInfo = self
            .fetcher
            .fetch(&format!("forecasts/{}", self.id()), &Query::new())?;
        Ok(forecast.modelruns)
    }

    /// The first model run computed for `injectionplan` with `modelconfig`.
    pub fn get_modelrun(&self, injectionplan: &str, modelconfig: &str) -> Result<ModelRunInfo> {
        let runs = self.list_modelruns()?;
        runs.into_iter()
            .find(|run| run.matches(injectionplan, modelconfig))
            .ok_or_else(|| {
                let hint = if self.context.injectionplans.iter().any(|p| p == injectionplan) {
                    ""
                } else {
                    " (injection plan is not configured on the series)"
                };
                Error::not_found(format!(
                    "model run for injection plan {:?} and model {:?} in forecast {}{}",
                    injectionplan,
                    modelconfig,
                    self.id(),
                    hint
                ))
            })
    }

    /// Results of the model run for `injectionplan` and `modelconfig`.
    ///
    /// The model run is resolved again on every call and nothing is cached.
    pub fn get_results(&self, injectionplan: &str, modelconfig: &str) -> Result<ResultPayload> {
        let run = self.get_modelrun(injectionplan, modelconfig)?;

        let tag = match &run.result_type {
            Some(tag) => Some(tag.clone()),
            None => self.context.modelconfigs.result_type(modelconfig)?,
        };
        let unsupported = || Error::UnsupportedResultType {
            modelrun: run.id.to_string(),
            result_type: tag.clone(),
        };
        let result_type = tag
            .as_deref()
            .and_then(ResultType::parse)
            .ok_or_else(unsupported)?;

        debug!(
            series = %self.context.series_id,
            forecast = %self.id(),
            modelrun = %run.id,
            %result_type,
            "fetching results"
        );
        match result_type {
            ResultType::Grid => {
                let rows: RateRows = self
                    .fetcher
                    .fetch(&format!("modelruns/{}/rates", run.id), &Query::new())?;
                Ok(ResultPayload::RateGrid(rows.into_grids()))
            }
            ResultType::Catalog => {
                let rows: EventRows = self
                    .fetcher
                    .fetch(&format!("modelruns/{}/catalogs", run.id), &Query::new())?;
                Ok(ResultPayload::Catalog(rows.into_catalogs()))
            }
            ResultType::Bins => Err(unsupported()),
        }
    }

    /// Configuration the model run for `injectionplan` and `modelconfig` was computed with.
    pub fn modelrun_modelconfig(&self, injectionplan: &str, modelconfig: &str) -> Result<ModelConfig> {
        let run = self.get_modelrun(injectionplan, modelconfig)?;
        self.fetcher
            .fetch(&format!("modelruns/{}/modelconfig", run.id), &Query::new())
    }

    /// Seismicity observed before the forecast, as the QuakeML document the service serves.
    pub fn seismicity_observations(&self) -> Result<String> {
        self.fetcher.fetch_text(
            &format!("forecasts/{}/seismicityobservations", self.id()),
            &Query::new(),
        )
    }

    /// Observed borehole hydraulics, one JSON document per well.
    pub fn injection_observations(&self) -> Result<Vec<Value>> {
        self.fetcher.fetch(
            &format!("forecasts/{}/injectionobservations", self.id()),
            &Query::new(),
        )
    }

    /// Rate grids of every model run of this forecast, optionally narrowed to
    /// some model configs and injection plans.
    pub fn rates(&self, modelconfigs: &[&str], injectionplans: &[&str]) -> Result<Vec<ModelRunRates>> {
        let query = Query::new()
            .list("modelconfigs", modelconfigs)
            .list("injectionplans", injectionplans);
        let runs: Vec<RawModelRunRates> = self
            .fetcher
            .fetch(&format!("forecasts/{}/rates", self.id()), &query)?;
        Ok(runs.into_iter().map(ModelRunRates::from).collect())
    }
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map_or_else(|| "-".to_string(), |t| t.to_string())
        };
        write!(
            f,
            "Forecast({}, {}, {})",
            self.summary.status,
            time(self.summary.starttime),
            time(self.summary.endtime)
        )
    }
}
