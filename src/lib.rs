//! A read-only Rust client for the HERMES seismicity forecasting web service.
//!
//! The service is browsed through three tiers of client objects:
//! [`Client`] lists projects and forecast series, [`ForecastSeries`] exposes one
//! series with its configuration and forecasts, and [`Forecast`] resolves a
//! (injection plan, model) pair to a model run and retrieves its results.
//!
//! Metadata is fetched lazily on first access and cached per object; results
//! are fetched fresh on every call.
//!
//! ## Quick start
//! - Configure the service URL via `HERMES_URL` or a `.hermesrc` file
//!   (supported in the current directory and in your home directory).
//! - Open a forecast series and ask one of its forecasts for results.
//!
//! ```no_run
//! use hermes_client::{Client, ResultPayload};
//!
//! fn main() -> hermes_client::Result<()> {
//!     let client = Client::from_env()?;
//!     let series = client.open_forecastseries("induced-hourly", Some("basel".into()))?;
//!
//!     for forecast in series.forecasts()? {
//!         println!("{}", forecast);
//!     }
//!
//!     let forecast = series.get_forecast_by_time(chrono::Utc::now())?;
//!     match forecast.get_results("default", "etas")? {
//!         ResultPayload::RateGrid(grids) => println!("{} rate grid(s)", grids.len()),
//!         ResultPayload::Catalog(catalogs) => println!("{} catalog(s)", catalogs.len()),
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod fetch;
mod forecast;
mod forecastseries;
mod results;
mod schemas;
mod transport;
mod util;

#[cfg(test)]
mod testing;

pub use client::{Client, ProjectRef};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use fetch::{Fetcher, Query};
pub use forecast::Forecast;
pub use forecastseries::{ForecastSeries, TimeSelection};
pub use results::{Catalog, Event, ModelRunRates, RateCell, RateGrid, ResultPayload, ResultType};
pub use schemas::{
    ForecastInfo, ForecastSeriesInfo, InjectionPlan, ModelConfig, ModelRunInfo, Project, Status,
};
pub use transport::{HttpTransport, RawResponse, Transport};
