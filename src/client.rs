use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Query};
use crate::forecastseries::ForecastSeries;
use crate::schemas::{ForecastSeriesInfo, ModelConfig, Project};
use crate::transport::{HttpTransport, Transport};
use crate::util::{api_base, first_named};

/// A project given either by identifier or by its (catalog-unique) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(Uuid),
    Name(String),
}

impl From<Uuid> for ProjectRef {
    fn from(id: Uuid) -> Self {
        ProjectRef::Id(id)
    }
}

/// Strings that parse as a UUID are identifiers; anything else is a name.
impl From<&str> for ProjectRef {
    fn from(s: &str) -> Self {
        match Uuid::parse_str(s) {
            Ok(id) => ProjectRef::Id(id),
            Err(_) => ProjectRef::Name(s.to_string()),
        }
    }
}

impl From<String> for ProjectRef {
    fn from(s: String) -> Self {
        ProjectRef::from(s.as_str())
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectRef::Id(id) => write!(f, "{}", id),
            ProjectRef::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// Entry point: discovers projects, forecast series and model configs.
///
/// Catalog listings are never cached; every call asks the service again.
#[derive(Debug, Clone)]
pub struct Client {
    fetcher: Fetcher,
}

impl Client {
    /// Creates a client using environment variables and/or `.hermesrc`.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::load(None, None, None)?)
    }

    /// Creates a client for the service rooted at `url` with default settings.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(url))
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(cfg.timeout, cfg.verify)?;
        Ok(Self::with_transport(&cfg.url, Arc::new(transport)))
    }

    /// Creates a client that sends every request through `transport`.
    pub fn with_transport(url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            fetcher: Fetcher::new(api_base(url), transport),
        }
    }

    /// Versioned base URL every resource path is resolved against.
    pub fn base_url(&self) -> &str {
        self.fetcher.base_url()
    }

    /// Raw access to resources this client has no dedicated method for.
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.fetcher.fetch("projects", &Query::new())
    }

    pub fn get_project(&self, id: Uuid) -> Result<Project> {
        self.fetcher.fetch(&format!("projects/{}", id), &Query::new())
    }

    /// Returns the first project named exactly `name`.
    pub fn get_project_by_name(&self, name: &str) -> Result<Project> {
        let projects = self.list_projects()?;
        first_named(projects, name, |p| p.name.as_str())
            .ok_or_else(|| Error::not_found(format!("project named {:?}", name)))
    }

    /// Lists forecast series, optionally only those of one project.
    pub fn list_forecastseries(&self, project: Option<ProjectRef>) -> Result<Vec<ForecastSeriesInfo>> {
        match project {
            Some(project) => {
                let id = self.resolve_project(&project)?;
                self.fetcher
                    .fetch(&format!("projects/{}/forecastseries", id), &Query::new())
            }
            None => self.fetcher.fetch("forecastseries", &Query::new()),
        }
    }

    pub fn get_forecastseries(&self, id: Uuid) -> Result<ForecastSeriesInfo> {
        self.fetcher
            .fetch(&format!("forecastseries/{}", id), &Query::new())
    }

    /// Returns the first forecast series named exactly `name`, searching one
    /// project when given and the whole catalog otherwise.
    pub fn get_forecastseries_by_name(
        &self,
        name: &str,
        project: Option<ProjectRef>,
    ) -> Result<ForecastSeriesInfo> {
        let scope = project
            .as_ref()
            .map(|p| format!(" in project {}", p))
            .unwrap_or_default();
        let series = self.list_forecastseries(project)?;
        first_named(series, name, |fs| fs.name.as_str())
            .ok_or_else(|| Error::not_found(format!("forecast series named {:?}{}", name, scope)))
    }

    /// Lists every model config known to the service.
    pub fn list_modelconfigs(&self) -> Result<Vec<ModelConfig>> {
        self.fetcher.fetch("modelconfigs", &Query::new())
    }

    /// Client for the forecast series `id`. Nothing is fetched until first use.
    pub fn forecastseries(&self, id: Uuid) -> ForecastSeries {
        ForecastSeries::new(self.fetcher.clone(), id)
    }

    /// Resolves a forecast series by name and returns its client.
    pub fn open_forecastseries(
        &self,
        name: &str,
        project: Option<ProjectRef>,
    ) -> Result<ForecastSeries> {
        let info = self.get_forecastseries_by_name(name, project)?;
        debug!(name, id = %info.id, "resolved forecast series");
        Ok(self.forecastseries(info.id))
    }

    fn resolve_project(&self, project: &ProjectRef) -> Result<Uuid> {
        match project {
            ProjectRef::Id(id) => Ok(*id),
            ProjectRef::Name(name) => {
                let id = self.get_project_by_name(name)?.id;
                debug!(name = %name, id = %id, "resolved project");
                Ok(id)
            }
        }
    }
}
