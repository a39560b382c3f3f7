use anyhow::Result;
use chrono::Utc;
use hermes_client::{Client, ResultPayload, Status, TimeSelection};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure the service URL via env vars or a `.hermesrc` file.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::from_env()?;

    let project = "induced";
    let series = client.open_forecastseries("induced-hourly", Some(project.into()))?;
    println!("injection plans: {:?}", series.injectionplan_names()?);
    println!("model configs:   {:?}", series.modelconfig_names()?);

    let forecast = series.find_forecast(Utc::now(), TimeSelection::Nearest, &[Status::Completed])?;
    println!("{}", forecast);

    for run in forecast.list_modelruns()? {
        let (Some(plan), Some(model)) = (run.injectionplan.as_deref(), run.modelconfig.as_deref())
        else {
            continue;
        };
        match forecast.get_results(plan, model)? {
            ResultPayload::RateGrid(grids) => {
                let cells: usize = grids.iter().map(|g| g.cells.len()).sum();
                println!("{plan}/{model}: {} windows, {cells} cells", grids.len());
            }
            ResultPayload::Catalog(catalogs) => {
                let events: usize = catalogs.iter().map(|c| c.events.len()).sum();
                println!("{plan}/{model}: {} catalogs, {events} events", catalogs.len());
            }
        }
    }
    Ok(())
}
