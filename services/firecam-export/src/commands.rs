//! Subcommand implementations.
//!
//! Pipeline calls are CPU-bound and run on the blocking pool; the annual
//! and monthly comparison tables are computed concurrently.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use emissions::table::export_stem;
use emissions::{EmissionsPipeline, EmissionsRequest, OutputTable};
use fire_common::{Species, TimeResolution, YearRange};
use regions::{BasisRegion, Region};
use tracing::{info, warn};

/// Where tables go.
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    Dir(PathBuf),
}

impl Output {
    /// Write one table as `{stem}.csv`, or print it.
    pub fn emit(&self, table: &OutputTable, stem: &str) -> Result<()> {
        for summary in table.summary() {
            info!(
                table = %stem,
                column = %summary.column,
                mean = ?summary.mean,
                min = ?summary.min,
                max = ?summary.max,
                "Column summary"
            );
        }
        if table.any_preliminary() {
            warn!(table = %stem, "Table includes preliminary data");
        }

        match self {
            Output::Stdout => {
                println!("# {}", stem);
                print!("{}", table.to_csv_string()?);
            }
            Output::Dir(dir) => {
                let path = table
                    .export(dir, stem)
                    .with_context(|| format!("writing {}", stem))?;
                println!("{}", path.display());
            }
        }
        Ok(())
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> fire_common::FireResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

pub async fn compare(pipeline: Arc<EmissionsPipeline>, request: EmissionsRequest, output: &Output) -> Result<()> {
    let footprint = pipeline.resolve(&request.region)?;
    info!(
        species = %request.species,
        years = %request.years,
        region = %footprint.name,
        "Comparing inventories"
    );

    let annual = {
        let (pipeline, request) = (pipeline.clone(), request.clone());
        blocking(move || pipeline.annual_table(&request))
    };
    let monthly = {
        let (pipeline, request) = (pipeline.clone(), request.clone());
        blocking(move || pipeline.monthly_table(&request))
    };
    let (annual, monthly) = tokio::try_join!(annual, monthly)?;

    for (resolution, table) in [(TimeResolution::Annual, &annual), (TimeResolution::Monthly, &monthly)] {
        let stem = export_stem(&request.species, resolution, &footprint.name, &request.years);
        output.emit(table, &stem)?;
    }
    Ok(())
}

pub async fn land_cover(
    pipeline: Arc<EmissionsPipeline>,
    request: EmissionsRequest,
    resolution: TimeResolution,
    output: &Output,
) -> Result<()> {
    let footprint = pipeline.resolve(&request.region)?;
    let table = {
        let (pipeline, request) = (pipeline.clone(), request.clone());
        blocking(move || pipeline.land_cover(&request, resolution)).await?
    };
    let stem = export_stem(&request.species, resolution, &footprint.name, &request.years);
    output.emit(&table, &format!("GFED_LULC_{}", stem))
}

pub async fn daily(
    pipeline: Arc<EmissionsPipeline>,
    species: Species,
    year: i32,
    region: Region,
    output: &Output,
) -> Result<()> {
    let footprint = pipeline.resolve(&region)?;
    let table = {
        let (pipeline, species) = (pipeline.clone(), species.clone());
        blocking(move || pipeline.daily(&species, year, &region)).await?
    };
    let stem = export_stem(&species, TimeResolution::Daily, &footprint.name, &YearRange::single(year));
    output.emit(&table, &stem)
}

pub async fn ef_compare(
    pipeline: Arc<EmissionsPipeline>,
    request: EmissionsRequest,
    resolution: TimeResolution,
    output: &Output,
) -> Result<()> {
    let footprint = pipeline.resolve(&request.region)?;
    let table = {
        let (pipeline, request) = (pipeline.clone(), request.clone());
        blocking(move || pipeline.ef_compare(&request, resolution)).await?
    };
    let stem = export_stem(&request.species, resolution, &footprint.name, &request.years);
    output.emit(&table, &format!("GFED_EFs_{}", stem))
}

pub async fn composition(pipeline: Arc<EmissionsPipeline>, years: YearRange, region: Region) -> Result<()> {
    let composition = blocking(move || pipeline.land_cover_composition(&years, &region)).await?;
    match composition {
        Some(composition) => println!("{}", serde_json::to_string_pretty(&composition)?),
        None => warn!(years = %years, "No land cover available for the requested years"),
    }
    Ok(())
}

/// Print basis regions in display order, marking those without boundaries,
/// then the country aliases and loaded country names.
pub fn list_regions(pipeline: &EmissionsPipeline) {
    let resolver = pipeline.resolver();
    for region in BasisRegion::in_display_order() {
        let loaded = resolver.basis().get(region.id).is_some();
        println!(
            "basis:{}\t{}{}",
            region.abbrev,
            region.label(),
            if loaded { "" } else { "\t(no boundary)" }
        );
    }
    for (alias, name) in resolver.aliases().iter() {
        println!("alias:{}\t{}", alias, name);
    }
    for name in resolver.countries().names() {
        println!("country:{}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emissions::{EmissionsConfig, GridSpec};
    use raster::RasterConfig;
    use test_utils::{comparison_grid, temp_reference_dir};

    fn pipeline(data: &std::path::Path, reference: &std::path::Path) -> Arc<EmissionsPipeline> {
        let mut config = EmissionsConfig::default();
        config.data_dir = data.to_path_buf();
        config.reference_dir = reference.to_path_buf();
        config.comparison_grid = GridSpec::custom(&comparison_grid());
        Arc::new(EmissionsPipeline::from_config(config, RasterConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_compare_writes_both_tables() {
        let data = tempfile::tempdir().unwrap();
        let reference = temp_reference_dir();
        let out = tempfile::tempdir().unwrap();
        let pipeline = pipeline(data.path(), reference.path());

        let request = EmissionsRequest::new(Species::Co2, YearRange::new(2010, 2012).unwrap(), Region::basis("EQAS").unwrap());
        compare(pipeline, request, &Output::Dir(out.path().to_path_buf()))
            .await
            .unwrap();

        for stem in ["CO2_Tg_Annual_EQAS_2010_2012", "CO2_Tg_Monthly_EQAS_2010_2012"] {
            let text = std::fs::read_to_string(out.path().join(format!("{}.csv", stem))).unwrap();
            assert!(text.starts_with("Time,GFEDv4s,FINNv1.5,GFASv1.2,QFEDv2.5r1,FEERv1.0-G1.2"));
        }
    }

    #[tokio::test]
    async fn test_unknown_country_is_reported() {
        let data = tempfile::tempdir().unwrap();
        let reference = temp_reference_dir();
        let pipeline = pipeline(data.path(), reference.path());

        let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), Region::country("Atlantis"));
        let err = compare(pipeline, request, &Output::Stdout).await.unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }
}
