use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::pipeline::SimulationInputs;

/// Weather series and site description handed to the engine.
#[derive(Debug, Clone)]
pub struct WeatherStation {
    pub csv_path: PathBuf,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// One engine invocation over a prepared raster input set.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    pub dsm_path: PathBuf,
    pub region_mask_path: PathBuf,
    pub weather: WeatherStation,
    /// Compute facade irradiance instead of roof irradiance.
    pub facade: bool,
    /// Panel zenith angle in degrees.
    pub panel_zenith: f64,
    /// Panel azimuth angle in degrees.
    pub panel_azimuth: f64,
    pub output_csv: PathBuf,
}

impl SimulationJob {
    /// Roof-irradiance job over prepared inputs with a horizontal,
    /// south-facing panel.
    pub fn roof(inputs: &SimulationInputs, weather: WeatherStation, output_csv: PathBuf) -> Self {
        SimulationJob {
            dsm_path: inputs.layers.dsm.clone(),
            region_mask_path: inputs.layers.roof_mask.clone(),
            weather,
            facade: false,
            panel_zenith: 0.0,
            panel_azimuth: 180.0,
            output_csv,
        }
    }
}

/// The external irradiance engine, reduced to its file contract: read the
/// raster inputs and the weather series, write a result CSV. The solar
/// physics itself lives behind this trait and is not part of this crate.
pub trait IrradianceEngine {
    fn dsm_to_irradiance(&mut self, job: &SimulationJob) -> Result<()>;
}

/// One row of engine output, keyed by CSV column name.
pub type IrradianceRecord = HashMap<String, Value>;

/// Owns the engine and serializes access to it.
///
/// The native engine is a stateful singleton that tolerates one call at a
/// time, so every run holds the lock for the full invocation.
pub struct EngineHandle<E: IrradianceEngine> {
    inner: Mutex<E>,
}

impl<E: IrradianceEngine> EngineHandle<E> {
    pub fn new(engine: E) -> Self {
        EngineHandle {
            inner: Mutex::new(engine),
        }
    }

    /// Run one job to completion and parse its result CSV.
    pub fn run(&self, job: &SimulationJob) -> Result<Vec<IrradianceRecord>> {
        {
            let mut engine = self
                .inner
                .lock()
                .map_err(|_| anyhow::anyhow!("engine lock poisoned by an earlier panic"))?;
            engine
                .dsm_to_irradiance(job)
                .context("irradiance engine invocation failed")?;
        }
        read_results(&job.output_csv)
    }
}

/// Parse an engine result CSV into records. Numeric cells become numbers,
/// NaN and empty cells become null, anything else stays a string.
pub fn read_results(path: &Path) -> Result<Vec<IrradianceRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .context(format!("Failed to open engine results: {:?}", path))?;
    let headers = reader
        .headers()
        .context("Failed to read result CSV header")?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.context("Failed to read result CSV row")?;
        let mut record = IrradianceRecord::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            record.insert(name.to_string(), cell_to_value(cell));
        }
        records.push(record);
    }
    Ok(records)
}

fn cell_to_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        // JSON has no NaN; from_f64 maps it to None and the cell to null
        Ok(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Err(_) => Value::String(trimmed.to_string()),
    }
}

/// Stand-in engine for environments without the native runtime: checks the
/// raster inputs exist and writes a small canned result CSV so the rest of
/// the pipeline can be exercised.
pub struct MockEngine;

impl IrradianceEngine for MockEngine {
    fn dsm_to_irradiance(&mut self, job: &SimulationJob) -> Result<()> {
        for path in [&job.dsm_path, &job.region_mask_path] {
            if !path.exists() {
                anyhow::bail!("missing raster input: {:?}", path);
            }
        }
        let rows = "hour,irradiance_wh_m2\n12,523.4\n13,NaN\n";
        std::fs::write(&job.output_csv, rows).context(format!(
            "Failed to write mock results: {:?}",
            job.output_csv
        ))?;
        Ok(())
    }
}
