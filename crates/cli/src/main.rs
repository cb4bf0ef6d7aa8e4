//! dunestrat CLI - boundary-layer flow over dunes and dune-pattern analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dunestrat_algorithms::dune::{
    bed_instability_orientation, default_alpha_bins, elongation_direction, resultant_flux_at_crest,
    FLUX_UP_RATIO,
};
use dunestrat_algorithms::flow::{solve, FlowParameters, SolverParams};
use dunestrat_algorithms::pattern::{analyze_pattern, PatternDescriptor, PeriodicityParams};
use dunestrat_core::angles::vector_average;
use dunestrat_core::{DemDocument, Raster, Spheroid, StationDataset};
use dunestrat_parallel::{hydro_time_series, sweep_plane, ProcessingMode, SweepParams, SweepPlane};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "dunestrat")]
#[command(author, version, about = "Stratified flow over dunes and dune-pattern analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a DEM file
    Info {
        /// Input DEM (JSON with lon, lat, elevation)
        input: PathBuf,
    },
    /// Solve the boundary-layer flow for one parameter set
    Solve {
        /// Boundary-layer height kH
        #[arg(long)]
        eta_h: f64,
        /// Hydrodynamic roughness k z0
        #[arg(long, default_value = "1e-3")]
        eta_0: f64,
        /// Stratification length kL_B (inf for a neutral free atmosphere)
        #[arg(long, default_value = "inf")]
        eta_b: f64,
        /// Froude number
        #[arg(long)]
        froude: f64,
        /// Matching height (defaults to ceiling_fraction * kH)
        #[arg(long)]
        max_z: Option<f64>,
        /// Heights where the profile is reported, comma separated
        #[arg(long, value_delimiter = ',')]
        eta: Vec<f64>,
        /// Solver parameters (JSON)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Output file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Hydrodynamic coefficients over a plane of the parameter space
    Sweep {
        /// Plane: froude_kh, klb_kh, froude_klb
        plane: SweepPlane,
        /// Output file (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Sweep parameters (JSON)
        #[arg(long)]
        sweep_params: Option<PathBuf>,
        /// Points per axis, overriding the sweep parameters
        #[arg(short = 'n', long)]
        points: Option<usize>,
        /// Solver parameters (JSON)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Worker threads (1 = sequential)
        #[arg(short, long)]
        threads: Option<usize>,
    },
    /// Hydrodynamic coefficients along a station time series
    Timeseries {
        /// Station dataset (JSON)
        input: PathBuf,
        /// Output file (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Solver parameters (JSON)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Worker threads (1 = sequential)
        #[arg(short, long)]
        threads: Option<usize>,
    },
    /// Orientation, wavelength and amplitude of the dune pattern of a DEM
    Pattern {
        /// Input DEM (JSON with lon, lat, elevation)
        input: PathBuf,
        /// Output file (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Periodicity parameters (JSON)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Station dataset whose pattern is updated in place
        #[arg(long)]
        station: Option<PathBuf>,
    },
    /// Dune orientations predicted from a station's sand-flux distribution
    Orientation {
        /// Station dataset (JSON)
        input: PathBuf,
        /// Flux-up ratio
        #[arg(short, long, default_value_t = FLUX_UP_RATIO)]
        gamma: f64,
    },
}

// ─── Output records ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct SolveReport {
    parameters: FlowParameters,
    kappa: f64,
    max_z: f64,
    a0: f64,
    b0: f64,
    boundary_residual: f64,
    condition: f64,
    steps: usize,
    eta: Vec<f64>,
    /// `[U, W, S_t, S_n]` at each height, as `[re, im]` pairs
    profile: Vec<[[f64; 2]; 4]>,
}

#[derive(Serialize)]
struct PatternReport<'a> {
    input: String,
    #[serde(flatten)]
    descriptor: &'a PatternDescriptor,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging unavailable: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}: {}", what, path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}: {}", what, path.display()))
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

/// Parameters from a JSON file, or their defaults
fn load_params<T: Default + DeserializeOwned>(path: Option<&PathBuf>, what: &str) -> Result<T> {
    match path {
        Some(p) => read_json(p, what),
        None => Ok(T::default()),
    }
}

fn read_dem(path: &Path) -> Result<Raster> {
    let pb = spinner("Reading DEM...");
    let doc: DemDocument = read_json(path, "DEM")?;
    let raster = doc.into_raster().context("Invalid DEM")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_station(path: &Path) -> Result<StationDataset> {
    let file = File::open(path).with_context(|| format!("Failed to open station: {}", path.display()))?;
    let station = StationDataset::from_json(BufReader::new(file)).context("Invalid station dataset")?;
    info!("Station {}: {} time steps", station.name, station.len());
    Ok(station)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let dem = read_dem(&input)?;
            let (rows, cols) = dem.shape();
            let axes = dem.axes();
            let stats = dem.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, dem.len());
            println!("Step: {:.6}° lon, {:.6}° lat", axes.lon_step(), axes.lat_step());
            let km_step = axes
                .km_step(&Spheroid::default())
                .context("Failed to measure the ground step")?;
            println!("Ground step: {:.4} km", km_step);
            if let (Some(lon0), Some(lon1), Some(lat0), Some(lat1)) =
                (axes.lon.first(), axes.lon.last(), axes.lat.first(), axes.lat.last())
            {
                println!("Extent: lon {:.6} - {:.6}, lat {:.6} - {:.6}", lon0, lon1, lat0, lat1);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(std) = stats.std_dev {
                println!("  Std dev: {:.4}", std);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / dem.len() as f64
            );
        }

        // ── Flow ─────────────────────────────────────────────────────
        Commands::Solve {
            eta_h,
            eta_0,
            eta_b,
            froude,
            max_z,
            eta,
            params,
            output,
        } => {
            let solver: SolverParams = load_params(params.as_ref(), "solver parameters")?;
            let mut flow = FlowParameters::new(eta_h, eta_0, eta_b, froude);
            if let Some(z) = max_z {
                flow = flow.with_max_z(z);
            }

            let pb = spinner("Integrating flow branches...");
            let start = Instant::now();
            let solution = solve(&eta, &flow, &solver).context("Failed to solve the flow")?;
            let coeffs = solution.hydro_coefficients().context("Failed to evaluate the bed stress")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            println!("A0 = {:.6}", coeffs.a0);
            println!("B0 = {:.6}", coeffs.b0);
            println!("  Boundary residual: {:.3e}", solution.boundary_residual());
            println!("  Condition estimate: {:.3e}", solution.condition());
            println!("  Integrator steps: {}", solution.total_steps());
            println!("  Processing time: {:.2?}", elapsed);

            if let Some(path) = output {
                let report = SolveReport {
                    parameters: solution.parameters,
                    kappa: solution.kappa,
                    max_z: solution.max_z,
                    a0: coeffs.a0,
                    b0: coeffs.b0,
                    boundary_residual: solution.boundary_residual(),
                    condition: solution.condition(),
                    steps: solution.total_steps(),
                    eta: solution.eta_eval.clone(),
                    profile: solution
                        .values
                        .iter()
                        .map(|v| v.map(|c| [c.re, c.im]))
                        .collect(),
                };
                write_json(&report, &path)?;
                done("Flow solution", &path, elapsed);
            }
        }

        Commands::Sweep {
            plane,
            output,
            sweep_params,
            points,
            params,
            threads,
        } => {
            let mut sweep: SweepParams = load_params(sweep_params.as_ref(), "sweep parameters")?;
            if let Some(n) = points {
                sweep.kh.num = n;
                sweep.froude.num = n;
                sweep.klb.num = n;
            }
            let solver: SolverParams = load_params(params.as_ref(), "solver parameters")?;

            let pb = spinner("Sweeping parameter plane...");
            let start = Instant::now();
            let result = sweep_plane(plane, &sweep, &solver, ProcessingMode::from_threads(threads))
                .context("Failed to sweep the parameter plane")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();
            if result.failures > 0 {
                warn!("{} of {} points failed", result.failures, result.a0.len());
            }
            write_json(&result, &output)?;
            done("Sweep", &output, elapsed);
        }

        Commands::Timeseries {
            input,
            output,
            params,
            threads,
        } => {
            let station = read_station(&input)?;
            let solver: SolverParams = load_params(params.as_ref(), "solver parameters")?;

            let pb = spinner("Solving time series...");
            let start = Instant::now();
            let series = hydro_time_series(&station, &solver, ProcessingMode::from_threads(threads))
                .context("Failed to compute the hydrodynamic time series")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();
            if series.failures > 0 {
                warn!("{} of {} time steps failed", series.failures, series.len());
            }
            write_json(&series, &output)?;
            done("Hydrodynamic coefficients", &output, elapsed);
        }

        // ── Pattern ──────────────────────────────────────────────────
        Commands::Pattern {
            input,
            output,
            params,
            station,
        } => {
            let params: PeriodicityParams = load_params(params.as_ref(), "periodicity parameters")?;
            let dem = read_dem(&input)?;

            let pb = spinner("Analysing dune pattern...");
            let start = Instant::now();
            let descriptor = analyze_pattern(&dem, params).context("Failed to analyse the dune pattern")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            println!("Orientation: {:.1}°", descriptor.orientation);
            println!("Wavelength: {:.3} km ({:.1} px)", descriptor.wavelength, descriptor.wavelength_px);
            println!("Amplitude: {:.3}", descriptor.amplitude);

            let report = PatternReport {
                input: input.display().to_string(),
                descriptor: &descriptor,
            };
            write_json(&report, &output)?;
            done("Pattern", &output, elapsed);

            if station.is_some() && !descriptor.wavelength.is_finite() {
                // JSON has no NaN
                warn!("No wavelength detected, station left unchanged");
            } else if let Some(path) = station {
                let mut record = read_station(&path)?;
                record.pattern = Some(descriptor.summary());
                write_json(&record, &path)?;
                println!("Station {} updated: {}", record.name, path.display());
            }
        }

        // ── Orientation ──────────────────────────────────────────────
        Commands::Orientation { input, gamma } => {
            let station = read_station(&input)?;
            if station.flux_orientation.is_empty() {
                anyhow::bail!("Station {} has no sand-flux distribution", station.name);
            }
            let (theta, q0) = (&station.flux_orientation, &station.flux_magnitude);
            let bins = default_alpha_bins();

            let (rdd, rdp) = vector_average(theta, q0);
            let bed = bed_instability_orientation(theta, q0, gamma, &bins)
                .context("Failed to compute the bed-instability orientation")?;
            let elongation = elongation_direction(theta, q0, gamma, &bins)
                .context("Failed to compute the elongation direction")?;
            let (crest_dir, crest_flux) = resultant_flux_at_crest(elongation, theta, q0, gamma)
                .context("Failed to compute the crest flux")?;

            println!("Station: {}", station.name);
            println!("Resultant drift: {:.1}° ({:.4})", rdd, rdp);
            println!("Bed instability orientation: {:.1}°", bed);
            println!("Elongation direction: {:.1}°", elongation);
            println!("  Crest flux: {:.1}° ({:.4})", crest_dir, crest_flux);
            if let Some(pattern) = station.pattern {
                println!("Observed crest orientation: {:.1}°", pattern.orientation);
            }
        }
    }

    Ok(())
}
