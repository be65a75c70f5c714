use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use surfcorr::field::io::load_gray_field;
use surfcorr::{
    correlate, crosscorrelate, preferred_method, run_to_completion, CorrelationMethod,
    CrossCorrelationJob, CrossCorrelationOutputs, CrossCorrelationParams, ScalarField2D,
    Windowing,
};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Surfcorr CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    #[default]
    Correlate,
    Crosscorrelate,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    #[default]
    Auto,
    Spatial,
    Fft,
    PhaseOnly,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum WindowingConfig {
    #[default]
    None,
    Hann,
    Hamming,
    Blackman,
    Lanczos,
    Welch,
    Rect,
    Nuttall,
    FlatTop,
    Kaiser25,
}

impl From<WindowingConfig> for Windowing {
    fn from(value: WindowingConfig) -> Self {
        match value {
            WindowingConfig::None => Windowing::None,
            WindowingConfig::Hann => Windowing::Hann,
            WindowingConfig::Hamming => Windowing::Hamming,
            WindowingConfig::Blackman => Windowing::Blackman,
            WindowingConfig::Lanczos => Windowing::Lanczos,
            WindowingConfig::Welch => Windowing::Welch,
            WindowingConfig::Rect => Windowing::Rect,
            WindowingConfig::Nuttall => Windowing::Nuttall,
            WindowingConfig::FlatTop => Windowing::FlatTop,
            WindowingConfig::Kaiser25 => Windowing::Kaiser25,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CorrelateConfigJson {
    method: MethodConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CrossCorrelateConfigJson {
    search_width: usize,
    search_height: usize,
    window_width: usize,
    window_height: usize,
    windowing: WindowingConfig,
}

impl Default for CrossCorrelateConfigJson {
    fn default() -> Self {
        let params = CrossCorrelationParams::default();
        Self {
            search_width: params.search_width,
            search_height: params.search_height,
            window_width: params.window_width,
            window_height: params.window_height,
            windowing: WindowingConfig::None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    mode: ModeConfig,
    data_path: String,
    /// Kernel image for `correlate`, second field for `crosscorrelate`.
    reference_path: String,
    pixel_size: f64,
    output_path: Option<String>,
    include_fields: bool,
    correlate: CorrelateConfigJson,
    crosscorrelate: CrossCorrelateConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeConfig::Correlate,
            data_path: String::new(),
            reference_path: String::new(),
            pixel_size: 1.0,
            output_path: None,
            include_fields: false,
            correlate: CorrelateConfigJson::default(),
            crosscorrelate: CrossCorrelateConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldRecord {
    xres: usize,
    yres: usize,
    data: Vec<f64>,
}

impl From<&ScalarField2D> for FieldRecord {
    fn from(value: &ScalarField2D) -> Self {
        Self {
            xres: value.xres(),
            yres: value.yres(),
            data: value.get_data().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PeakRecord {
    x: usize,
    y: usize,
    score: f64,
}

#[derive(Debug, Serialize)]
struct CorrelateOutput {
    method: &'static str,
    best: PeakRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<FieldRecord>,
}

#[derive(Debug, Serialize)]
struct CrossCorrelateOutput {
    points: usize,
    mean_dx: f64,
    mean_dy: f64,
    mean_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    dx: Option<FieldRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dy: Option<FieldRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<FieldRecord>,
}

fn load_field(path: &str, pixel_size: f64) -> Result<ScalarField2D, Box<dyn std::error::Error>> {
    let pixels = load_gray_field(path)?;
    let (xres, yres) = pixels.get_dims();
    let field = pixels.with_extent(xres as f64 * pixel_size, yres as f64 * pixel_size)?;
    Ok(field)
}

fn run_correlate(
    config: &Config,
    data: &ScalarField2D,
    kernel: &ScalarField2D,
) -> Result<String, Box<dyn std::error::Error>> {
    let method = match config.correlate.method {
        MethodConfig::Auto => preferred_method(data, kernel),
        MethodConfig::Spatial => CorrelationMethod::Spatial,
        MethodConfig::Fft => CorrelationMethod::Fft,
        MethodConfig::PhaseOnly => CorrelationMethod::PhaseOnlyCorrelation,
    };
    let mut score = data.new_alike()?;
    correlate(data, kernel, &mut score, method)?;

    let (index, best) = score
        .get_data()
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
    let output = CorrelateOutput {
        method: match method {
            CorrelationMethod::Spatial => "spatial",
            CorrelationMethod::Fft => "fft",
            CorrelationMethod::PhaseOnlyCorrelation => "phase_only",
        },
        best: PeakRecord {
            x: index % score.xres(),
            y: index / score.xres(),
            score: best,
        },
        score: config.include_fields.then(|| FieldRecord::from(&score)),
    };
    tracing::info!(x = output.best.x, y = output.best.y, score = best, "correlation peak");
    Ok(serde_json::to_string_pretty(&output)?)
}

fn run_crosscorrelate(
    config: &Config,
    data1: &ScalarField2D,
    data2: &ScalarField2D,
) -> Result<String, Box<dyn std::error::Error>> {
    let cc = &config.crosscorrelate;
    let params = CrossCorrelationParams {
        search_width: cc.search_width,
        search_height: cc.search_height,
        window_width: cc.window_width,
        window_height: cc.window_height,
    };
    let outputs = CrossCorrelationOutputs::default();
    let result = match cc.windowing {
        WindowingConfig::None => crosscorrelate(data1, data2, params, outputs)?,
        windowing => {
            let mut job = CrossCorrelationJob::init(data1, data2, params, outputs)?;
            job.set_weights(windowing.into())?;
            run_to_completion(job)?
        }
    };
    let (Some(dx), Some(dy), Some(score)) = (result.dx, result.dy, result.score) else {
        return Err("cross-correlation produced no output fields".into());
    };

    // Points outside the valid region keep a zero displacement and score.
    let (x0, y0) = (params.window_width / 2, params.window_height / 2);
    let (x1, y1) = (
        data1.xres() - params.window_width + x0,
        data1.yres() - params.window_height + y0,
    );
    let mut sums = (0.0, 0.0, 0.0);
    let mut points = 0usize;
    for row in y0..=y1 {
        for col in x0..=x1 {
            let k = row * data1.xres() + col;
            sums.0 += dx.get_data()[k];
            sums.1 += dy.get_data()[k];
            sums.2 += score.get_data()[k];
            points += 1;
        }
    }
    let n = points as f64;
    let output = CrossCorrelateOutput {
        points,
        mean_dx: sums.0 / n,
        mean_dy: sums.1 / n,
        mean_score: sums.2 / n,
        dx: config.include_fields.then(|| FieldRecord::from(&dx)),
        dy: config.include_fields.then(|| FieldRecord::from(&dy)),
        score: config.include_fields.then(|| FieldRecord::from(&score)),
    };
    tracing::info!(
        points,
        mean_dx = output.mean_dx,
        mean_dy = output.mean_dy,
        "cross-correlation summary"
    );
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("surfcorr=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.data_path.is_empty() || config.reference_path.is_empty() {
        return Err("data_path and reference_path must be set in the config".into());
    }
    if !(config.pixel_size.is_finite() && config.pixel_size > 0.0) {
        return Err("pixel_size must be a positive number".into());
    }

    let data = load_field(&config.data_path, config.pixel_size)?;
    let reference = load_field(&config.reference_path, config.pixel_size)?;
    let json = match config.mode {
        ModeConfig::Correlate => run_correlate(&config, &data, &reference)?,
        ModeConfig::Crosscorrelate => run_crosscorrelate(&config, &data, &reference)?,
    };

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
