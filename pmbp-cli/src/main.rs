use clap::Parser;
use pmbp::io::{load_rgba_image, save_rgba_image};
use pmbp::{
    Application, CostParams, DiscreteModel, EnergyModel, FlowModel, Model, ParticleGraph,
    PmbpConfig, StereoModel, View,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "PMBP dense correspondence CLI (JSON config driven)")]
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
    /// Print the particles of view one at pixel X Y after solving.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    inspect: Option<Vec<usize>>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ApplicationConfig {
    #[default]
    Flow,
    Stereo,
    Discrete,
}

impl From<ApplicationConfig> for Application {
    fn from(value: ApplicationConfig) -> Self {
        match value {
            ApplicationConfig::Flow => Application::Flow,
            ApplicationConfig::Stereo => Application::Stereo,
            ApplicationConfig::Discrete => Application::Discrete,
        }
    }
}

/// Engine settings; unset fields keep the application defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineConfigJson {
    n_iterations: Option<usize>,
    n_particles: Option<usize>,
    bidirectional: Option<bool>,
    seed: Option<u64>,
    median_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CostConfigJson {
    patch_size: Option<usize>,
    max_motion: Option<f32>,
    tau1: Option<f32>,
    tau2: Option<f32>,
    alpha: Option<f32>,
    asw: Option<f32>,
    border: Option<f32>,
    infinity: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelConfigJson {
    weight: Option<f32>,
    truncate: Option<f32>,
    discrete_step: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    application: ApplicationConfig,
    one_path: String,
    two_path: String,
    output_dir: String,
    import_file: Option<String>,
    save_iterations: bool,
    save_energies: bool,
    disparity_scale: f32,
    engine: EngineConfigJson,
    cost: CostConfigJson,
    model: ModelConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            one_path: "one.png".to_string(),
            two_path: "two.png".to_string(),
            output_dir: "out".to_string(),
            import_file: None,
            save_iterations: false,
            save_energies: false,
            disparity_scale: 4.0,
            engine: EngineConfigJson::default(),
            cost: CostConfigJson::default(),
            model: ModelConfigJson::default(),
        }
    }
}

impl Config {
    fn engine_config(&self, application: Application) -> PmbpConfig {
        let defaults = application.default_config();
        let engine = &self.engine;
        let cost = &self.cost;
        let d = &defaults.cost;
        let cost = CostParams {
            patch_size: cost.patch_size.unwrap_or(d.patch_size),
            max_motion: cost.max_motion.unwrap_or(d.max_motion),
            tau1: cost.tau1.unwrap_or(d.tau1),
            tau2: cost.tau2.unwrap_or(d.tau2),
            alpha: cost.alpha.unwrap_or(d.alpha),
            asw: cost.asw.unwrap_or(d.asw),
            border: cost.border.unwrap_or(d.border),
            infinity: cost.infinity.unwrap_or(d.infinity),
        };
        PmbpConfig {
            n_iterations: engine.n_iterations.unwrap_or(defaults.n_iterations),
            n_particles: engine.n_particles.unwrap_or(defaults.n_particles),
            bidirectional: engine.bidirectional.unwrap_or(defaults.bidirectional),
            seed: engine.seed.unwrap_or(defaults.seed),
            median_size: engine.median_size.unwrap_or(defaults.median_size),
            cost,
        }
    }

    fn model(&self, application: Application) -> Model {
        let m = &self.model;
        match application.default_model() {
            Model::Flow(d) => Model::Flow(FlowModel::new(
                m.weight.unwrap_or(d.weight()),
                m.truncate.unwrap_or(d.truncate()),
            )),
            Model::Stereo(d) => Model::Stereo(StereoModel::new(
                m.weight.unwrap_or(d.weight()),
                m.truncate.unwrap_or(d.truncate()),
            )),
            Model::Discrete(d) => Model::Discrete(DiscreteModel::new(
                m.weight.unwrap_or(d.weight()),
                m.truncate.unwrap_or(d.truncate()),
                m.discrete_step.unwrap_or(d.step()),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    application: String,
    width: usize,
    height: usize,
    particles: usize,
    iterations: usize,
    propagated_pct: f32,
    unary_energy: f32,
    pairwise_energy: f32,
    outputs: Vec<String>,
}

fn save_image(img: &pmbp::RgbaImage, path: &Path, outputs: &mut Vec<String>) -> pmbp::PmbpResult<()> {
    save_rgba_image(img, path)?;
    tracing::info!(path = %path.display(), "saved image");
    outputs.push(path.display().to_string());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("pmbp=info".parse()?))
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
    if config.one_path.is_empty() || config.two_path.is_empty() {
        return Err("one_path and two_path must be set in the config".into());
    }

    let application = Application::from(config.application);
    let engine_config = config.engine_config(application);
    let model = config.model(application);

    let one = load_rgba_image(&config.one_path)?;
    let two = load_rgba_image(&config.two_path)?;
    let mut graph = ParticleGraph::new(model, engine_config, one, two)?;
    if let Some(path) = &config.import_file {
        graph.load_fields(path)?;
    }

    let out_dir = PathBuf::from(&config.output_dir);
    fs::create_dir_all(&out_dir)?;
    let mut outputs = Vec::new();

    let mut save_error = None;
    let iterations = graph.solve_with(|it, graph| {
        if !config.save_iterations {
            return ControlFlow::Continue(());
        }
        let path = out_dir.join(format!("motion_it_{it:03}.png"));
        match save_image(&graph.output_motion_field(View::One), &path, &mut outputs) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                save_error = Some(err);
                ControlFlow::Break(())
            }
        }
    });
    if let Some(err) = save_error {
        return Err(err.into());
    }

    save_image(
        &graph.output_motion_field(View::One),
        &out_dir.join("motion_one.png"),
        &mut outputs,
    )?;
    save_image(
        &graph.output_reconstruction(View::One),
        &out_dir.join("reconstruction_one.png"),
        &mut outputs,
    )?;
    if application == Application::Stereo {
        save_image(
            &graph.output_disparity(View::One, config.disparity_scale),
            &out_dir.join("disparity_one.png"),
            &mut outputs,
        )?;
    }

    let (unary_map, unary_energy) = graph.output_unary_energy(View::One);
    let (pairwise_map, pairwise_energy) = graph.output_pairwise_energy(View::One);
    if config.save_energies {
        save_image(&unary_map, &out_dir.join("unary_one.png"), &mut outputs)?;
        save_image(&pairwise_map, &out_dir.join("pairwise_one.png"), &mut outputs)?;
    }

    let flo_path = out_dir.join("flow.flo");
    graph.export_flo(View::One).save(&flo_path)?;
    outputs.push(flo_path.display().to_string());
    let fields_path = out_dir.join("state.fields");
    graph.save_fields(&fields_path)?;
    outputs.push(fields_path.display().to_string());

    if let Some(pixel) = cli.inspect.as_deref() {
        if let [x, y] = *pixel {
            if x < graph.width(View::One) && y < graph.height(View::One) {
                let (dx, dy) = graph.displacement_at(View::One, x, y);
                eprintln!("At [{x},{y}]:\n{}", graph.node(View::One, x, y));
                eprintln!(
                    "Best displacement at [{x},{y}]: [{dx},{dy}] with disbelief {}",
                    graph.node(View::One, x, y).min_score()
                );
            } else {
                eprintln!("pixel [{x},{y}] is outside the image");
            }
        }
    }

    let summary = Summary {
        application: format!("{:?}", graph.model().tag()),
        width: graph.width(View::One),
        height: graph.height(View::One),
        particles: graph.n_particles(),
        iterations,
        propagated_pct: graph.propagated_percentage(View::One),
        unary_energy,
        pairwise_energy,
        outputs,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
