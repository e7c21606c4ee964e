use clap::Parser;
use skywall::catalog::Catalog;
use skywall::desktop::SystemScreen;
use skywall::fetch::{CurlTransfer, SourcePipeline};
use skywall::imaging::{BackendError, Dialect, MagickBackend};
use skywall::pipeline::Pipeline;
use skywall::recipe::{self, Recipe};
use skywall::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;

const PROGRAM: &str = "skywall";

#[derive(Parser)]
#[command(name = "skywall")]
#[command(version)]
#[command(about = "Compose desktop wallpapers from live satellite imagery")]
#[command(long_about = "\
Compose desktop wallpapers from live satellite imagery

Runs the recipe in a pipeline directory: downloads the latest full-disk
images (reusing downloads younger than each source's interval), cleans
them up, lays them out, and sets the result as the desktop background.

Pipeline structure:

  pipelines/simple/
  ├── recipe.toml       # Steps to run (required)
  ├── skywall.toml      # Config overrides (optional)
  ├── sources.json      # Image source catalog (optional, replaces built-in)
  └── images/           # Downloads and generated0.png, generated1.png, ...

Requires ImageMagick (magick, or convert + identify) and curl on PATH.

Run 'skywall --gen-config' to print a documented skywall.toml.")]
struct Cli {
    /// Pipeline directory containing recipe.toml
    #[arg(required_unless_present = "gen_config")]
    pipeline_dir: Option<PathBuf>,

    /// Download every source even if a recent copy exists
    #[arg(long)]
    no_cache: bool,

    /// Log diagnostics (dialect, catalog, cache ages) to stderr
    #[arg(long, short)]
    verbose: bool,

    /// Print a stock skywall.toml with all options documented
    #[arg(long, conflicts_with = "pipeline_dir")]
    gen_config: bool,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(pipeline_dir) = cli.pipeline_dir else {
        println!("{}", output::format_usage(PROGRAM));
        return Ok(ExitCode::FAILURE);
    };
    if !pipeline_dir.join(recipe::RECIPE_FILENAME).is_file() {
        println!("{}", output::format_usage(PROGRAM));
        return Ok(ExitCode::FAILURE);
    }

    let config = config::load_config(&pipeline_dir)?;
    let dialect = match Dialect::resolve(config.magick.dialect) {
        Ok(dialect) => dialect,
        Err(err @ BackendError::ToolNotFound) => {
            println!("{err}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    let recipe = Recipe::load(&pipeline_dir)?;
    let catalog = Catalog::load(&pipeline_dir)?;
    tracing::debug!(origin = catalog.origin(), sources = catalog.sources().len(), "catalog loaded");

    let pipeline = Pipeline::with_images_dir(
        MagickBackend::new(dialect),
        config.images_dir_in(&pipeline_dir),
    );
    let transfer = CurlTransfer::new(&config.transfer.program, config.transfer.args.clone());
    let mut sources = SourcePipeline::new(pipeline, catalog, transfer).force_download(cli.no_cache);

    output::print_run_header(&pipeline_dir);
    recipe::run_recipe(&recipe, &mut sources, &pipeline_dir, &SystemScreen)?;
    output::print_run_footer(sources.generated_count());

    Ok(ExitCode::SUCCESS)
}
