use anyhow::{Context, bail};
use clap::Parser;
use pages::Site;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Data file picked up from the project root when `--data` is not given.
const DEFAULT_DATA_FILE: &str = "pages.json";

#[derive(Parser)]
#[command(name = "pages")]
#[command(about = "Build a static site from ./pages into ./public")]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,

  /// Forcefully remove ./public before building
  #[arg(long)]
  rm: bool,

  /// Serve the site with live reload instead of building once
  #[arg(long, value_name = "ADDR", num_args = 0..=1, default_missing_value = "localhost:6060")]
  http: Option<String>,

  /// JSON file whose contents templates see as `data` (default: ./pages.json if present)
  #[arg(short, long, value_name = "FILE")]
  data: Option<PathBuf>,

  /// Project root containing the pages directory
  #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
  root: PathBuf,
}

fn main() {
  let cli = Cli::parse();

  let level = if cli.verbose { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::new().default_filter_or(level))
    .format_target(false)
    .format_timestamp(None)
    .init();

  if let Err(err) = run(cli) {
    log::error!("{:#}", err);
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> anyhow::Result<()> {
  let mut builder = Site::builder(&cli.root);
  if let Some(data) = load_data(&cli.root, cli.data.as_deref())? {
    builder = builder.data(&data);
  }
  let site = builder.build();

  // Make sure this is a pages project before removing anything.
  match fs::metadata(site.pages_path()) {
    Ok(meta) if meta.is_dir() => {}
    Ok(_) => bail!("{} is not a directory", site.pages_path().display()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      bail!("pages directory not found; please create one and try again.")
    }
    Err(e) => return Err(e).with_context(|| site.pages_path().display().to_string()),
  }

  if cli.rm {
    match fs::remove_dir_all(site.public_path()) {
      Ok(()) => log::info!("removed {}", site.public_path().display()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(e).with_context(|| format!("removing {}", site.public_path().display())),
    }
  }

  match cli.http {
    Some(addr) => serve(&addr, site),
    None => {
      site.run().map_err(|e| anyhow::anyhow!(pages::error::report(&e)))?;
      Ok(())
    }
  }
}

#[cfg(feature = "devel")]
fn serve(addr: &str, site: Site) -> anyhow::Result<()> {
  actix_web::rt::System::new()
    .block_on(pages::actix::dev::serve(addr, site))
    .map_err(|e| anyhow::anyhow!(pages::error::report(&e)))
}

#[cfg(not(feature = "devel"))]
fn serve(_addr: &str, _site: Site) -> anyhow::Result<()> {
  bail!("this build of pages has no dev server; rebuild with the `devel` feature")
}

fn load_data(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Option<serde_json::Value>> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => {
      let default = root.join(DEFAULT_DATA_FILE);
      if !default.is_file() {
        return Ok(None);
      }
      default
    }
  };

  let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
  let value = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
  log::debug!("loaded template data from {}", path.display());
  Ok(Some(value))
}
