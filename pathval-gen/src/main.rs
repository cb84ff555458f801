use std::error::Error;

use indicatif::ProgressBar;
use pathval_certs::KeyStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_OUTPUT_DIR: &str = "./fixtures";
const DEFAULT_KEYS_DIR: &str = "./keys";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_init();

    let mut args = std::env::args();
    let (_, output_dir, keys_dir) = (
        args.next(), // Program name
        args.next().unwrap_or(DEFAULT_OUTPUT_DIR.to_owned()),
        args.next().unwrap_or(DEFAULT_KEYS_DIR.to_owned()),
    );

    std::fs::create_dir_all(&output_dir)?;
    // Keys persist across runs so regenerated fixtures keep their key
    // material (and, for RSA scenarios, their bytes).
    let mut keys = KeyStore::persistent(keys_dir)?;

    let scenarios = pathval_gen::scenarios::all();
    tracing::info!("generating {} fixtures into {output_dir}", scenarios.len());

    let bar = ProgressBar::new(scenarios.len() as u64);
    for scenario in &scenarios {
        let path = pathval_gen::write_fixture(&output_dir, scenario, &mut keys)?;
        tracing::debug!("wrote {}", path.display());
        bar.inc(1);
    }
    bar.finish();
    tracing::info!("Done!");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pathval_gen=info".into()),
        )
        .init();
}
