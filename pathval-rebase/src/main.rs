use std::error::Error;
use std::io::Read;
use std::path::Path;

use pathval_rebase::{read_report, rebase_fixture};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FIXTURES_DIR: &str = "./fixtures";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_init();

    let mut args = std::env::args();
    let (_, report_path, fixtures_dir) = (
        args.next(), // Program name
        args.next().unwrap_or("-".to_owned()),
        args.next().unwrap_or(DEFAULT_FIXTURES_DIR.to_owned()),
    );

    let results = match report_path.as_str() {
        // No report file (or "-"): read the report from stdin, e.g. piped
        // straight out of the test suite's report step.
        "-" => {
            let mut data = String::new();
            std::io::stdin().read_to_string(&mut data)?;
            read_report(data.as_bytes())?
        }
        path => read_report(std::fs::File::open(path)?)?,
    };

    tracing::info!(
        "rebasing expected errors for {} fixtures in {fixtures_dir}",
        results.len()
    );
    for result in &results {
        let path = rebase_fixture(Path::new(&fixtures_dir), result)?;
        tracing::info!("updated {}", path.display());
    }
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pathval_rebase=info".into()),
        )
        .init();
}
