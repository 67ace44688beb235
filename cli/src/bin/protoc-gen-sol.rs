use std::io::{Read, Write};

use anyhow::{Context, Result};
use protosol_cli::{logging, plugin};
use tracing::level_filters::LevelFilter;

fn main() -> Result<()> {
    logging::init(LevelFilter::WARN);

    let mut input = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut input)
        .context("Failed to read stdin")?;

    let output = plugin::run(&input)?;

    std::io::stdout()
        .write_all(&output)
        .context("Failed to write response to stdout")?;
    Ok(())
}
