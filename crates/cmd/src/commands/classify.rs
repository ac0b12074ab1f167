use std::io::Write;

use anyhow::Result;
use pipeline::classify;

pub fn classify_command<W: Write>(lat: Option<f64>, lon: Option<f64>, mut out: W) -> Result<()> {
    writeln!(out, "{}", classify(lat, lon))?;
    Ok(())
}
