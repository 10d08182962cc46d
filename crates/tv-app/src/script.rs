//! Command line and interaction scripts

use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use tv_core::InteractionEvent;

/// `threatvis [config.json] [events.jsonl] [--data tabular.csv boundaries.geojson]`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub data: Option<(PathBuf, PathBuf)>,
}

impl Args {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut positional = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => {
                    let (Some(tabular), Some(boundaries)) = (args.next(), args.next()) else {
                        bail!("--data needs a CSV file and a GeoJSON file");
                    };
                    parsed.data = Some((PathBuf::from(tabular), PathBuf::from(boundaries)));
                }
                flag if flag.starts_with("--") => bail!("unknown option {}", flag),
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        if positional.len() > 2 {
            bail!("expected at most a config file and an events file");
        }
        let mut positional = positional.into_iter();
        parsed.config = positional.next();
        parsed.events = positional.next();
        Ok(parsed)
    }
}

/// Parse a JSON-lines interaction script. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<InteractionEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid event on line {}", idx + 1))
        })
        .collect()
}

pub fn read_script(path: &Path) -> Result<Vec<InteractionEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_script(&text)
}
