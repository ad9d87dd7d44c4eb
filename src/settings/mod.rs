use clap::{Parser, Subcommand, value_parser};
use itertools::Itertools;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "mapviewer")]
#[command(version)]
#[command(about = "Decodes world regions of a game cache dump into render-ready scenes")]
pub struct CliArgs {
    #[arg(long, env = "MAPVIEWER_CACHE_DIR", default_value_os_t = default_cache_dir())]
    pub cache_dir: PathBuf,

    /// Defaults to `xteas.json` inside the cache directory.
    #[arg(long, env = "MAPVIEWER_XTEAS")]
    pub xteas: Option<PathBuf>,

    /// Number of chunk loader threads, defaults to the available parallelism.
    #[arg(long, env = "MAPVIEWER_POOL_SIZE")]
    pub pool_size: Option<usize>,

    #[arg(long, env = "MAPVIEWER_MAX_PLANE", default_value_t = 3)]
    pub max_plane: u8,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

impl CliArgs {
    pub fn xteas_path(&self) -> PathBuf {
        self.xteas
            .clone()
            .unwrap_or_else(|| self.cache_dir.join("xteas.json"))
    }
}

pub fn default_cache_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("_cache")
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Loads the regions through the worker pool and reports what they contain.
    LoadRegions {
        #[arg(required = true, value_parser = value_parser!(RegionCoords))]
        regions: Vec<RegionCoords>,
        #[arg(long)]
        minimize_draw_calls: bool,
    },
    /// Builds the scene of one region and lists the extracted scene objects.
    Extract {
        #[arg(value_parser = value_parser!(RegionCoords))]
        region: RegionCoords,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionCoords {
    pub x: u32,
    pub y: u32,
}

fn trim_brackets(input: &str) -> &str {
    let mut chars = input.chars();
    chars.next(); // skip first
    chars.next_back(); // skip last
    chars.as_str()
}

impl FromStr for RegionCoords {
    type Err = String;

    // (50, 50) or 50_50
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let string: String = s.chars().filter(|&c| !c.is_whitespace()).collect();
        let splits = if string.starts_with('(') && string.ends_with(')') {
            trim_brackets(string.as_str()).split(',').collect_vec()
        } else {
            string.split('_').collect_vec()
        };

        if splits.len() != 2 {
            return Err(format!("Expected two coordinates, found {}", splits.len()));
        }

        let components = splits
            .iter()
            .map(|split| {
                split
                    .parse::<u32>()
                    .map_err(|err| format!("Invalid coordinate {}: {}", split, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if components.iter().any(|component| *component > 0xFF) {
            return Err("Region coordinates range from 0 to 255".to_string());
        }

        Ok(RegionCoords {
            x: components[0],
            y: components[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::RegionCoords;

    #[test]
    fn parses_both_notations() {
        assert_eq!("(50, 51)".parse::<RegionCoords>(), Ok(RegionCoords { x: 50, y: 51 }));
        assert_eq!("50_51".parse::<RegionCoords>(), Ok(RegionCoords { x: 50, y: 51 }));
        assert!("(1, 2, 3)".parse::<RegionCoords>().is_err());
        assert!("50_x".parse::<RegionCoords>().is_err());
        assert!("300_1".parse::<RegionCoords>().is_err());
    }
}
