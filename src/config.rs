use crate::demo::DEFAULT_SEED;
use crate::error::{Error, Result};
use crate::schema::FUNNEL_STEPS;
use std::path::PathBuf;

/// Environment variable that overrides the default dataset path
pub const DATA_ENV: &str = "STAY_OR_SKIP_DATA";

pub const DEFAULT_DATA_PATH: &str = "spotify_merged.xlsx";

/// How the report is printed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Settings for one report run
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Spreadsheet holding the merged subscription dataset
    pub data_path: PathBuf,

    /// Month for the plan mix; the latest month in the data when unset
    pub month: Option<String>,

    /// How many columns the missing-value summary keeps
    pub top_n: usize,

    /// Rolling window of the retention proxy, in observed days
    pub window_days: usize,

    /// Trailing window of the LTV snapshot, in calendar days
    pub lookback_days: u32,

    pub funnel_steps: Vec<String>,

    /// Seed of the demo event log
    pub seed: u64,

    pub output: OutputFormat,
    pub xlsx_out: Option<PathBuf>,
    pub csv_out: Option<PathBuf>,

    /// Directory for PNG charts; needs the `charts` feature
    pub charts_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            month: None,
            top_n: 5,
            window_days: 7,
            lookback_days: 30,
            funnel_steps: FUNNEL_STEPS.iter().map(|s| s.to_string()).collect(),
            seed: DEFAULT_SEED,
            output: OutputFormat::Text,
            xlsx_out: None,
            csv_out: None,
            charts_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the environment, then command line flags
    ///
    /// `args` excludes the program name.
    pub fn from_sources(args: &[String], data_env: Option<String>) -> Result<Self> {
        let mut config = DashboardConfig::default();
        if let Some(path) = data_env.filter(|p| !p.trim().is_empty()) {
            config.data_path = PathBuf::from(path);
        }
        config.apply_args(args)?;
        Ok(config)
    }

    /// Reads `std::env` the way the binary sees it
    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&args, std::env::var(DATA_ENV).ok())
    }

    fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = |name: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| Error::Config(format!("{} expects a value", name)))
            };

            match flag.as_str() {
                "--data" => self.data_path = PathBuf::from(value("--data")?),
                "--month" => self.month = Some(value("--month")?),
                "--top" => self.top_n = parse_number("--top", &value("--top")?)?,
                "--window" => {
                    self.window_days = parse_number("--window", &value("--window")?)?;
                    if self.window_days == 0 {
                        return Err(Error::Config("--window must be at least 1".to_string()));
                    }
                }
                "--lookback" => self.lookback_days = parse_number("--lookback", &value("--lookback")?)?,
                "--steps" => {
                    let steps: Vec<String> = value("--steps")?
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if steps.is_empty() {
                        return Err(Error::Config("--steps needs at least one stage".to_string()));
                    }
                    self.funnel_steps = steps;
                }
                "--seed" => self.seed = parse_number("--seed", &value("--seed")?)?,
                "--xlsx" => self.xlsx_out = Some(PathBuf::from(value("--xlsx")?)),
                "--csv" => self.csv_out = Some(PathBuf::from(value("--csv")?)),
                "--charts" => self.charts_dir = Some(PathBuf::from(value("--charts")?)),
                "--json" => self.output = OutputFormat::Json,
                other => return Err(Error::Config(format!("unknown argument '{}'", other))),
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} expects a non-negative number, got '{}'", flag, raw)))
}
