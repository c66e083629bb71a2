use std::path::Path;

use clap::Parser;

/// Profile file picked up from the working directory when `--path` is absent.
pub const DEFAULT_CONFIG: &str = "reqres_quest.toml";

/// Runs the reqres.in registration, login and user scenarios
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML file with a [profile] section [default: reqres_quest.toml, if it exists]
    #[arg(short, long)]
    pub path: Option<String>,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print the scenario names and exit
    #[arg(long)]
    pub list: bool,

    /// Log every request and response
    #[arg(short, long)]
    pub verbose: bool,

    /// Send requests to this origin instead of the configured one
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Cli {
    /// The profile file to load: `--path` if given, otherwise
    /// `reqres_quest.toml` when present, otherwise none.
    pub fn config_path(&self) -> Option<String> {
        self.config_path_or(Path::new(DEFAULT_CONFIG))
    }

    fn config_path_or(&self, default: &Path) -> Option<String> {
        match &self.path {
            Some(path) => Some(path.clone()),
            None => default
                .is_file()
                .then(|| default.to_string_lossy().into_owned()),
        }
    }
}
