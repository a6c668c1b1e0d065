use std::env;
use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

use crate::export::OutputFormat;
use crate::pagespeed;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PAGESPEED_API_KEY is not set")]
    MissingApiKey,
    #[error("SITES_DELIMITER must be `tab` or `comma`, got {0:?}")]
    BadDelimiter(String),
    #[error("OUTPUT_FORMAT must be `xlsx`, `csv` or `json`, got {0:?}")]
    BadFormat(String),
    #[error("PAGESPEED_ENDPOINT is not a valid url: {0}")]
    BadEndpoint(String),
}

// Everything a run needs, resolved from the environment once at startup.
// dotenv has already been loaded by then, so `.env` entries count too.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub endpoint: Url,
    pub sites_file: PathBuf,
    pub delimiter: char,
    pub format: OutputFormat,
    pub output_file: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Settings, ConfigError> {
        let api_key = env::var("PAGESPEED_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;

        let endpoint = env::var("PAGESPEED_ENDPOINT")
            .unwrap_or_else(|_| pagespeed::DEFAULT_ENDPOINT.to_string());
        let endpoint =
            Url::parse(&endpoint).map_err(|e| ConfigError::BadEndpoint(e.to_string()))?;

        let delimiter = parse_delimiter(env::var("SITES_DELIMITER").ok().as_deref())?;
        let format = parse_format(env::var("OUTPUT_FORMAT").ok().as_deref())?;

        let sites_file = env::var("SITES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sites.txt"));
        let output_file = env::var("OUTPUT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(format!("lighthouse.{}", format.extension())));

        Ok(Settings {
            api_key,
            endpoint,
            sites_file,
            delimiter,
            format,
            output_file,
        })
    }
}

fn parse_delimiter(raw: Option<&str>) -> Result<char, ConfigError> {
    match raw {
        None | Some("tab") => Ok('\t'),
        Some("comma") => Ok(','),
        Some(other) => Err(ConfigError::BadDelimiter(other.to_string())),
    }
}

fn parse_format(raw: Option<&str>) -> Result<OutputFormat, ConfigError> {
    match raw {
        None => Ok(OutputFormat::Xlsx),
        Some(name) => {
            OutputFormat::from_name(name).ok_or_else(|| ConfigError::BadFormat(name.to_string()))
        }
    }
}
