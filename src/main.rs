use std::process;

use anyhow::{Context, Result};
use dotenv::dotenv;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

mod config;
mod export;
mod model;
mod pagespeed;
mod report;
mod sites;

use config::Settings;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(e) = run().await {
        log::error!("{e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;

    let sites = sites::read_sites_file(&settings.sites_file, settings.delimiter)
        .with_context(|| format!("failed to read sites file {}", settings.sites_file.display()))?;
    log::info!(
        "{} pages to audit from {}",
        sites.len(),
        settings.sites_file.display()
    );

    let client = reqwest::Client::new();
    let result = report::collect_reports(&client, &settings, &sites).await?;

    // Console summary first: every failure is listed by url and device, so
    // "could not be evaluated" never masquerades as a low score.
    println!("{}", serde_json::to_string_pretty(&result)?);

    export::write_report(&result, &settings.output_file, settings.format).with_context(|| {
        format!("failed to write report to {}", settings.output_file.display())
    })?;
    log::info!("report written to {}", settings.output_file.display());

    Ok(())
}

fn init_logging() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%dT%H:%M:%S)} {h({l})} {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("console logging config is valid");
    log4rs::init_config(config).expect("logging is initialized once");
}
