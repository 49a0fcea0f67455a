use crate::infra::build_service;
use clap::Args;
use prospect_qualify::config::AppConfig;
use prospect_qualify::error::AppError;
use prospect_qualify::qualification::{BatchReport, Location, RegionIndex, RegionMapping};
use prospect_qualify::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct QualifyArgs {
    /// Prospect CSV export to qualify instead of the configured one
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Print one line per prospect after the summary
    #[arg(long)]
    pub(crate) list: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RegionsArgs {
    /// Country code, e.g. US
    #[arg(long)]
    pub(crate) country: String,
    /// Optional state or subdivision code, e.g. CA
    #[arg(long)]
    pub(crate) state: Option<String>,
}

pub(crate) fn run_qualify(args: QualifyArgs) -> Result<(), AppError> {
    let QualifyArgs { csv, list } = args;

    let mut config = AppConfig::load()?;
    if let Some(path) = csv {
        config.data.prospects_path = path;
    }
    telemetry::init(&config.telemetry)?;

    let service = build_service(&config.data)?;
    let report = service.run()?;

    for line in render_batch_report(&report, list) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_regions(args: RegionsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let mapping = RegionMapping::from_path(&config.data.regions_path)?;
    let index = RegionIndex::build(&mapping);

    let location = Location::new(
        Some(args.country.trim().to_string()),
        args.state.map(|state| state.trim().to_string()),
    );
    println!("{}", render_regions(&index, &location));
    Ok(())
}

pub(crate) fn render_batch_report(report: &BatchReport, list: bool) -> Vec<String> {
    let summary = &report.summary;
    let persisted = &report.persisted;
    let mut lines = vec![
        format!(
            "Qualified {} of {} prospects ({} not qualified)",
            summary.qualified, summary.total, summary.unqualified
        ),
        format!(
            "Stored {} records ({} new, {} updated, {} skipped without user or prospect id)",
            persisted.written(),
            persisted.inserted,
            persisted.updated,
            persisted.skipped
        ),
    ];

    if list {
        for prospect in &report.prospects {
            let user = prospect
                .user_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<no user>".to_string());
            let id = prospect
                .prospect_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<no prospect>".to_string());
            let location = prospect
                .location
                .canonical()
                .unwrap_or_else(|| "<no country>".to_string());
            let verdict = if prospect.qualified {
                "qualified"
            } else {
                "not qualified"
            };
            lines.push(format!("  - {user}/{id} [{location}] -> {verdict}"));
        }
    }

    lines
}

pub(crate) fn render_regions(index: &RegionIndex, location: &Location) -> String {
    let Some(key) = location.canonical() else {
        return "No country given".to_string();
    };

    let regions = index.regions_for(location);
    if regions.is_empty() {
        format!("{key}: no regions mapped")
    } else {
        let names: Vec<&str> = regions.into_iter().collect();
        format!("{key}: {}", names.join(", "))
    }
}
