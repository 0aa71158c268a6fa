use crate::infra::{
    parse_instant, InMemoryDecisionLog, InMemoryReadingStore, LoggingEscalationPublisher, Monitor,
};
use chrono::{DateTime, Utc};
use clap::Args;
use garden::config::{
    AppConfig, ConfigFiles, Lookback, PoliciesConfig, SensorsConfig, SensorsError,
};
use garden::error::AppError;
use garden::readings::{import, SensorType};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// CSV export of readings (created,sensor_type,sensor_id,payload)
    #[arg(long)]
    pub(crate) readings: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to the newest reading.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) at: Option<DateTime<Utc>>,
    #[command(flatten)]
    pub(crate) files: FileArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    pub(crate) files: FileArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct FileArgs {
    /// Policies file; overrides APP_POLICIES_PATH
    #[arg(long)]
    pub(crate) policies: Option<PathBuf>,
    /// Sensors file; overrides APP_SENSORS_PATH
    #[arg(long)]
    pub(crate) sensors: Option<PathBuf>,
}

impl FileArgs {
    fn resolve(self) -> Result<ConfigFiles, AppError> {
        let mut files = AppConfig::load()?.files;
        if let Some(policies) = self.policies {
            files.policies = policies;
        }
        if let Some(sensors) = self.sensors {
            files.sensors = sensors;
        }
        Ok(files)
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        readings,
        at,
        files,
    } = args;

    let files = files.resolve()?;
    let policies = files.load_policies()?;
    let sensors = files.load_sensors()?;

    let readings = import::from_path(readings)?;
    let now = at
        .or_else(|| readings.last().map(|reading| reading.created))
        .unwrap_or_else(Utc::now);

    let store = InMemoryReadingStore::from_readings(readings)?;
    let mut monitor = build_monitor(store, &policies, &sensors)?;
    let report = monitor.run_cycle(now)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) fn build_monitor(
    store: InMemoryReadingStore,
    policies: &PoliciesConfig,
    sensors: &SensorsConfig,
) -> Result<Monitor, SensorsError> {
    Monitor::from_config(
        Arc::new(store),
        Arc::new(InMemoryDecisionLog::default()),
        Arc::new(LoggingEscalationPublisher),
        policies,
        sensors,
    )
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let files = args.files.resolve()?;
    let policies = files.load_policies()?;
    let sensors = files.load_sensors()?;

    for line in describe(&policies, &sensors)? {
        println!("{line}");
    }
    Ok(())
}

fn describe(policies: &PoliciesConfig, sensors: &SensorsConfig) -> Result<Vec<String>, SensorsError> {
    let mut lines = vec![format!("policy version: {}", policies.policy_version)];

    for domain in SensorType::ALL {
        let config = sensors.domain(domain);
        let primary = config
            .primary_sensor()
            .ok_or(SensorsError::NoSensors { domain })?;
        let lookback = match config.lookback(domain)? {
            Lookback::Seconds(seconds) => format!("last {seconds}s"),
            Lookback::Samples(count) => format!("last {count} samples"),
        };
        lines.push(format!(
            "{domain}: sensor {} sampled every {}s, evidence {lookback}",
            primary.id, config.sampling.interval_seconds
        ));
    }

    lines.push(format!(
        "evaluation every {}s",
        sensors.evaluation_interval().as_secs()
    ));
    Ok(lines)
}
