use crate::config::{KeyingConfig, ParameterStore};
use crate::keying::KeyColor;
use anyhow::{anyhow, bail, Context, Result};
use std::io::BufRead;
use std::thread::{self, JoinHandle};

/// One operator adjustment, e.g. `gain 1.5` or `low-h 40`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Key(KeyColor),
    Acceptance(f32),
    Cutoff(f32),
    Gain(f32),
    ScreenBalance(f32),
    LowH(u8),
    HighH(u8),
    LowS(u8),
    HighS(u8),
    LowV(u8),
    HighV(u8),
    Prefilter(bool),
    Morphology(bool),
    Spill(bool),
}

impl Adjustment {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let value = words
            .next()
            .ok_or_else(|| anyhow!("'{name}' needs a value"))?;
        if let Some(extra) = words.next() {
            bail!("unexpected '{extra}' after '{name} {value}'");
        }

        let adjustment = match name {
            "key" => Adjustment::Key(value.parse().map_err(|e: String| anyhow!(e))?),
            "acceptance" => Adjustment::Acceptance(parse_number(name, value)?),
            "cutoff" => Adjustment::Cutoff(parse_number(name, value)?),
            "gain" => Adjustment::Gain(parse_number(name, value)?),
            "balance" => Adjustment::ScreenBalance(parse_number(name, value)?),
            "low-h" => Adjustment::LowH(parse_number(name, value)?),
            "high-h" => Adjustment::HighH(parse_number(name, value)?),
            "low-s" => Adjustment::LowS(parse_number(name, value)?),
            "high-s" => Adjustment::HighS(parse_number(name, value)?),
            "low-v" => Adjustment::LowV(parse_number(name, value)?),
            "high-v" => Adjustment::HighV(parse_number(name, value)?),
            "prefilter" => Adjustment::Prefilter(parse_switch(value)?),
            "morphology" => Adjustment::Morphology(parse_switch(value)?),
            "spill" => Adjustment::Spill(parse_switch(value)?),
            other => bail!("unknown setting '{other}'"),
        };
        Ok(adjustment)
    }

    pub fn apply(self, config: &mut KeyingConfig) {
        match self {
            Adjustment::Key(key) => config.key = key,
            Adjustment::Acceptance(v) => config.params.acceptance_angle = v,
            Adjustment::Cutoff(v) => config.params.cutoff_angle = v,
            Adjustment::Gain(v) => config.params.gain = v,
            Adjustment::ScreenBalance(v) => config.params.screen_balance = v,
            Adjustment::LowH(v) => config.hsv.set_low_h(v),
            Adjustment::HighH(v) => config.hsv.set_high_h(v),
            Adjustment::LowS(v) => config.hsv.set_low_s(v),
            Adjustment::HighS(v) => config.hsv.set_high_s(v),
            Adjustment::LowV(v) => config.hsv.set_low_v(v),
            Adjustment::HighV(v) => config.hsv.set_high_v(v),
            Adjustment::Prefilter(on) => config.prefilter = on,
            Adjustment::Morphology(on) => config.morphology = on,
            Adjustment::Spill(on) => {
                config.spill = if on {
                    Some(config.spill.unwrap_or_default())
                } else {
                    None
                }
            }
        }
    }
}

fn parse_number<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value '{value}' for '{name}'"))
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => bail!("expected on/off, got '{other}'"),
    }
}

/// Apply every line of `reader` to `store`
///
/// Bad lines are logged and skipped; the live configuration only changes
/// when an adjustment validates.
pub fn apply_lines<R: BufRead>(reader: R, store: &ParameterStore) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read control input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let adjustment = match Adjustment::parse(line) {
            Ok(adjustment) => adjustment,
            Err(e) => {
                tracing::error!("Ignoring control '{}': {:#}", line, e);
                continue;
            }
        };

        match store.update(|config| adjustment.apply(config)) {
            Ok(version) => tracing::info!("Applied '{}' (version {})", line, version),
            Err(e) => tracing::error!("Rejected '{}': {}", line, e),
        }
    }
    Ok(())
}

/// Read adjustments from stdin on a background thread
pub fn spawn_stdin_controls(store: ParameterStore) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        if let Err(e) = apply_lines(stdin.lock(), &store) {
            tracing::error!("Control input stopped: {:#}", e);
        }
    })
}
