//! Range and name checks, collected into a single error.

use roulette_common::{ConfigError, NoticeKind};

use crate::schema::RouletteConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RouletteConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.server.port == 0 {
        errors.push("server.port must not be 0".into());
    }
    validate_range(
        &mut errors,
        "server.outbound_buffer",
        config.server.outbound_buffer as u64,
        1,
        65_536,
    );
    validate_range(
        &mut errors,
        "dispatch.max_inflight_events",
        config.dispatch.max_inflight_events as u64,
        1,
        100_000,
    );
    validate_range(
        &mut errors,
        "dispatch.stats_interval_secs",
        config.dispatch.stats_interval_secs,
        1,
        86_400,
    );

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(format!(
            "logging.level = {:?} is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    let mut unknown: Vec<&str> = config
        .messages
        .keys()
        .map(String::as_str)
        .filter(|key| !NoticeKind::NAMES.contains(key))
        .collect();
    unknown.sort_unstable();
    for key in unknown {
        errors.push(format!("messages.{key} is not a known notice"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
