use patrolcore::camera_interface::RawPreset;
use serde::{Deserialize, Serialize};

/// Behaviour of the simulated camera and the people walking past it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub presets: Vec<RawPreset>,
    pub seed: u64,
    pub move_seconds: f64,
    pub person_probability: f64,
    pub person_delay_seconds: f64,
    pub person_linger_seconds: f64,
    pub auto_tracking: bool,
    pub events_supported: bool,
    pub subscription_fails: bool,
    pub pull_failure_rate: f64,
    pub status_failure_rate: f64,
    pub command_failure_rate: f64,
    pub noise_rate: f64,
    pub required_user: Option<String>,
    pub required_password: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            presets: (1..=4)
                .map(|i| RawPreset::new(format!("Preset {}", i), i.to_string()))
                .collect(),
            seed: 0,
            move_seconds: 1.5,
            person_probability: 0.35,
            person_delay_seconds: 3.0,
            person_linger_seconds: 6.0,
            auto_tracking: false,
            events_supported: true,
            subscription_fails: false,
            pull_failure_rate: 0.0,
            status_failure_rate: 0.0,
            command_failure_rate: 0.0,
            noise_rate: 0.1,
            required_user: None,
            required_password: None,
        }
    }
}

impl ScenarioConfig {
    pub(crate) fn probability(value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub(crate) fn seconds(value: f64) -> f64 {
        if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_mirrors_numbered_presets() {
        let scenario = ScenarioConfig::default();
        let tokens: Vec<&str> = scenario.presets.iter().map(|p| p.token.as_str()).collect();
        assert_eq!(tokens, vec!["1", "2", "3", "4"]);
        assert_eq!(scenario.presets[0].name, "Preset 1");
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert_eq!(ScenarioConfig::probability(1.7), 1.0);
        assert_eq!(ScenarioConfig::probability(-0.2), 0.0);
        assert_eq!(ScenarioConfig::probability(f64::NAN), 0.0);
        assert_eq!(ScenarioConfig::seconds(-3.0), 0.0);
    }
}
