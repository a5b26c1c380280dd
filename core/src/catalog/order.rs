use crate::camera_interface::RawPreset;
use serde::Serialize;
use std::fmt;

/// Preset position the patrol visits. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Derived from the name or token, not reported by the camera.
    pub index: u64,
    pub name: String,
    pub token: String,
}

impl Preset {
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("token={}", self.token)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.index, self.label())
    }
}

/// Patrol sequence sorted by index, discovery order on ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatrolOrder {
    presets: Vec<Preset>,
}

impl PatrolOrder {
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Preset> {
        self.presets.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.presets.iter().map(|p| p.index).collect()
    }

    /// Position after `current`, wrapping at the end. `None` starts at 0.
    pub fn next_position(&self, current: Option<usize>) -> Option<usize> {
        if self.presets.is_empty() {
            return None;
        }
        Some(match current {
            Some(position) => (position + 1) % self.presets.len(),
            None => 0,
        })
    }
}

/// First digit run of `name`, else the whole token if it is numeric.
/// Runs too large for a `u64` saturate, so they still sort last.
pub fn derive_index(name: &str, token: &str) -> Option<u64> {
    if let Some(run) = first_digit_run(name) {
        return Some(saturating_index(run));
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return Some(saturating_index(token));
    }
    None
}

fn first_digit_run(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    text[start..].split(|c: char| !c.is_ascii_digit()).next()
}

/// `digits` holds ASCII digits only, so parsing fails on overflow alone.
fn saturating_index(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

pub fn build_order(raw: &[RawPreset]) -> PatrolOrder {
    let mut presets: Vec<Preset> = raw
        .iter()
        .filter_map(|record| {
            let name = record.name.trim();
            let token = record.token.trim();
            derive_index(name, token).map(|index| Preset {
                index,
                name: name.to_string(),
                token: token.to_string(),
            })
        })
        .collect();

    // sort_by_key is stable, which keeps discovery order on ties.
    presets.sort_by_key(|preset| preset.index);
    PatrolOrder { presets }
}
