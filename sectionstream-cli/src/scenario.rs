//! Scenario files: JSON descriptions of a world and a focus walk.
//!
//! A scenario bundles everything one deterministic run needs: the section
//! layout, per-tick focus waypoints, scripted loader latency and failures,
//! and the tick count. [`Scenario::sample`] is a small builtin coastal walk
//! used when `simulate` is given no file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sectionstream::{
    ContentRef, FocusId, FocusSample, ScriptedLoader, SectionDescriptor, StreamingConfig,
    WorldPoint,
};

use crate::error::CliError;

/// One section of the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSection {
    pub name: String,
    /// World-space center, `[x, y, z]`.
    pub center: [f32; 3],
    pub enter_radius: f32,
    pub exit_radius: f32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub estimated_cost: f32,
    /// Content reference handed to the loader. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ScenarioSection {
    /// Build the descriptor this section registers as.
    pub fn descriptor(&self) -> SectionDescriptor {
        let content = self.content.as_deref().unwrap_or(self.name.as_str());
        SectionDescriptor::new(
            self.name.as_str(),
            WorldPoint::new(self.center[0], self.center[1], self.center[2]),
            self.enter_radius,
            self.exit_radius,
        )
        .with_priority(self.priority)
        .with_estimated_cost(self.estimated_cost)
        .with_content(ContentRef::new(content))
    }
}

/// One focus and its waypoints, one per tick.
///
/// A focus holds its final waypoint once the path runs out, so a short path
/// in a long run behaves like a walker who stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFocus {
    pub id: u32,
    pub path: Vec<[f32; 3]>,
    #[serde(default = "default_radius_scale")]
    pub radius_scale: f32,
    #[serde(default)]
    pub load_radius_offset: f32,
    #[serde(default)]
    pub unload_radius_offset: f32,
}

fn default_radius_scale() -> f32 {
    1.0
}

/// Scripted loader behavior for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioLoader {
    /// Ticks a load takes (0 = instant).
    #[serde(default = "default_steps")]
    pub load_steps: u64,
    /// Ticks an unload takes (0 = instant).
    #[serde(default = "default_steps")]
    pub unload_steps: u64,
    /// Contents whose loads complete as failed.
    #[serde(default)]
    pub fail_loads: Vec<String>,
    /// Contents whose unloads complete as failed.
    #[serde(default)]
    pub fail_unloads: Vec<String>,
    /// Contents the loader refuses synchronously.
    #[serde(default)]
    pub refuse: Vec<String>,
}

fn default_steps() -> u64 {
    1
}

impl Default for ScenarioLoader {
    fn default() -> Self {
        Self {
            load_steps: default_steps(),
            unload_steps: default_steps(),
            fail_loads: Vec::new(),
            fail_unloads: Vec::new(),
            refuse: Vec::new(),
        }
    }
}

impl ScenarioLoader {
    /// Build the scripted loader this description configures.
    pub fn build(&self) -> ScriptedLoader {
        let mut loader = ScriptedLoader::new()
            .with_load_steps(self.load_steps)
            .with_unload_steps(self.unload_steps);
        for content in &self.fail_loads {
            loader.fail_load(content);
        }
        for content in &self.fail_unloads {
            loader.fail_unload(content);
        }
        for content in &self.refuse {
            loader.refuse(content);
        }
        loader
    }
}

/// A complete simulation scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Ticks to run. Defaults to the longest focus path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
    /// Budget overrides. The config file's settings apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingConfig>,
    pub sections: Vec<ScenarioSection>,
    pub foci: Vec<ScenarioFocus>,
    #[serde(default)]
    pub loader: ScenarioLoader,
}

impl Scenario {
    /// Read and validate a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CliError::Scenario(format!("cannot read scenario {}: {}", path.display(), e))
        })?;
        let scenario: Scenario = serde_json::from_str(&text).map_err(|e| {
            CliError::Scenario(format!("{} is not a valid scenario: {}", path.display(), e))
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Number of ticks this scenario runs.
    pub fn tick_count(&self) -> u64 {
        self.ticks.unwrap_or_else(|| {
            self.foci
                .iter()
                .map(|focus| focus.path.len() as u64)
                .max()
                .unwrap_or(0)
        })
    }

    /// Focus samples for one tick. Ticks are 1-based; foci with empty paths
    /// contribute nothing.
    pub fn samples_at(&self, tick: u64) -> Vec<FocusSample> {
        let index = tick.saturating_sub(1) as usize;
        self.foci
            .iter()
            .filter(|focus| !focus.path.is_empty())
            .map(|focus| {
                let clamped = index.min(focus.path.len() - 1);
                let [x, y, z] = focus.path[clamped];
                FocusSample::at(FocusId(focus.id), WorldPoint::new(x, y, z))
                    .with_radius_scale(focus.radius_scale)
                    .with_load_radius_offset(focus.load_radius_offset)
                    .with_unload_radius_offset(focus.unload_radius_offset)
            })
            .collect()
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.sections.is_empty() {
            return Err(CliError::Scenario(format!(
                "scenario '{}' has no sections",
                self.name
            )));
        }
        if self.tick_count() == 0 {
            return Err(CliError::Scenario(format!(
                "scenario '{}' runs zero ticks; set \"ticks\" or give a focus a path",
                self.name
            )));
        }
        Ok(())
    }

    /// Builtin demonstration scenario: a walker crossing a small coastal
    /// strip, passing a harbor, a village, and a lighthouse.
    pub fn sample() -> Self {
        let path = (0..91)
            .map(|i| [-60.0 + i as f32 * 1.5, 0.0, 0.0])
            .collect();

        Self {
            name: "coastal_walk".to_string(),
            ticks: None,
            streaming: None,
            sections: vec![
                ScenarioSection {
                    name: "harbor".to_string(),
                    center: [-40.0, 0.0, 0.0],
                    enter_radius: 12.0,
                    exit_radius: 18.0,
                    priority: 1,
                    estimated_cost: 0.0,
                    content: None,
                },
                ScenarioSection {
                    name: "village".to_string(),
                    center: [0.0, 0.0, 0.0],
                    enter_radius: 15.0,
                    exit_radius: 20.0,
                    priority: 0,
                    estimated_cost: 0.0,
                    content: None,
                },
                ScenarioSection {
                    name: "lighthouse".to_string(),
                    center: [45.0, 0.0, 0.0],
                    enter_radius: 10.0,
                    exit_radius: 15.0,
                    priority: 0,
                    estimated_cost: 20.0,
                    content: Some("coast/lighthouse".to_string()),
                },
            ],
            foci: vec![ScenarioFocus {
                id: 0,
                path,
                radius_scale: 1.0,
                load_radius_offset: 0.0,
                unload_radius_offset: 0.0,
            }],
            loader: ScenarioLoader::default(),
        }
    }
}
