use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::collections::{BTreeMap, HashSet};
use crate::layout_engine::{LAYOUT_OPTS, Order, Orientation};
use crate::model::WorkspaceId;

pub fn config_file() -> Option<PathBuf> { dirs::home_dir().map(|home| home.join(".nstack.toml")) }

/// `Config::default()` is what an empty file parses to. The shipped
/// defaults, gaps included, come from [`Config::bundled`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub workspace_rules: Vec<WorkspaceRule>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Animate placements that result from a manual resize.
    #[serde(default = "no")]
    pub animate_manual_resizes: bool,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub gaps: GapSettings,
}

/// Global layout defaults. Workspace rules may override each of these
/// through their `layout_opts`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub order: Order,
    /// Number of stacks, the master area included.
    #[serde(default = "default_stacks")]
    pub stacks: usize,
    /// Master share of the primary axis. Zero derives it from the window count.
    #[serde(default)]
    pub mfact: f64,
    #[serde(default = "default_single_mfact")]
    pub single_mfact: f64,
    /// Shrinks the usable area along the primary axis when in (0, 1).
    #[serde(default)]
    pub xfact: f64,
    #[serde(default = "default_special_scale_factor")]
    pub special_scale_factor: f64,
    #[serde(default = "no")]
    pub new_on_top: bool,
    #[serde(default = "yes")]
    pub new_is_master: bool,
    #[serde(default)]
    pub no_gaps_when_only: NoGapsWhenOnly,
    #[serde(default = "yes")]
    pub inherit_fullscreen: bool,
    #[serde(default = "no")]
    pub center_single_master: bool,
    #[serde(default)]
    pub auto_promote: usize,
    #[serde(default)]
    pub auto_demote: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoGapsWhenOnly {
    #[default]
    Off,
    On,
    /// Drop gaps but keep the window border.
    KeepBorder,
}

impl NoGapsWhenOnly {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" | "off" | "false" | "no" => Some(Self::Off),
            "1" | "on" | "true" | "yes" => Some(Self::On),
            "2" | "keep_border" | "keepborder" => Some(Self::KeepBorder),
            _ => None,
        }
    }
}

/// Gap configuration for window spacing
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Gap between adjacent windows
    #[serde(default)]
    pub inner: f64,
    /// Gap between windows and the usable monitor edge
    #[serde(default)]
    pub outer: OuterGaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

/// Per-workspace overrides, keyed by workspace id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceRule {
    pub workspace: i64,
    /// Raw layout options such as `nstack-orientation = "hcenter"`.
    #[serde(default)]
    pub layout_opts: BTreeMap<String, String>,
    #[serde(default)]
    pub gaps_in: Option<f64>,
    /// Uniform outer gap on all sides.
    #[serde(default)]
    pub gaps_out: Option<f64>,
    #[serde(default)]
    pub no_border: Option<bool>,
    #[serde(default)]
    pub decorate: Option<bool>,
}

impl WorkspaceRule {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self {
            workspace: workspace.0,
            layout_opts: BTreeMap::new(),
            gaps_in: None,
            gaps_out: None,
            no_border: None,
            decorate: None,
        }
    }

    pub fn opt(&self, key: &str) -> Option<&str> { self.layout_opts.get(key).map(String::as_str) }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animate_manual_resizes: false,
            layout: LayoutSettings::default(),
            gaps: GapSettings::default(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            order: Order::default(),
            stacks: default_stacks(),
            mfact: 0.0,
            single_mfact: default_single_mfact(),
            xfact: 0.0,
            special_scale_factor: default_special_scale_factor(),
            new_on_top: false,
            new_is_master: true,
            no_gaps_when_only: NoGapsWhenOnly::Off,
            inherit_fullscreen: true,
            center_single_master: false,
            auto_promote: 0,
            auto_demote: 0,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.gaps.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.layout.auto_fix_values() + self.gaps.auto_fix_values()
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.stacks < 2 {
            issues.push(format!("stacks must be at least 2, got {}", self.stacks));
        }

        if !(0.0..=0.95).contains(&self.mfact) {
            issues.push(format!("mfact must be within [0, 0.95], got {}", self.mfact));
        }

        if !(0.0..=0.95).contains(&self.single_mfact) {
            issues.push(format!(
                "single_mfact must be within [0, 0.95], got {}",
                self.single_mfact
            ));
        }

        if !(0.0..=1.0).contains(&self.xfact) {
            issues.push(format!("xfact must be within [0, 1], got {}", self.xfact));
        }

        if self.special_scale_factor <= 0.0 || self.special_scale_factor > 1.0 {
            issues.push(format!(
                "special_scale_factor must be within (0, 1], got {}",
                self.special_scale_factor
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.stacks < 2 {
            self.stacks = default_stacks();
            fixes += 1;
        }

        if !(0.0..=0.95).contains(&self.mfact) {
            self.mfact = 0.0;
            fixes += 1;
        }

        if !(0.0..=0.95).contains(&self.single_mfact) {
            self.single_mfact = default_single_mfact();
            fixes += 1;
        }

        if !(0.0..=1.0).contains(&self.xfact) {
            self.xfact = 0.0;
            fixes += 1;
        }

        if self.special_scale_factor <= 0.0 || self.special_scale_factor > 1.0 {
            self.special_scale_factor = default_special_scale_factor();
            fixes += 1;
        }

        fixes
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.inner < 0.0 {
            issues.push(format!("inner gap must be non-negative, got {}", self.inner));
        }

        for (side, value) in self.outer.sides() {
            if value < 0.0 {
                issues.push(format!("outer {side} gap must be non-negative, got {value}"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.inner < 0.0 {
            self.inner = 0.0;
            fixes += 1;
        }

        for value in [
            &mut self.outer.top,
            &mut self.outer.left,
            &mut self.outer.bottom,
            &mut self.outer.right,
        ] {
            if *value < 0.0 {
                *value = 0.0;
                fixes += 1;
            }
        }

        fixes
    }
}

impl OuterGaps {
    pub fn uniform(gap: f64) -> Self {
        Self {
            top: gap,
            left: gap,
            bottom: gap,
            right: gap,
        }
    }

    fn sides(&self) -> [(&'static str, f64); 4] {
        [
            ("top", self.top),
            ("left", self.left),
            ("bottom", self.bottom),
            ("right", self.right),
        ]
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_stacks() -> usize { 2 }

fn default_single_mfact() -> f64 { 0.5 }

fn default_special_scale_factor() -> f64 { 0.8 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// The configuration shipped with the crate.
    pub fn bundled() -> anyhow::Result<Config> { Self::parse(include_str!("../../nstack.default.toml")) }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn rule_for(&self, workspace: WorkspaceId) -> Option<&WorkspaceRule> {
        self.workspace_rules.iter().find(|rule| rule.workspace == workspace.0)
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();

        let mut seen = HashSet::default();
        for rule in &self.workspace_rules {
            if !seen.insert(rule.workspace) {
                issues.push(format!(
                    "duplicate rule for workspace {}, only the first one applies",
                    rule.workspace
                ));
            }
            for key in rule.layout_opts.keys() {
                if !LAYOUT_OPTS.contains(&key.as_str()) {
                    issues.push(format!(
                        "unknown layout option '{key}' in rule for workspace {}",
                        rule.workspace
                    ));
                }
            }
            if rule.gaps_in.is_some_and(|g| g < 0.0) || rule.gaps_out.is_some_and(|g| g < 0.0) {
                issues.push(format!(
                    "gaps for workspace {} must be non-negative",
                    rule.workspace
                ));
            }
        }

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.settings.auto_fix_values();

        for rule in &mut self.workspace_rules {
            let before = rule.layout_opts.len();
            rule.layout_opts.retain(|key, _| LAYOUT_OPTS.contains(&key.as_str()));
            fixes += before - rule.layout_opts.len();

            for gap in [&mut rule.gaps_in, &mut rule.gaps_out] {
                if gap.is_some_and(|g| g < 0.0) {
                    *gap = None;
                    fixes += 1;
                }
            }
        }

        fixes
    }
}
