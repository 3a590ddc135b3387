use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{Order, Orientation};
use crate::common::collections::BTreeMap;
use crate::common::config::{Config, LayoutSettings, NoGapsWhenOnly, WorkspaceRule};
use crate::model::WorkspaceId;

pub const OPT_ORIENTATION: &str = "nstack-orientation";
pub const OPT_ORDER: &str = "nstack-order";
pub const OPT_STACKS: &str = "nstack-stacks";
pub const OPT_MFACT: &str = "nstack-mfact";
pub const OPT_SINGLE_MFACT: &str = "nstack-single_mfact";
pub const OPT_XFACT: &str = "nstack-xfact";
pub const OPT_SPECIAL_SCALE_FACTOR: &str = "nstack-special_scale_factor";
pub const OPT_NEW_ON_TOP: &str = "nstack-new_on_top";
pub const OPT_NEW_IS_MASTER: &str = "nstack-new_is_master";
pub const OPT_NO_GAPS_WHEN_ONLY: &str = "nstack-no_gaps_when_only";
pub const OPT_INHERIT_FULLSCREEN: &str = "nstack-inherit_fullscreen";
pub const OPT_CENTER_SINGLE_MASTER: &str = "nstack-center_single_master";
pub const OPT_AUTO_PROMOTE: &str = "nstack-auto_promote";
pub const OPT_AUTO_DEMOTE: &str = "nstack-auto_demote";

/// Every key a workspace rule may carry in `layout_opts`.
pub const LAYOUT_OPTS: [&str; 14] = [
    OPT_ORIENTATION,
    OPT_ORDER,
    OPT_STACKS,
    OPT_MFACT,
    OPT_SINGLE_MFACT,
    OPT_XFACT,
    OPT_SPECIAL_SCALE_FACTOR,
    OPT_NEW_ON_TOP,
    OPT_NEW_IS_MASTER,
    OPT_NO_GAPS_WHEN_ONLY,
    OPT_INHERIT_FULLSCREEN,
    OPT_CENTER_SINGLE_MASTER,
    OPT_AUTO_PROMOTE,
    OPT_AUTO_DEMOTE,
];

bitflags! {
    /// Options set by a command. These are no longer re-read from configuration.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Overrides: u8 {
        const ORIENTATION = 1 << 0;
        const ORDER       = 1 << 1;
        const STACKS      = 1 << 2;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkspaceSettings {
    pub workspace: WorkspaceId,
    pub orientation: Orientation,
    pub order: Order,
    pub stacks: usize,
    pub mfact: f64,
    pub single_mfact: f64,
    pub xfact: f64,
    pub special_scale_factor: f64,
    pub new_on_top: bool,
    pub new_is_master: bool,
    pub no_gaps_when_only: NoGapsWhenOnly,
    pub inherit_fullscreen: bool,
    pub center_single_master: bool,
    pub auto_promote: usize,
    pub auto_demote: usize,
    pub overrides: Overrides,
    /// Per-stack size multipliers. Index 0 is unused.
    pub stack_fractions: Vec<f64>,
    /// Nodes per stack from the last placement pass.
    pub stack_node_counts: Vec<usize>,
}

impl WorkspaceSettings {
    fn new(workspace: WorkspaceId, defaults: &LayoutSettings) -> Self {
        Self {
            workspace,
            orientation: defaults.orientation,
            order: defaults.order,
            stacks: 2,
            mfact: defaults.mfact,
            single_mfact: defaults.single_mfact,
            xfact: defaults.xfact,
            special_scale_factor: defaults.special_scale_factor,
            new_on_top: defaults.new_on_top,
            new_is_master: defaults.new_is_master,
            no_gaps_when_only: defaults.no_gaps_when_only,
            inherit_fullscreen: defaults.inherit_fullscreen,
            center_single_master: defaults.center_single_master,
            auto_promote: defaults.auto_promote,
            auto_demote: defaults.auto_demote,
            overrides: Overrides::empty(),
            stack_fractions: Vec::new(),
            stack_node_counts: Vec::new(),
        }
    }

    /// Stack count used for placement, the master area included.
    pub fn effective_stacks(&self) -> usize {
        if self.orientation.is_center() {
            self.stacks.max(3)
        } else {
            self.stacks.max(2)
        }
    }

    /// Re-derives every option that was not overridden by a command.
    fn refresh(&mut self, defaults: &LayoutSettings, rule: Option<&WorkspaceRule>) {
        let ws = self.workspace;
        let value = |key: &str| rule.and_then(|r| r.opt(key));

        if !self.overrides.contains(Overrides::ORIENTATION) {
            self.orientation = from_rule(ws, value(OPT_ORIENTATION), OPT_ORIENTATION, defaults.orientation, |raw| {
                Orientation::from_str(raw.trim()).ok()
            });
        }
        if !self.overrides.contains(Overrides::ORDER) {
            self.order = value(OPT_ORDER).map_or(defaults.order, Order::from_prefix);
        }
        if !self.overrides.contains(Overrides::STACKS) {
            let stacks = from_rule(ws, value(OPT_STACKS), OPT_STACKS, defaults.stacks, parse_count);
            if stacks != 0 {
                self.stacks = stacks;
            }
        }

        self.mfact = from_rule(ws, value(OPT_MFACT), OPT_MFACT, defaults.mfact, parse_float);
        self.single_mfact =
            from_rule(ws, value(OPT_SINGLE_MFACT), OPT_SINGLE_MFACT, defaults.single_mfact, parse_float);
        self.xfact = from_rule(ws, value(OPT_XFACT), OPT_XFACT, defaults.xfact, parse_float);
        self.special_scale_factor = from_rule(
            ws,
            value(OPT_SPECIAL_SCALE_FACTOR),
            OPT_SPECIAL_SCALE_FACTOR,
            defaults.special_scale_factor,
            parse_float,
        );
        self.new_on_top =
            from_rule(ws, value(OPT_NEW_ON_TOP), OPT_NEW_ON_TOP, defaults.new_on_top, parse_bool);
        self.new_is_master =
            from_rule(ws, value(OPT_NEW_IS_MASTER), OPT_NEW_IS_MASTER, defaults.new_is_master, parse_bool);
        self.no_gaps_when_only = from_rule(
            ws,
            value(OPT_NO_GAPS_WHEN_ONLY),
            OPT_NO_GAPS_WHEN_ONLY,
            defaults.no_gaps_when_only,
            NoGapsWhenOnly::parse,
        );
        self.inherit_fullscreen = from_rule(
            ws,
            value(OPT_INHERIT_FULLSCREEN),
            OPT_INHERIT_FULLSCREEN,
            defaults.inherit_fullscreen,
            parse_bool,
        );
        self.center_single_master = from_rule(
            ws,
            value(OPT_CENTER_SINGLE_MASTER),
            OPT_CENTER_SINGLE_MASTER,
            defaults.center_single_master,
            parse_bool,
        );
        self.auto_promote =
            from_rule(ws, value(OPT_AUTO_PROMOTE), OPT_AUTO_PROMOTE, defaults.auto_promote, parse_count);
        self.auto_demote =
            from_rule(ws, value(OPT_AUTO_DEMOTE), OPT_AUTO_DEMOTE, defaults.auto_demote, parse_count);
    }
}

fn from_rule<T: Copy>(
    workspace: WorkspaceId,
    raw: Option<&str>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(raw) {
        Some(value) => value,
        None => {
            error!(%workspace, key, raw, "invalid layout option, using the global default");
            default
        }
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse().ok().filter(|v: &f64| v.is_finite())
}

fn parse_count(raw: &str) -> Option<usize> { raw.trim().parse().ok() }

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        other => other.parse::<i64>().ok().map(|n| n != 0),
    }
}

/// Lazily created layout settings per workspace.
#[derive(Serialize, Deserialize, Debug, Default)]
pub(crate) struct WorkspaceLayouts {
    map: BTreeMap<WorkspaceId, WorkspaceSettings>,
}

impl WorkspaceLayouts {
    /// Returns the settings of `workspace`, creating them on first use and
    /// refreshing every option that no command has overridden.
    pub(crate) fn resolve(&mut self, config: &Config, workspace: WorkspaceId) -> &mut WorkspaceSettings {
        let defaults = &config.settings.layout;
        let settings = self
            .map
            .entry(workspace)
            .or_insert_with(|| WorkspaceSettings::new(workspace, defaults));
        settings.refresh(defaults, config.rule_for(workspace));
        settings
    }

    pub(crate) fn get(&self, workspace: WorkspaceId) -> Option<&WorkspaceSettings> {
        self.map.get(&workspace)
    }

    pub(crate) fn remove(&mut self, workspace: WorkspaceId) -> Option<WorkspaceSettings> {
        self.map.remove(&workspace)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn config_with_rule(opts: &[(&str, &str)]) -> Config {
        let mut config = Config::default();
        let mut rule = WorkspaceRule::new(WorkspaceId(1));
        for (k, v) in opts {
            rule.layout_opts.insert(k.to_string(), v.to_string());
        }
        config.workspace_rules.push(rule);
        config
    }

    #[test]
    fn defaults_come_from_global_settings() {
        let mut config = Config::default();
        config.settings.layout.stacks = 4;
        config.settings.layout.orientation = Orientation::Top;
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&config, WorkspaceId(5));
        assert_eq!(ws.stacks, 4);
        assert_eq!(ws.orientation, Orientation::Top);
        assert_eq!(ws.order, Order::Row);
        assert!(ws.new_is_master);
        assert_eq!(ws.special_scale_factor, 0.8);
    }

    #[test]
    fn rule_options_win_over_defaults() {
        let config = config_with_rule(&[
            (OPT_ORIENTATION, "center"),
            (OPT_ORDER, "rcol"),
            (OPT_STACKS, "3"),
            (OPT_MFACT, "0.6"),
            (OPT_NEW_IS_MASTER, "0"),
            (OPT_NO_GAPS_WHEN_ONLY, "2"),
            (OPT_CENTER_SINGLE_MASTER, "yes"),
        ]);
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&config, WorkspaceId(1));
        assert_eq!(ws.orientation, Orientation::HCenter);
        assert_eq!(ws.order, Order::ReversedColumn);
        assert_eq!(ws.stacks, 3);
        assert_eq!(ws.mfact, 0.6);
        assert!(!ws.new_is_master);
        assert_eq!(ws.no_gaps_when_only, NoGapsWhenOnly::KeepBorder);
        assert!(ws.center_single_master);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let config = config_with_rule(&[
            (OPT_ORIENTATION, "sideways"),
            (OPT_MFACT, "lots"),
            (OPT_STACKS, "-3"),
            (OPT_INHERIT_FULLSCREEN, "maybe"),
        ]);
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&config, WorkspaceId(1));
        assert_eq!(ws.orientation, Orientation::Left);
        assert_eq!(ws.mfact, 0.0);
        assert_eq!(ws.stacks, 2);
        assert!(ws.inherit_fullscreen);
    }

    #[test]
    fn zero_stacks_keep_previous_value() {
        let mut config = config_with_rule(&[(OPT_STACKS, "4")]);
        let mut layouts = WorkspaceLayouts::default();
        assert_eq!(layouts.resolve(&config, WorkspaceId(1)).stacks, 4);

        config.workspace_rules[0].layout_opts.insert(OPT_STACKS.into(), "0".into());
        assert_eq!(layouts.resolve(&config, WorkspaceId(1)).stacks, 4);
    }

    #[test]
    fn overrides_survive_refresh() {
        let config = config_with_rule(&[(OPT_ORIENTATION, "top"), (OPT_STACKS, "3")]);
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&config, WorkspaceId(1));
        ws.orientation = Orientation::Right;
        ws.overrides |= Overrides::ORIENTATION;
        ws.stacks = 5;

        let ws = layouts.resolve(&config, WorkspaceId(1));
        assert_eq!(ws.orientation, Orientation::Right);
        assert_eq!(ws.stacks, 3);

        ws.overrides = Overrides::empty();
        assert_eq!(layouts.resolve(&config, WorkspaceId(1)).orientation, Orientation::Top);
    }

    #[test]
    fn effective_stacks_for_center() {
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&Config::default(), WorkspaceId(1));
        assert_eq!(ws.effective_stacks(), 2);
        ws.orientation = Orientation::VCenter;
        assert_eq!(ws.effective_stacks(), 3);
    }

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("7"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("perhaps"), None);
    }

    #[test]
    fn non_finite_numbers_use_the_default() {
        let mut config =
            config_with_rule(&[(OPT_MFACT, "NaN"), (OPT_XFACT, "inf"), (OPT_SINGLE_MFACT, "-inf")]);
        config.settings.layout.mfact = 0.3;
        let mut layouts = WorkspaceLayouts::default();
        let ws = layouts.resolve(&config, WorkspaceId(1));
        assert_eq!(ws.mfact, 0.3);
        assert_eq!(ws.xfact, 0.0);
        assert_eq!(ws.single_mfact, config.settings.layout.single_mfact);
    }
}
