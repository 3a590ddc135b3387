use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Order, Orientation, ResizeDelta};

/// Which window keeps focus after a master swap or focus change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusHint {
    #[default]
    Auto,
    Master,
    Child,
}

impl FocusHint {
    fn parse(arg: Option<&str>) -> Self {
        match arg {
            Some("master") => FocusHint::Master,
            Some("child") => FocusHint::Child,
            _ => FocusHint::Auto,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StackCount {
    Absolute(i64),
    Relative(i64),
}

impl StackCount {
    /// `+n`/`-n` are relative to the current count. Anything unparsable
    /// means two stacks.
    fn parse(raw: &str) -> Self {
        let relative = raw.starts_with(['+', '-']);
        match raw.parse::<i64>() {
            Ok(n) if relative => StackCount::Relative(n),
            Ok(n) => StackCount::Absolute(n),
            Err(_) => StackCount::Absolute(2),
        }
    }

    /// The requested count. A relative change that overflows means two
    /// stacks.
    pub fn resolve(self, current: usize) -> i64 {
        match self {
            StackCount::Absolute(n) => n,
            StackCount::Relative(n) => i64::try_from(current)
                .ok()
                .and_then(|current| current.checked_add(n))
                .unwrap_or(2),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    SwapWithMaster(FocusHint),
    FocusMaster(FocusHint),
    CycleNext,
    CyclePrev,
    SwapNext,
    SwapPrev,
    AddMaster,
    RemoveMaster,
    ToggleMaster,
    SetOrientation(Orientation),
    OrientationNext,
    OrientationPrev,
    /// Steps forward through the given orientations, or the default cycle
    /// when empty.
    OrientationCycle(Vec<Orientation>),
    ResetSplits,
    ResetOverrides,
    SetStackCount(StackCount),
    SetOrder(Order),
    OrderNext,
    OrderPrev,
    SplitRatio { ratio: f64, exact: bool },
    ResizeActive(ResizeDelta),
}

impl LayoutCommand {
    /// Parses a layout message such as `"swapwithmaster child"` or
    /// `"setstackcount +1"`.
    ///
    /// Returns `None` for unknown verbs and for messages that carry nothing
    /// to act on.
    pub fn parse(message: &str) -> Option<Self> {
        let mut args = message.split_whitespace();
        let verb = args.next()?;
        let cmd = match verb {
            "swapwithmaster" => LayoutCommand::SwapWithMaster(FocusHint::parse(args.next())),
            "focusmaster" => LayoutCommand::FocusMaster(FocusHint::parse(args.next())),
            "cyclenext" => LayoutCommand::CycleNext,
            "cycleprev" => LayoutCommand::CyclePrev,
            "swapnext" => LayoutCommand::SwapNext,
            "swapprev" => LayoutCommand::SwapPrev,
            "addmaster" => LayoutCommand::AddMaster,
            "removemaster" => LayoutCommand::RemoveMaster,
            "togglemaster" => LayoutCommand::ToggleMaster,
            "orientationnext" => LayoutCommand::OrientationNext,
            "orientationprev" => LayoutCommand::OrientationPrev,
            "orientationcycle" => LayoutCommand::OrientationCycle(
                args.filter_map(|name| Orientation::from_str(name).ok()).collect(),
            ),
            "resetsplits" => LayoutCommand::ResetSplits,
            "resetoverrides" => LayoutCommand::ResetOverrides,
            "setstackcount" => LayoutCommand::SetStackCount(StackCount::parse(args.next()?)),
            "ordernext" => LayoutCommand::OrderNext,
            "orderprev" => LayoutCommand::OrderPrev,
            "resizeactive" => LayoutCommand::ResizeActive(ResizeDelta::parse(args)?),
            "mfact" => {
                let mut arg = args.next()?;
                let exact = arg == "exact";
                if exact {
                    arg = args.next()?;
                }
                let ratio = arg.parse().ok().filter(|r: &f64| r.is_finite())?;
                LayoutCommand::SplitRatio { ratio, exact }
            }
            _ => {
                if let Some(name) = verb.strip_prefix("orientation") {
                    LayoutCommand::SetOrientation(Orientation::from_str(name).ok()?)
                } else if let Some(name) = verb.strip_prefix("order") {
                    LayoutCommand::SetOrder(Order::from_str(name).ok()?)
                } else {
                    debug!(verb, "unknown layout message");
                    return None;
                }
            }
        };
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_focus_hints() {
        assert_eq!(
            LayoutCommand::parse("swapwithmaster child"),
            Some(LayoutCommand::SwapWithMaster(FocusHint::Child))
        );
        assert_eq!(
            LayoutCommand::parse("swapwithmaster"),
            Some(LayoutCommand::SwapWithMaster(FocusHint::Auto))
        );
        assert_eq!(
            LayoutCommand::parse("focusmaster master"),
            Some(LayoutCommand::FocusMaster(FocusHint::Master))
        );
        assert_eq!(
            LayoutCommand::parse("focusmaster bogus"),
            Some(LayoutCommand::FocusMaster(FocusHint::Auto))
        );
    }

    #[test]
    fn parses_orientations() {
        assert_eq!(
            LayoutCommand::parse("orientationcenter"),
            Some(LayoutCommand::SetOrientation(Orientation::HCenter))
        );
        assert_eq!(
            LayoutCommand::parse("orientationvcenter"),
            Some(LayoutCommand::SetOrientation(Orientation::VCenter))
        );
        assert_eq!(
            LayoutCommand::parse("orientationcycle left nope right"),
            Some(LayoutCommand::OrientationCycle(vec![Orientation::Left, Orientation::Right]))
        );
        assert_eq!(LayoutCommand::parse("orientationdiagonal"), None);
    }

    #[test]
    fn parses_orders() {
        assert_eq!(LayoutCommand::parse("orderrrow"), Some(LayoutCommand::SetOrder(Order::ReversedRow)));
        assert_eq!(LayoutCommand::parse("ordercolumn"), Some(LayoutCommand::SetOrder(Order::Column)));
        assert_eq!(LayoutCommand::parse("ordernext"), Some(LayoutCommand::OrderNext));
        assert_eq!(LayoutCommand::parse("orderzigzag"), None);
    }

    #[test]
    fn parses_stack_counts() {
        let count = |msg| match LayoutCommand::parse(msg) {
            Some(LayoutCommand::SetStackCount(count)) => Some(count),
            _ => None,
        };
        assert_eq!(count("setstackcount 4"), Some(StackCount::Absolute(4)));
        assert_eq!(count("setstackcount +1"), Some(StackCount::Relative(1)));
        assert_eq!(count("setstackcount -2"), Some(StackCount::Relative(-2)));
        assert_eq!(count("setstackcount lots"), Some(StackCount::Absolute(2)));
        assert_eq!(count("setstackcount"), None);

        assert_eq!(StackCount::Relative(-1).resolve(2), 1);
        assert_eq!(StackCount::Absolute(5).resolve(2), 5);
    }

    #[test]
    fn parses_split_ratio() {
        assert_eq!(
            LayoutCommand::parse("mfact exact 0.6"),
            Some(LayoutCommand::SplitRatio { ratio: 0.6, exact: true })
        );
        assert_eq!(
            LayoutCommand::parse("mfact -0.05"),
            Some(LayoutCommand::SplitRatio { ratio: -0.05, exact: false })
        );
        assert_eq!(LayoutCommand::parse("mfact exact"), None);
        assert_eq!(LayoutCommand::parse("mfact wide"), None);
        assert_eq!(LayoutCommand::parse("mfact nan"), None);
        assert_eq!(LayoutCommand::parse("mfact exact inf"), None);
    }

    #[test]
    fn parses_resize_active() {
        assert_eq!(
            LayoutCommand::parse("resizeactive -20 10%"),
            ResizeDelta::parse(["-20", "10%"].into_iter()).map(LayoutCommand::ResizeActive)
        );
        assert!(matches!(
            LayoutCommand::parse("resizeactive exact 50% 400"),
            Some(LayoutCommand::ResizeActive(ResizeDelta { exact: true, .. }))
        ));
        assert_eq!(LayoutCommand::parse("resizeactive 20"), None);
    }

    #[test]
    fn relative_stack_count_overflow_means_two() {
        assert_eq!(StackCount::Relative(i64::MAX).resolve(2), 2);
        assert_eq!(StackCount::Relative(i64::MIN).resolve(0), i64::MIN);
        assert_eq!(StackCount::Relative(i64::MIN).resolve(1), i64::MIN + 1);
    }

    #[test]
    fn unknown_and_empty_messages() {
        assert_eq!(LayoutCommand::parse(""), None);
        assert_eq!(LayoutCommand::parse("   "), None);
        assert_eq!(LayoutCommand::parse("dance"), None);
    }
}
