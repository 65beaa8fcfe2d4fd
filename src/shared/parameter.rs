// This is free and unencumbered software released into the public domain.

//! Translation between typed parameter values and the camera's widget tree.

use crate::shared::{Backend, Camera, ConfigTree, GpStatus, WidgetKind, WidgetValue};
use core::{fmt, str::FromStr};
use derive_more::From;
use tracing::{debug, warn};

/// Integer target that selects the first non-numeric radio choice ("Auto" ISO).
pub const AUTO_CHOICE: i32 = -1;

#[derive(Clone, Debug, From, PartialEq)]
pub enum ParameterValue {
    Text(String),
    Bool(bool),
    Real(f64),
    Int(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Bool,
    Real,
    Int,
}

/// Widget kinds the session understands, with the value kinds each accepts on write.
const WIDGET_SUPPORT: &[(WidgetKind, &[ValueKind])] = &[
    (
        WidgetKind::Radio,
        &[ValueKind::Text, ValueKind::Real, ValueKind::Int],
    ),
    (
        WidgetKind::Toggle,
        &[ValueKind::Bool, ValueKind::Int, ValueKind::Real],
    ),
];

/// Whether a widget of kind `widget` can be written with a value of kind `value`.
pub fn accepts(widget: WidgetKind, value: ValueKind) -> bool {
    WIDGET_SUPPORT
        .iter()
        .any(|(kind, values)| *kind == widget && values.contains(&value))
}

/// Whether widgets of this kind can be read or written at all.
pub fn is_supported(widget: WidgetKind) -> bool {
    WIDGET_SUPPORT.iter().any(|(kind, _)| *kind == widget)
}

impl ParameterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Bool(_) => ValueKind::Bool,
            Self::Real(_) => ValueKind::Real,
            Self::Int(_) => ValueKind::Int,
        }
    }

    /// The value as a toggle state; zero is off, anything else on.
    pub fn as_toggle(&self) -> Option<i32> {
        match self {
            Self::Bool(v) => Some(*v as i32),
            Self::Int(v) => Some(*v),
            Self::Real(v) if v.is_finite() => Some(v.round() as i32),
            _ => None,
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(input: &str) -> Self {
        Self::Text(input.to_owned())
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

/// Parses a command-line literal: booleans, integers, reals, else text.
impl FromStr for ParameterValue {
    type Err = core::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Ok(match trimmed {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => {
                if let Some(v) = parse_int(trimmed) {
                    Self::Int(v)
                } else if let Some(v) = parse_real(trimmed) {
                    Self::Real(v)
                } else {
                    Self::Text(input.to_owned())
                }
            },
        })
    }
}

/// Snapshot of a single widget, for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub kind: WidgetKind,
    pub value: Option<ParameterValue>,
    pub choices: Vec<String>,
}

/// Parses a radio choice as an integer.
pub fn parse_int(choice: &str) -> Option<i32> {
    choice.trim().parse().ok()
}

/// Parses a radio choice as a real, accepting a decimal comma.
pub fn parse_real(choice: &str) -> Option<f64> {
    choice
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// The first choice within `tolerance` of `target`, in choice order.
pub fn nearest_real_choice(choices: &[String], target: f64, tolerance: f64) -> Option<&str> {
    choices
        .iter()
        .map(String::as_str)
        .find(|choice| parse_real(choice).is_some_and(|v| (v - target).abs() < tolerance))
}

/// The first choice equal to `target`; [`AUTO_CHOICE`] picks the first non-numeric one.
pub fn int_choice(choices: &[String], target: i32) -> Option<&str> {
    choices
        .iter()
        .map(String::as_str)
        .find(|choice| match parse_int(choice) {
            Some(v) => v == target,
            None => target == AUTO_CHOICE,
        })
}

fn config_root<B: Backend>(camera: &mut B::Camera, context: &B::Context) -> Option<B::Config> {
    camera
        .config(context)
        .map_err(|status| warn!(%status, "unable to get root option from gphoto"))
        .ok()
}

fn lookup<C: ConfigTree>(root: &C, name: &str) -> Option<(C::Node, WidgetKind)> {
    let node = root
        .child_by_name(name)
        .map_err(|status| debug!(option = name, %status, "unable to get config widget"))
        .ok()?;
    let kind = root
        .kind(node)
        .map_err(|status| warn!(option = name, %status, "unable to get config widget type"))
        .ok()?;
    Some((node, kind))
}

fn typed_value<C: ConfigTree>(
    root: &C,
    node: C::Node,
    kind: WidgetKind,
) -> Result<ParameterValue, GpStatus> {
    match (kind, root.value(node)?) {
        (WidgetKind::Toggle, WidgetValue::Int(v)) => Ok(ParameterValue::Bool(v != 0)),
        (_, WidgetValue::Int(v)) => Ok(ParameterValue::Int(v)),
        (_, WidgetValue::Text(v)) => Ok(ParameterValue::Text(v)),
    }
}

/// Reads a radio or toggle option from the camera.
pub(crate) fn read<B: Backend>(
    camera: &mut B::Camera,
    context: &B::Context,
    name: &str,
) -> Option<ParameterValue> {
    let root = config_root::<B>(camera, context)?;
    let (node, kind) = lookup(&root, name)?;

    if !is_supported(kind) {
        warn!(option = name, ?kind, "options of this type are currently not supported");
        return None;
    }

    match typed_value(&root, node, kind) {
        Ok(value) => Some(value),
        Err(status) => {
            warn!(option = name, %status, "unable to get value for option");
            None
        },
    }
}

/// Writes an option and pushes the modified configuration to the camera.
///
/// Returns `true` only if both the widget write and the config push succeeded.
pub(crate) fn write<B: Backend>(
    camera: &mut B::Camera,
    context: &B::Context,
    name: &str,
    value: &ParameterValue,
    tolerance: f64,
) -> bool {
    let Some(mut root) = config_root::<B>(camera, context) else {
        return false;
    };
    let Some((node, kind)) = lookup(&root, name) else {
        warn!(option = name, "unable to get option from gphoto");
        return false;
    };

    if !accepts(kind, value.kind()) {
        warn!(option = name, ?kind, %value, "value type is not supported for this option");
        return false;
    }

    let raw = match (kind, value) {
        (WidgetKind::Radio, ParameterValue::Text(v)) => WidgetValue::Text(v.clone()),
        (WidgetKind::Radio, ParameterValue::Real(target)) => {
            let choices = root.choices(node).unwrap_or_default();
            match nearest_real_choice(&choices, *target, tolerance) {
                Some(choice) => WidgetValue::Text(choice.to_owned()),
                None => {
                    warn!(option = name, wanted = *target, "can't find a matching value");
                    return false;
                },
            }
        },
        (WidgetKind::Radio, ParameterValue::Int(target)) => {
            let choices = root.choices(node).unwrap_or_default();
            match int_choice(&choices, *target) {
                Some(choice) => WidgetValue::Text(choice.to_owned()),
                None => {
                    warn!(option = name, wanted = *target, "can't find a matching value");
                    return false;
                },
            }
        },
        (WidgetKind::Toggle, value) => match value.as_toggle() {
            Some(v) => WidgetValue::Int(v),
            None => {
                warn!(option = name, %value, "value can't be used as a toggle state");
                return false;
            },
        },
        _ => return false,
    };

    if let Err(status) = root.set_value(node, &raw) {
        warn!(option = name, ?raw, %status, "failed to set value");
        return false;
    }

    if let Err(status) = camera.set_config(&root, context) {
        warn!(option = name, %status, "failed to set config to camera");
        return false;
    }

    true
}

/// Reads an option together with its choices, logging it at debug level.
pub(crate) fn describe<B: Backend>(
    camera: &mut B::Camera,
    context: &B::Context,
    name: &str,
) -> Option<ParameterInfo> {
    let root = config_root::<B>(camera, context)?;
    let (node, kind) = lookup(&root, name)?;

    let value = typed_value(&root, node, kind).ok();
    let choices = match kind {
        WidgetKind::Radio | WidgetKind::Menu => root.choices(node).unwrap_or_default(),
        _ => Vec::new(),
    };

    debug!(option = name, ?kind, ?value, ?choices, "camera option");

    Some(ParameterInfo {
        name: name.to_owned(),
        kind,
        value,
        choices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn real_match_uses_tolerance() {
        let choices = strings(&["4", "5.6", "8"]);
        assert_eq!(nearest_real_choice(&choices, 5.61, 0.1), Some("5.6"));
        assert_eq!(nearest_real_choice(&choices, 5.75, 0.1), None);
    }

    #[test]
    fn real_match_takes_first_within_tolerance() {
        let choices = strings(&["1/30", "2.05", "2", "2.1"]);
        assert_eq!(nearest_real_choice(&choices, 2.04, 0.1), Some("2.05"));
    }

    #[test]
    fn decimal_comma_parses() {
        assert_eq!(parse_real("1,8"), Some(1.8));
        let choices = strings(&["1,4", "1,8", "2,8"]);
        assert_eq!(nearest_real_choice(&choices, 1.8, 0.1), Some("1,8"));
    }

    #[test]
    fn int_match_and_auto() {
        let choices = strings(&["Auto", "100", "200", "400"]);
        assert_eq!(int_choice(&choices, -1), Some("Auto"));
        assert_eq!(int_choice(&choices, 200), Some("200"));
        assert_eq!(int_choice(&choices, 150), None);
    }

    #[test]
    fn auto_without_text_choice_fails() {
        let choices = strings(&["100", "200"]);
        assert_eq!(int_choice(&choices, AUTO_CHOICE), None);
    }

    #[test]
    fn support_table() {
        assert!(accepts(WidgetKind::Radio, ValueKind::Text));
        assert!(accepts(WidgetKind::Radio, ValueKind::Int));
        assert!(!accepts(WidgetKind::Radio, ValueKind::Bool));
        assert!(accepts(WidgetKind::Toggle, ValueKind::Bool));
        assert!(!accepts(WidgetKind::Toggle, ValueKind::Text));
        assert!(!is_supported(WidgetKind::Range));
        assert!(!is_supported(WidgetKind::Menu));
    }

    #[test]
    fn toggle_coercion() {
        assert_eq!(ParameterValue::Bool(true).as_toggle(), Some(1));
        assert_eq!(ParameterValue::Int(0).as_toggle(), Some(0));
        assert_eq!(ParameterValue::Real(2.0).as_toggle(), Some(2));
        assert_eq!(ParameterValue::from("on").as_toggle(), None);
    }

    #[test]
    fn literals() {
        assert_eq!("true".parse::<ParameterValue>(), Ok(ParameterValue::Bool(true)));
        assert_eq!("-1".parse::<ParameterValue>(), Ok(ParameterValue::Int(-1)));
        assert_eq!("5.6".parse::<ParameterValue>(), Ok(ParameterValue::Real(5.6)));
        assert_eq!("1,8".parse::<ParameterValue>(), Ok(ParameterValue::Real(1.8)));
        assert_eq!(
            "1/4000".parse::<ParameterValue>(),
            Ok(ParameterValue::Text("1/4000".to_owned()))
        );
    }
}
