use std::fmt;

use crate::error::{MuraleError, MuraleResult};

/// How a layer's image is laid out on the desktop. The serialized names match
/// the host's settings strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Fill,
    Fit,
    Stretch,
    Center,
    Tile,
}

impl DisplayMode {
    pub fn parse(s: &str) -> MuraleResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill" => Ok(Self::Fill),
            "fit" => Ok(Self::Fit),
            "stretch" => Ok(Self::Stretch),
            "center" => Ok(Self::Center),
            "tile" => Ok(Self::Tile),
            other => Err(MuraleError::host(format!("unknown display mode '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Fit => "fit",
            Self::Stretch => "stretch",
            Self::Center => "center",
            Self::Tile => "tile",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Animation used when swapping the visible wallpaper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    Slide,
    Zoom,
}

impl TransitionKind {
    pub fn parse(s: &str) -> MuraleResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "slide" => Ok(Self::Slide),
            "zoom" => Ok(Self::Zoom),
            other => Err(MuraleError::host(format!(
                "unknown transition kind '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of an in-flight transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Prep,
    Entering,
}

impl Phase {
    /// Class token the host animation hooks on; the `prep` → `enter` flip is
    /// what starts the animation.
    pub fn stage_class(self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Prep => "prep",
            Self::Entering => "enter",
        }
    }
}

/// Identifies one of the two compositing layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerId {
    Base,
    Top,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_host_strings() {
        assert_eq!(DisplayMode::parse("fill").unwrap(), DisplayMode::Fill);
        assert_eq!(DisplayMode::parse(" Tile ").unwrap(), DisplayMode::Tile);
        assert!(DisplayMode::parse("mosaic").is_err());

        assert_eq!(
            TransitionKind::parse("fade").unwrap(),
            TransitionKind::Fade
        );
        assert_eq!(
            TransitionKind::parse("NONE").unwrap(),
            TransitionKind::None
        );
        assert!(TransitionKind::parse("wipe").is_err());
    }

    #[test]
    fn serde_names_match_host_settings() {
        assert_eq!(
            serde_json::to_string(&DisplayMode::Stretch).unwrap(),
            "\"stretch\""
        );
        let kind: TransitionKind = serde_json::from_str("\"zoom\"").unwrap();
        assert_eq!(kind, TransitionKind::Zoom);
    }

    #[test]
    fn defaults_match_host_settings() {
        assert_eq!(DisplayMode::default(), DisplayMode::Fill);
        assert_eq!(TransitionKind::default(), TransitionKind::None);
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn stage_class_tokens() {
        assert_eq!(Phase::Idle.stage_class(), "");
        assert_eq!(Phase::Prep.stage_class(), "prep");
        assert_eq!(Phase::Entering.stage_class(), "enter");
    }
}
