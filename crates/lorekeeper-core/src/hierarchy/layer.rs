//! Timeline hierarchy layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InsightError;

/// Hierarchy tag of a timeline node, ordered from broadest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineLayer {
    Mythos,
    Epoch,
    Era,
    Saga,
    Arc,
    Chapter,
    Scene,
    Action,
    Microaction,
}

impl TimelineLayer {
    /// All layers, broadest first.
    pub const ALL: [TimelineLayer; 9] = [
        Self::Mythos,
        Self::Epoch,
        Self::Era,
        Self::Saga,
        Self::Arc,
        Self::Chapter,
        Self::Scene,
        Self::Action,
        Self::Microaction,
    ];

    /// Layers that take part in parallel-structure resolution.
    pub const PARALLEL_LAYERS: [TimelineLayer; 2] = [Self::Saga, Self::Arc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mythos => "mythos",
            Self::Epoch => "epoch",
            Self::Era => "era",
            Self::Saga => "saga",
            Self::Arc => "arc",
            Self::Chapter => "chapter",
            Self::Scene => "scene",
            Self::Action => "action",
            Self::Microaction => "microaction",
        }
    }

    /// Whether nodes on this layer own children with measurable coverage.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Era | Self::Saga | Self::Arc)
    }

    /// Whether nodes on this layer are eligible for parallel resolution.
    pub fn supports_parallels(&self) -> bool {
        matches!(self, Self::Saga | Self::Arc)
    }

    /// The layer immediately below this one, if any.
    pub fn child_layer(&self) -> Option<TimelineLayer> {
        let idx = Self::ALL.iter().position(|l| l == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl fmt::Display for TimelineLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimelineLayer {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| InsightError::UnknownLayer {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_layers() {
        let containers: Vec<_> = TimelineLayer::ALL
            .iter()
            .filter(|l| l.is_container())
            .collect();
        assert_eq!(
            containers,
            vec![&TimelineLayer::Era, &TimelineLayer::Saga, &TimelineLayer::Arc]
        );
    }

    #[test]
    fn parallel_layers_are_saga_and_arc() {
        for layer in TimelineLayer::ALL {
            assert_eq!(
                layer.supports_parallels(),
                TimelineLayer::PARALLEL_LAYERS.contains(&layer)
            );
        }
    }

    #[test]
    fn child_layer_steps_down_one() {
        assert_eq!(TimelineLayer::Era.child_layer(), Some(TimelineLayer::Saga));
        assert_eq!(TimelineLayer::Arc.child_layer(), Some(TimelineLayer::Chapter));
        assert_eq!(TimelineLayer::Microaction.child_layer(), None);
    }

    #[test]
    fn parse_and_display_agree() {
        for layer in TimelineLayer::ALL {
            assert_eq!(layer.to_string().parse::<TimelineLayer>().unwrap(), layer);
        }
    }

    #[test]
    fn unknown_layer_names_the_input() {
        let err = "galaxy".parse::<TimelineLayer>().unwrap_err();
        assert!(matches!(err, InsightError::UnknownLayer { ref value } if value == "galaxy"));
        assert_eq!(err.to_string(), "Unknown timeline layer: 'galaxy'");
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&TimelineLayer::Microaction).unwrap();
        assert_eq!(json, "\"microaction\"");
    }
}
