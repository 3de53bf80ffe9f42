//! The closed set of trackable activity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Work,
    Study,
    Sport,
    Hobby,
    Sleep,
    Rest,
}

impl ActivityType {
    /// Every trackable activity, in display order.
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Work,
        ActivityType::Study,
        ActivityType::Sport,
        ActivityType::Hobby,
        ActivityType::Sleep,
        ActivityType::Rest,
    ];

    /// Stable tag used for persistence and parsing.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Work => "work",
            ActivityType::Study => "study",
            ActivityType::Sport => "sport",
            ActivityType::Hobby => "hobby",
            ActivityType::Sleep => "sleep",
            ActivityType::Rest => "rest",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivityType::Work => "Work",
            ActivityType::Study => "Study",
            ActivityType::Sport => "Sport",
            ActivityType::Hobby => "Hobby",
            ActivityType::Sleep => "Sleep",
            ActivityType::Rest => "Rest",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ActivityType::Work => "💼",
            ActivityType::Study => "📚",
            ActivityType::Sport => "🏃",
            ActivityType::Hobby => "🎨",
            ActivityType::Sleep => "😴",
            ActivityType::Rest => "🌴",
        }
    }

    /// One-character symbol used in compact timeline output.
    pub fn symbol(&self) -> char {
        match self {
            ActivityType::Work => 'W',
            ActivityType::Study => 'S',
            ActivityType::Sport => 'P',
            ActivityType::Hobby => 'H',
            ActivityType::Sleep => 'Z',
            ActivityType::Rest => 'R',
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown activity type: {0}")]
pub struct ParseActivityError(String);

impl FromStr for ActivityType {
    type Err = ParseActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(ActivityType::Work),
            "study" => Ok(ActivityType::Study),
            "sport" => Ok(ActivityType::Sport),
            "hobby" => Ok(ActivityType::Hobby),
            "sleep" => Ok(ActivityType::Sleep),
            "rest" => Ok(ActivityType::Rest),
            other => Err(ParseActivityError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        for activity in ActivityType::ALL {
            assert_eq!(activity.as_str().parse::<ActivityType>().unwrap(), activity);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("gaming".parse::<ActivityType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&ActivityType::Work).unwrap();
        assert_eq!(json, "\"work\"");
    }
}
