use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MvdlError;
use crate::mvweb::SearchResult;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkipRule {
    pub condition: String,
    pub value: String,
}

impl fmt::Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.condition, self.value)
    }
}

#[derive(Debug, Clone)]
enum Condition {
    TitleContains(String),
    ShorterThan(Duration),
}

impl Condition {
    fn fires(&self, result: &SearchResult) -> bool {
        match self {
            Condition::TitleContains(value) => result.title.contains(value),
            Condition::ShorterThan(threshold) => {
                Duration::from_secs(result.duration) < *threshold
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkipSet {
    rules: Vec<(SkipRule, Condition)>,
}

impl SkipSet {
    pub fn compile(rules: &[SkipRule]) -> Result<Self, MvdlError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let condition = match rule.condition.as_str() {
                    "title_contains" => Condition::TitleContains(rule.value.clone()),
                    "shorter_than" => Condition::ShorterThan(parse_duration(&rule.value)?),
                    other => return Err(MvdlError::UnknownCondition(other.to_string())),
                };
                Ok((rule.clone(), condition))
            })
            .collect::<Result<Vec<_>, MvdlError>>()?;
        Ok(Self { rules })
    }

    pub fn first_match(&self, result: &SearchResult) -> Option<&SkipRule> {
        self.rules
            .iter()
            .find(|(_, condition)| condition.fires(result))
            .map(|(rule, _)| rule)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub fn parse_duration(value: &str) -> Result<Duration, MvdlError> {
    let invalid = |reason: String| MvdlError::InvalidDuration {
        value: value.to_string(),
        reason,
    };

    let mut rest = value.trim();
    if rest.is_empty() {
        return Err(invalid("empty duration".to_string()));
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_end = rest
            .find(|ch: char| !ch.is_ascii_digit() && ch != '.')
            .unwrap_or(rest.len());
        let number: f64 = rest[..number_end]
            .parse()
            .map_err(|_| invalid(format!("expected a number at {rest:?}")))?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(rest.len());
        let unit_secs = match &rest[..unit_end] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            "" => return Err(invalid("missing unit".to_string())),
            unit => return Err(invalid(format!("unknown unit {unit:?}"))),
        };
        rest = &rest[unit_end..];

        total += Duration::try_from_secs_f64(number * unit_secs)
            .map_err(|err| invalid(err.to_string()))?;
    }
    Ok(total)
}
