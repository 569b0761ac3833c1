// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::shared::error::{KbError, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

static RETENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+(?:y|mo|d|h|m))+$").unwrap());

static RETENTION_TERM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(y|mo|d|h|m)").unwrap());

/// A backup retention period such as `7d` or `1y2mo`.
///
/// A month counts as 30 days and a year as 365 days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPeriod(String);

impl RetentionPeriod {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !RETENTION_REGEX.is_match(raw) {
            return Err(KbError::validation(
                "invalid retention period, please refer to examples [1y, 1mo, 1d, 1h, 1m] or combine them [1y1mo1d1h1m]",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_duration(&self) -> Duration {
        let secs = RETENTION_TERM_REGEX
            .captures_iter(&self.0)
            .map(|cap| {
                let n: u64 = cap[1].parse().unwrap_or(0);
                let unit = match &cap[2] {
                    "y" => 365 * DAY,
                    "mo" => 30 * DAY,
                    "d" => DAY,
                    "h" => HOUR,
                    _ => 60,
                };
                n.saturating_mul(unit)
            })
            .fold(0u64, u64::saturating_add);
        Duration::from_secs(secs)
    }
}
