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

//! Kubernetes resource quantities (`500m`, `1Gi`, `2e3`)

use crate::shared::error::{KbError, Result};

const BINARY_SUFFIXES: [(&str, f64); 6] = [
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
];

const DECIMAL_SUFFIXES: [(&str, f64); 8] = [
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
];

/// Parse a quantity string into its value in base units.
pub fn parse_quantity(s: &str) -> Result<f64> {
    let s = s.trim();
    let invalid = || KbError::validation(format!("invalid quantity: {}", s));
    if s.is_empty() {
        return Err(invalid());
    }

    let (num_str, multiplier) = if let Some((suffix, m)) =
        BINARY_SUFFIXES.iter().find(|(suffix, _)| s.ends_with(suffix))
    {
        (&s[..s.len() - suffix.len()], *m)
    } else if let Some((suffix, m)) = DECIMAL_SUFFIXES.iter().find(|(suffix, _)| s.ends_with(suffix)) {
        (&s[..s.len() - suffix.len()], *m)
    } else if s.ends_with('E') && !s.contains('e') {
        (&s[..s.len() - 1], 1e18)
    } else {
        (s, 1.0)
    };

    let num: f64 = num_str.trim().parse().map_err(|_| invalid())?;
    Ok(num * multiplier)
}

/// Value scaled by 1000, rounded up, as Kubernetes reports milli-values.
pub fn milli_value(s: &str) -> Result<i64> {
    Ok((parse_quantity(s)? * 1000.0).ceil() as i64)
}

/// Render memory quantities expressed in milli-bytes with a binary unit.
///
/// Anything not ending in `m` is returned unchanged.
pub fn normalize_memory(mem: &str) -> String {
    if !mem.ends_with('m') {
        return mem.to_string();
    }
    let bytes = match milli_value(mem) {
        Ok(v) => v as f64 / 1000.0,
        Err(_) => return mem.to_string(),
    };
    let (value, suffix) = if bytes < 1024.0 {
        (bytes / 1024.0, "Ki")
    } else if bytes < 1024.0 * 1024.0 {
        (bytes / 1024.0 / 1024.0, "Mi")
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        (bytes / 1024.0 / 1024.0 / 1024.0, "Gi")
    } else {
        (bytes / 1024.0 / 1024.0 / 1024.0 / 1024.0, "Ti")
    };
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, suffix)
}
