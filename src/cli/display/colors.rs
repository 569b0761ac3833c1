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

//! Color theme for CLI output

use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color for a resource phase (Backup, BackupPolicy, MigrationTask).
    pub fn phase_color(&self, phase: &str) -> TableColor {
        let phase = phase.split('(').next().unwrap_or_default();
        match phase {
            "Completed" | "Available" | "Running" | "Succeed" => self.success,
            "Failed" | "Unavailable" | "Deleting" => self.error,
            "" => self.muted,
            _ => self.warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.success, TableColor::Green);
        assert_eq!(theme.warning, TableColor::Yellow);
        assert_eq!(theme.error, TableColor::Red);
    }

    #[test]
    fn test_phase_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.phase_color("Completed"), TableColor::Green);
        assert_eq!(theme.phase_color("Running(AvailablePods: 1)"), TableColor::Green);
        assert_eq!(theme.phase_color("Failed"), TableColor::Red);
        assert_eq!(theme.phase_color("New"), TableColor::Yellow);
        assert_eq!(theme.phase_color(""), TableColor::DarkGrey);
    }
}
