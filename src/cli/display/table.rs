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

use crate::cli::display::format::time_format;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use k8s_openapi::api::core::v1::Event;
use std::io::{self, Write};

/// Column-aligned table writer.
///
/// The default style is borderless like `kubectl get`; [`TablePrinter::boxed`]
/// draws UTF-8 borders for short result tables.
pub struct TablePrinter {
    table: Table,
    rows: usize,
}

impl Default for TablePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TablePrinter {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled);
        Self { table, rows: 0 }
    }

    pub fn boxed() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { table, rows: 0 }
    }

    /// Drop cell colors, e.g. for `--no-color`.
    pub fn without_color(mut self) -> Self {
        self.table.force_no_tty();
        self
    }

    pub fn set_header(&mut self, headers: &[&str]) -> &mut Self {
        self.table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).set_alignment(CellAlignment::Left)),
        );
        self
    }

    pub fn add_row<T: Into<Cell>>(&mut self, row: Vec<T>) -> &mut Self {
        self.table.add_row(row);
        self.rows += 1;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        let rendered = self.table.to_string();
        for line in rendered.lines() {
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

/// `  Name:               value`
pub fn print_pair(out: &mut dyn Write, name: &str, value: &str) -> io::Result<()> {
    writeln!(out, "  {:<20}{}", format!("{}:", name), value)
}

/// Like [`print_pair`] but skips empty values.
pub fn print_pair_if_set(out: &mut dyn Write, name: &str, value: &str) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    print_pair(out, name, value)
}

/// `Name: a\tCluster: b\tNamespace: c`
pub fn print_line_with_tabs(out: &mut dyn Write, pairs: &[(&str, &str)]) -> io::Result<()> {
    let line = pairs
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(out, "{}", line)
}

fn event_time(event: &Event) -> String {
    if let Some(t) = event.last_timestamp.as_ref() {
        return time_format(Some(t));
    }
    event
        .event_time
        .as_ref()
        .map(|t| super::format::time_format_in(&t.0, &chrono::Local))
        .unwrap_or_default()
}

fn event_sort_key(event: &Event) -> Option<chrono::DateTime<chrono::Utc>> {
    event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
}

/// Print Warning events newest last, or `<none>`.
pub fn print_warning_events(out: &mut dyn Write, events: &[Event]) -> io::Result<()> {
    let mut warnings: Vec<&Event> = events
        .iter()
        .filter(|e| e.type_.as_deref() == Some("Warning"))
        .collect();
    let title = "\nWarning Events: ";
    if warnings.is_empty() {
        return writeln!(out, "{}<none>", title);
    }
    warnings.sort_by_key(|e| event_sort_key(e));

    writeln!(out, "{}", title)?;
    let mut tbl = TablePrinter::new();
    tbl.set_header(&["TIME", "TYPE", "REASON", "OBJECT", "MESSAGE"]);
    for e in warnings {
        let object = format!(
            "{}/{}",
            e.involved_object.kind.as_deref().unwrap_or_default(),
            e.involved_object.name.as_deref().unwrap_or_default()
        );
        tbl.add_row(vec![
            event_time(e),
            e.type_.clone().unwrap_or_default(),
            e.reason.clone().unwrap_or_default(),
            object,
            e.message.clone().unwrap_or_default(),
        ]);
    }
    tbl.print(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ObjectReference;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_table_rows() {
        let out = render(|w| {
            let mut tbl = TablePrinter::new();
            tbl.set_header(&["NAME", "STATUS"]);
            tbl.add_row(vec!["b1", "Completed"]);
            assert!(!tbl.is_empty());
            tbl.print(w)
        });
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("NAME") && lines[0].contains("STATUS"));
        assert!(lines[1].contains("b1") && lines[1].contains("Completed"));
    }

    #[test]
    fn test_pairs() {
        let out = render(|w| {
            print_pair_if_set(w, "Phase", "Completed")?;
            print_pair_if_set(w, "Path", "")
        });
        assert_eq!(out, format!("  {:<20}Completed\n", "Phase:"));
    }

    #[test]
    fn test_tab_line() {
        let out = render(|w| print_line_with_tabs(w, &[("Name", "b1"), ("Cluster", "c1")]));
        assert_eq!(out, "Name: b1\tCluster: c1\n");
    }

    #[test]
    fn test_warning_events() {
        let none = render(|w| print_warning_events(w, &[]));
        assert_eq!(none, "\nWarning Events: <none>\n");

        let event = Event {
            type_: Some("Warning".to_string()),
            reason: Some("BackupFailed".to_string()),
            message: Some("disk full".to_string()),
            involved_object: ObjectReference {
                kind: Some("Backup".to_string()),
                name: Some("b1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let normal = Event {
            type_: Some("Normal".to_string()),
            reason: Some("Created".to_string()),
            ..Default::default()
        };
        let out = render(|w| print_warning_events(w, &[event, normal]));
        assert!(out.contains("Backup/b1"));
        assert!(out.contains("disk full"));
        assert!(!out.contains("Created"));
    }
}
