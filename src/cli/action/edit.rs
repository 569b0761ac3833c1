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

//! Interactive `key=value` field editing over a typed object
//!
//! A command describes its editable fields with an [`EditableField`] enum.
//! [`FieldEditor`] renders the current values, applies the edited rows in
//! input order and reports whether anything changed.

use crate::infrastructure::kubernetes::client::KbClient;
use crate::shared::error::{KbError, Result};
use std::marker::PhantomData;

pub const EDIT_HEADER: &str = "# Please edit the object below. Lines beginning with a '#' will be ignored,\n\
# and an empty file will abort the edit. If an error occurs while saving this file will be\n\
# reopened with the relevant failures.\n\
#\n";

#[async_trait::async_trait]
pub trait EditableField: Copy + Send + Sync + 'static {
    type Target: Send;

    /// Every field, in display order.
    fn all() -> &'static [Self];

    fn key(&self) -> &'static str;

    /// Current value, or `None` to leave the row out.
    fn get(&self, target: &Self::Target) -> Option<String>;

    /// Apply `value` to `target`. May consult the cluster to check the value.
    async fn set(&self, target: &mut Self::Target, value: &str, client: &dyn KbClient)
        -> Result<()>;

    fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Loading,
    Rendered,
    Validating,
    Updating,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    Changed,
}

pub struct FieldEditor<F: EditableField> {
    state: EditState,
    original: String,
    target: String,
    _fields: PhantomData<F>,
}

impl<F: EditableField> Default for FieldEditor<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: EditableField> FieldEditor<F> {
    pub fn new() -> Self {
        Self {
            state: EditState::Loading,
            original: String::new(),
            target: String::new(),
            _fields: PhantomData,
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// Current rows, one `key=value` per line.
    pub fn render(&mut self, target: &F::Target) -> String {
        let rows: Vec<String> = F::all()
            .iter()
            .filter_map(|f| f.get(target).map(|v| format!("{}={}", f.key(), v)))
            .collect();
        self.original = rows.concat();
        self.state = EditState::Rendered;
        rows.join("\n")
    }

    /// Parse and apply `rows` in order. Comment and blank rows are skipped.
    ///
    /// The first malformed row, unknown key or failed update stops
    /// processing; rows already applied stay applied to `target`.
    pub async fn apply(
        &mut self,
        target: &mut F::Target,
        rows: &[String],
        client: &dyn KbClient,
    ) -> Result<EditOutcome> {
        self.state = EditState::Validating;
        match self.apply_rows(target, rows, client).await {
            Ok(()) if self.original == self.target => {
                self.state = EditState::Done;
                Ok(EditOutcome::Unchanged)
            }
            Ok(()) => {
                self.state = EditState::Updating;
                Ok(EditOutcome::Changed)
            }
            Err(e) => {
                self.state = EditState::Failed;
                Err(e)
            }
        }
    }

    async fn apply_rows(
        &mut self,
        target: &mut F::Target,
        rows: &[String],
        client: &dyn KbClient,
    ) -> Result<()> {
        for raw in rows {
            let row = raw.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            self.target.push_str(row);
            let parts: Vec<&str> = row.split('=').collect();
            if parts.len() != 2 {
                return Err(KbError::validation(format!(
                    "invalid row: {}, format should be \"key=value\"",
                    raw
                )));
            }
            let field = F::from_key(parts[0])
                .ok_or_else(|| KbError::validation(format!("invalid key: {}", parts[0])))?;
            let value = parts[1].trim_matches('"').trim_matches('\'');
            field.set(target, value, client).await?;
        }
        Ok(())
    }

    /// Record the result of the update issued after [`EditOutcome::Changed`].
    pub fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        self.state = if result.is_ok() {
            EditState::Done
        } else {
            EditState::Failed
        };
        result
    }
}

/// Split `--set` values on commas into rows.
pub fn split_set_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;

    #[derive(Debug, Default)]
    struct Settings {
        color: Option<String>,
        size: Option<i32>,
    }

    #[derive(Debug, Clone, Copy)]
    enum SettingsField {
        Color,
        Size,
    }

    #[async_trait::async_trait]
    impl EditableField for SettingsField {
        type Target = Settings;

        fn all() -> &'static [Self] {
            &[SettingsField::Color, SettingsField::Size]
        }

        fn key(&self) -> &'static str {
            match self {
                SettingsField::Color => "color",
                SettingsField::Size => "size",
            }
        }

        fn get(&self, target: &Settings) -> Option<String> {
            match self {
                SettingsField::Color => target.color.clone(),
                SettingsField::Size => target.size.map(|s| s.to_string()),
            }
        }

        async fn set(&self, target: &mut Settings, value: &str, _c: &dyn KbClient) -> Result<()> {
            match self {
                SettingsField::Color => target.color = Some(value.to_string()),
                SettingsField::Size => {
                    target.size = Some(
                        value
                            .parse()
                            .map_err(|_| KbError::validation("size must be a number"))?,
                    )
                }
            }
            Ok(())
        }
    }

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unchanged() {
        let client = FakeClient::new();
        let mut target = Settings {
            color: Some("red".to_string()),
            size: None,
        };
        let mut editor = FieldEditor::<SettingsField>::new();
        assert_eq!(editor.render(&target), "color=red");
        assert_eq!(editor.state(), EditState::Rendered);

        let outcome = editor
            .apply(&mut target, &rows(&["# comment", "color=red", ""]), &client)
            .await
            .unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(editor.state(), EditState::Done);
    }

    #[tokio::test]
    async fn test_quoted_row_counts_as_change() {
        let client = FakeClient::new();
        let mut target = Settings {
            color: Some("red".to_string()),
            size: None,
        };
        let mut editor = FieldEditor::<SettingsField>::new();
        editor.render(&target);

        let outcome = editor
            .apply(&mut target, &rows(&["color=\"red\""]), &client)
            .await
            .unwrap();
        assert_eq!(outcome, EditOutcome::Changed);
        assert_eq!(editor.state(), EditState::Updating);
        assert_eq!(target.color.as_deref(), Some("red"));
    }

    #[tokio::test]
    async fn test_changed() {
        let client = FakeClient::new();
        let mut target = Settings::default();
        let mut editor = FieldEditor::<SettingsField>::new();
        assert_eq!(editor.render(&target), "");

        let outcome = editor
            .apply(&mut target, &rows(&["size=3", "color='blue'"]), &client)
            .await
            .unwrap();
        assert_eq!(outcome, EditOutcome::Changed);
        assert_eq!(editor.state(), EditState::Updating);
        assert_eq!(target.size, Some(3));
        assert_eq!(target.color.as_deref(), Some("blue"));
        editor.finish(Ok(())).unwrap();
        assert_eq!(editor.state(), EditState::Done);
    }

    #[tokio::test]
    async fn test_unknown_key_fails_fast() {
        let client = FakeClient::new();
        let mut target = Settings::default();
        let mut editor = FieldEditor::<SettingsField>::new();
        editor.render(&target);

        let err = editor
            .apply(&mut target, &rows(&["color=green", "shape=round", "size=9"]), &client)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid key: shape");
        assert_eq!(editor.state(), EditState::Failed);
        assert_eq!(target.color.as_deref(), Some("green"));
        assert_eq!(target.size, None);
    }

    #[tokio::test]
    async fn test_invalid_row() {
        let client = FakeClient::new();
        let mut target = Settings::default();
        let mut editor = FieldEditor::<SettingsField>::new();
        let err = editor
            .apply(&mut target, &rows(&["color"]), &client)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid row: color, format should be \"key=value\"");
    }

    #[test]
    fn test_split_set_values() {
        let values = vec!["a=1,b=2".to_string(), "c=3".to_string()];
        assert_eq!(split_set_values(&values), vec!["a=1", "b=2", "c=3"]);
    }
}
