//! Form schema types.
//!
//! A schema is the ordered list of steps the orchestrator walks through once
//! the create-issue modal is open. The built-in schema targets the stock
//! tracker form; a TOML file with the same shape can replace it.

use crate::error::{FormError, Result};
use bugfill_browser::Locator;
use bugfill_core::{FieldKey, TimingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Complete form-fill protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Human-readable schema name, used in logs and errors
    pub name: String,

    /// Trigger that opens the create-issue modal
    pub create_button: Locator,

    /// Trigger tried when the primary one is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_button_fallback: Option<Locator>,

    /// Protocol steps, in execution order
    pub steps: Vec<FormStep>,
}

/// One step of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum FormStep {
    /// Fill a field from the issue record
    Fill(FieldDescriptor),

    /// Click a fixed control; failures are logged and skipped
    Click {
        /// Step name for logs
        name: String,
        /// Control to click
        locator: Locator,
    },
}

/// Static configuration of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Record key the value comes from
    pub key: FieldKey,

    /// Where the field lives
    pub locator: Locator,

    /// How option text is compared against the value
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Whether the value holds one token or several
    #[serde(default)]
    pub multiplicity: Multiplicity,

    /// Widget kind; absent means the full strategy cascade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetKind>,

    /// Skip the step entirely when the value is empty
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conditional: bool,

    /// Pause before the field is touched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_before: Option<Pause>,

    /// Pause after the field is done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_after: Option<Pause>,
}

impl FieldDescriptor {
    /// Substring-matched, single-valued field with no widget hint.
    #[must_use]
    pub fn new(key: FieldKey, locator: Locator) -> Self {
        Self {
            key,
            locator,
            match_mode: MatchMode::default(),
            multiplicity: Multiplicity::default(),
            widget: None,
            conditional: false,
            settle_before: None,
            settle_after: None,
        }
    }

    #[must_use]
    pub fn exact(mut self) -> Self {
        self.match_mode = MatchMode::Exact;
        self
    }

    #[must_use]
    pub fn split(mut self) -> Self {
        self.multiplicity = Multiplicity::Split;
        self
    }

    #[must_use]
    pub fn widget(mut self, widget: WidgetKind) -> Self {
        self.widget = Some(widget);
        self
    }

    #[must_use]
    pub fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }

    #[must_use]
    pub fn settle_before(mut self, pause: Pause) -> Self {
        self.settle_before = Some(pause);
        self
    }

    #[must_use]
    pub fn settle_after(mut self, pause: Pause) -> Self {
        self.settle_after = Some(pause);
        self
    }

    /// Whether values go through the option-picking cascade.
    #[must_use]
    pub fn uses_cascade(&self) -> bool {
        matches!(self.widget, None | Some(WidgetKind::Combo))
    }
}

/// Option text comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Option text equals the value
    Exact,
    /// Option text contains the value
    #[default]
    Substring,
}

/// Value cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Multiplicity {
    /// The whole value is one selection
    #[default]
    Single,
    /// Whitespace-separated tokens, each its own selection
    Split,
}

/// Known widget behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    /// Plain input; raw keystrokes, nothing committed
    Text,
    /// Editor with a template body; cleared before typing
    RichText,
    /// Search-as-you-type picker committed with Enter
    Autocomplete,
    /// Button-triggered combo; skips straight to the dropdown stage
    Combo,
}

/// Named settle pause, resolved against the timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pause {
    Short,
    Medium,
}

impl Pause {
    #[must_use]
    pub fn duration(self, timing: &TimingConfig) -> Duration {
        match self {
            Self::Short => Duration::from_millis(timing.short_wait_ms),
            Self::Medium => Duration::from_millis(timing.medium_wait_ms),
        }
    }
}

impl FormSchema {
    /// Descriptor for a record key, if the schema fills it.
    #[must_use]
    pub fn descriptor(&self, key: FieldKey) -> Option<&FieldDescriptor> {
        self.fields().find(|d| d.key == key)
    }

    /// Fill steps in protocol order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().filter_map(|step| match step {
            FormStep::Fill(descriptor) => Some(descriptor),
            FormStep::Click { .. } => None,
        })
    }

    /// Validate the schema for completeness and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("schema name cannot be empty"));
        }

        if self.create_button.expression().trim().is_empty() {
            return Err(self.invalid("create_button locator cannot be empty"));
        }

        if let Some(fallback) = &self.create_button_fallback {
            if fallback.expression().trim().is_empty() {
                return Err(self.invalid("create_button_fallback locator cannot be empty"));
            }
        }

        if self.steps.is_empty() {
            return Err(self.invalid("schema must have at least one step"));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            match step {
                FormStep::Click { name, locator } => {
                    if name.trim().is_empty() {
                        return Err(self.invalid("click step name cannot be empty"));
                    }
                    if locator.expression().trim().is_empty() {
                        return Err(self.invalid(format!("click step {name} has an empty locator")));
                    }
                }
                FormStep::Fill(descriptor) => {
                    let key = descriptor.key;
                    if !seen.insert(key) {
                        return Err(self.invalid(format!("field {key} is filled more than once")));
                    }
                    if descriptor.locator.expression().trim().is_empty() {
                        return Err(self.invalid(format!("field {key} has an empty locator")));
                    }
                    if descriptor.multiplicity == Multiplicity::Split && !descriptor.uses_cascade() {
                        return Err(self.invalid(format!(
                            "field {key} is split but its widget does not pick options"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> FormError {
        FormError::ValidationError {
            schema: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Protocol for the stock tracker create-issue form.
    #[must_use]
    pub fn builtin() -> Self {
        use FieldKey as K;

        let field = |key, xpath: &str| FieldDescriptor::new(key, Locator::xpath(xpath));

        let steps = vec![
            FormStep::Fill(
                field(
                    K::Team,
                    r#"//*[@id="customfield_10937-container"]/div/div/div/div/div/div[1]/div[2]"#,
                )
                .exact()
                .settle_after(Pause::Medium),
            ),
            FormStep::Fill(
                field(K::Summary, r#"//*[@id="summary-field"]"#).widget(WidgetKind::Text),
            ),
            FormStep::Click {
                name: "assign-to-me".to_string(),
                locator: Locator::xpath(r#"//*[@id="assignee-container"]/div/div/div/div/button"#),
            },
            FormStep::Fill(
                field(K::Reviewer, r#"//*[@id="customfield_10629-field"]"#)
                    .widget(WidgetKind::Autocomplete),
            ),
            FormStep::Fill(
                field(
                    K::LinkedIssues,
                    r#"//*[@id="issuelinks-container"]/div/div/div/div[1]/div/div/div[1]/div[2]"#,
                )
                .exact()
                .split()
                .conditional(),
            ),
            FormStep::Fill(
                field(
                    K::TargetIssue,
                    r#"//*[@id="issuelinks-container"]/div/div/div/div[2]/div/div/div/div[1]/div[2]"#,
                )
                .conditional()
                .settle_before(Pause::Short),
            ),
            FormStep::Fill(
                field(
                    K::Parent,
                    r#"//*[@id="parent-container"]/div/div/div/div[1]/div/div[1]/div[2]"#,
                )
                .exact()
                .conditional()
                .settle_before(Pause::Short),
            ),
            FormStep::Fill(field(K::Branch, r#"//*[@id="customfield_10623-field"]"#).split()),
            FormStep::Fill(field(K::Build, r#"//*[@id="customfield_10627-field"]"#).split()),
            FormStep::Fill(field(K::FixVersion, r#"//*[@id="fixVersions-field"]"#).split()),
            FormStep::Fill(field(K::Component, r#"//*[@id="components-field"]"#).split()),
            FormStep::Fill(field(K::Label, r#"//*[@id="labels-field"]"#).split()),
            FormStep::Fill(field(K::Priority, r#"//*[@id="priority-field"]"#)),
            FormStep::Fill(field(K::Severity, r#"//*[@id="customfield_10626-field"]"#)),
            FormStep::Fill(field(K::Prevalence, r#"//*[@id="customfield_10628-field"]"#)),
            FormStep::Fill(field(K::ReproRate, r#"//*[@id="customfield_10634-field"]"#)),
            FormStep::Fill(
                field(K::Steps, r#"//*[@id="customfield_10399-field"]"#).widget(WidgetKind::Text),
            ),
            FormStep::Fill(
                field(K::Description, r#"//*[@id="ak-editor-textarea"]"#)
                    .widget(WidgetKind::RichText),
            ),
        ];

        Self {
            name: "builtin".to_string(),
            create_button: Locator::xpath(
                r#"//*[@id="_r1_"]/span/div[2]/span/div/div/div[1]/button"#,
            ),
            create_button_fallback: Some(Locator::xpath(
                "/html/body/div[4]/div[2]/header/span/div[2]/span/div/button",
            )),
            steps,
        }
    }
}
