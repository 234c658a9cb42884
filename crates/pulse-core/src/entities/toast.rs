//! Toast entity - a transient, auto-expiring user notification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::value_objects::ToastId;

/// Visual variant of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    /// Errors and failed operations
    Destructive,
}

impl ToastVariant {
    /// Check if this variant signals a failure
    #[inline]
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Destructive)
    }
}

/// Optional action button rendered inside a toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastAction {
    pub label: String,
    /// Screen-reader description of what the action does
    pub alt_text: String,
}

impl ToastAction {
    pub fn new(label: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            alt_text: alt_text.into(),
        }
    }
}

/// Toast entity
///
/// Owned exclusively by the queue. Producers only keep the [`ToastId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub action: Option<ToastAction>,
    /// True while visible, false once dismissed and waiting for removal
    pub open: bool,
    /// Auto-dismiss after this long, if set
    #[serde(skip)]
    pub duration: Option<Duration>,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    /// Create an open toast from producer input
    pub fn new(id: ToastId, input: ToastInput) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            variant: input.variant,
            action: input.action,
            open: true,
            duration: input.duration,
            created_at: Utc::now(),
        }
    }

    /// Merge the fields present in `update`
    pub fn apply(&mut self, update: ToastUpdate) {
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(variant) = update.variant {
            self.variant = variant;
        }
        if let Some(action) = update.action {
            self.action = Some(action);
        }
    }

    /// Check if the toast has been dismissed
    #[inline]
    pub fn is_dismissed(&self) -> bool {
        !self.open
    }
}

/// Producer input for a new toast. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToastInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub action: Option<ToastAction>,
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl ToastInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ToastVariant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn destructive(self) -> Self {
        self.variant(ToastVariant::Destructive)
    }

    #[must_use]
    pub fn action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Partial update merged into an existing toast
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToastUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub variant: Option<ToastVariant>,
    pub action: Option<ToastAction>,
}

impl ToastUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ToastVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }
}
