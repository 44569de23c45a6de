//! UI capability set
//!
//! The controller never talks to a UI toolkit directly. It reads and writes
//! typed field values and toggles controls through [`PageView`]; user edits
//! arrive as a stream of [`FieldChange`] events.

use funnel_record::Field;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Page controls the controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Control {
    /// Forward navigation button
    Next,
    /// Backward navigation button
    Back,
    /// Skip-to-payment button
    Skip,
    /// User-visible error banner
    ErrorMessage,
}

impl Display for Control {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Next => "next",
            Self::Back => "back",
            Self::Skip => "skip",
            Self::ErrorMessage => "error-message",
        };
        f.write_str(name)
    }
}

/// A user edit to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Field name
    pub field: String,
    /// Raw value as entered
    pub value: Field,
}

impl FieldChange {
    /// Create change event
    #[inline]
    pub fn new(field: impl Into<String>, value: impl Into<Field>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Page rendering capability
pub trait PageView: Send + Sync {
    /// Current value of a field, `None` if the page has no such input
    fn value(&self, field: &str) -> Option<Field>;

    /// Replace the value of a field
    fn set_value(&self, field: &str, value: Field);

    /// Enable a control
    fn enable(&self, control: Control);

    /// Disable a control
    fn disable(&self, control: Control);

    /// Show a control
    fn show(&self, control: Control);

    /// Hide a control
    fn hide(&self, control: Control);

    /// Set the text of a control
    fn set_text(&self, control: Control, text: &str);

    /// Enable or disable depending on `enabled`
    fn set_enabled(&self, control: Control, enabled: bool) {
        if enabled {
            self.enable(control);
        } else {
            self.disable(control);
        }
    }

    /// Show a user-visible error
    fn show_error(&self, message: &str) {
        self.set_text(Control::ErrorMessage, message);
        self.show(Control::ErrorMessage);
    }

    /// Hide the error banner
    fn hide_error(&self) {
        self.hide(Control::ErrorMessage);
    }
}
