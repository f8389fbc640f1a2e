use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The lifecycle state a [`Message`] applies to.
///
/// Success and failure are not states: they are the outcome of [`Interaction::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Before the interaction starts, e.g. "plug in your device"
    Pending,
    /// While the device is being talked to
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// An illustrated guidance entry, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Key of the image asset shown next to the text
    pub image: String,
    pub text: String,
}

impl Step {
    pub fn new(image: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            text: text.into(),
        }
    }
}

/// A human readable message describing one aspect of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub state: State,
    pub level: Level,
    pub text: String,

    /// Stable machine readable identifier, e.g. `device.connect`
    pub code: String,

    /// Firmware version constraint this message applies to, e.g. `<1.6.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

impl Message {
    pub fn new(state: State, level: Level, code: &str, text: impl Into<String>) -> Self {
        Self {
            state,
            level,
            text: text.into(),
            code: code.to_string(),
            version: None,
            steps: vec![],
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// Whether `version` satisfies the version constraint of this message.
    ///
    /// Messages without a constraint apply to every version, and so do messages with a
    /// constraint that cannot be parsed.
    pub fn applies_to(&self, version: &FirmwareVersion) -> bool {
        match &self.version {
            Some(constraint) => version.satisfies(constraint).unwrap_or(true),
            None => true,
        }
    }
}

/// A `major.minor.patch` firmware version, missing components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FirmwareVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Evaluate a constraint like `<1.6.0` or `>=1.6.0`, `None` if it cannot be parsed.
    pub fn satisfies(&self, constraint: &str) -> Option<bool> {
        let constraint = constraint.trim();
        let (op, rest) = ["<=", ">=", "<", ">", "="]
            .iter()
            .find_map(|op| constraint.strip_prefix(op).map(|rest| (*op, rest)))
            .unwrap_or(("=", constraint));
        let bound: FirmwareVersion = rest.trim().parse().ok()?;
        Some(match op {
            "<=" => *self <= bound,
            ">=" => *self >= bound,
            "<" => *self < bound,
            ">" => *self > bound,
            _ => *self == bound,
        })
    }
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || Error::InvalidFirmwareVersion(s.to_string());
        let mut parts = [0u32; 3];
        for (i, part) in s.split('.').enumerate() {
            let slot = parts.get_mut(i).ok_or_else(err)?;
            *slot = part.parse().map_err(|_| err())?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Criteria to select some of the messages of an interaction.
///
/// Every criterion left unset matches any message.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    state: Option<State>,
    level: Option<Level>,
    code: Option<String>,
    text: Option<String>,
    version: Option<FirmwareVersion>,
    exclude_codes: Vec<String>,
}

impl MessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Match messages whose code contains `code`
    pub fn code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    /// Match messages whose text contains `text`, ignoring case
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_lowercase());
        self
    }

    pub fn version(mut self, version: FirmwareVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Skip messages whose code contains `code`
    pub fn exclude_code(mut self, code: &str) -> Self {
        self.exclude_codes.push(code.to_string());
        self
    }

    pub fn matches(&self, message: &Message) -> bool {
        if self.state.is_some_and(|s| s != message.state) {
            return false;
        }
        if self.level.is_some_and(|l| l != message.level) {
            return false;
        }
        if let Some(code) = &self.code {
            if !message.code.contains(code.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            if !message.text.to_lowercase().contains(text.as_str()) {
                return false;
            }
        }
        if let Some(version) = &self.version {
            if !message.applies_to(version) {
                return false;
            }
        }
        !self
            .exclude_codes
            .iter()
            .any(|code| message.code.contains(code.as_str()))
    }
}

/// A unit of work performed with a keystore.
///
/// Implementors build their message set by extending the set of the more general interaction
/// they specialize, starting from [`keystore_messages()`].
pub trait Interaction {
    type Output;
    type Error;

    /// All the messages of this interaction, in order. Pure and deterministic.
    fn messages(&self) -> Vec<Message>;

    /// Perform the interaction. This is the only method with side effects.
    fn run(&self) -> Result<Self::Output, Self::Error>;

    fn messages_for(&self, filter: &MessageFilter) -> Vec<Message> {
        self.messages()
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect()
    }

    fn has_messages_for(&self, filter: &MessageFilter) -> bool {
        self.messages().iter().any(|m| filter.matches(m))
    }

    fn message_for(&self, filter: &MessageFilter) -> Option<Message> {
        self.messages().into_iter().find(|m| filter.matches(m))
    }

    fn message_text_for(&self, filter: &MessageFilter) -> Option<String> {
        self.message_for(filter).map(|m| m.text)
    }
}

/// The messages shared by every keystore interaction.
pub fn keystore_messages() -> Vec<Message> {
    vec![]
}
