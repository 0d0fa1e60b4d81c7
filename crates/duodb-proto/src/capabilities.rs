//! Capability negotiation payloads.
//!
//! Capabilities are exchanged before a session opens: the client asks for the
//! server's set, the server answers, and the client may request changes. The
//! mapping keeps insertion order so the encoded bytes of a given set are
//! reproducible; the protocol itself attaches no meaning to the order.

/// A capability value: a flag, a string, or a nested capability mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityValue {
    /// A boolean flag, e.g. whether TLS is required.
    Bool(bool),
    /// A free-form string, e.g. an authentication mechanism name.
    String(String),
    /// A nested mapping, e.g. a feature with its own sub-options.
    Object(Capabilities),
}

impl CapabilityValue {
    /// Returns the flag if this is a `Bool` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the string if this is a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the nested mapping if this is an `Object` value.
    #[must_use]
    pub fn as_object(&self) -> Option<&Capabilities> {
        match self {
            Self::Object(nested) => Some(nested),
            _ => None,
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<&str> for CapabilityValue {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<String> for CapabilityValue {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<Capabilities> for CapabilityValue {
    fn from(nested: Capabilities) -> Self {
        Self::Object(nested)
    }
}

/// An insertion-ordered mapping of capability name to value.
///
/// Setting an existing name replaces its value in place, so a name keeps the
/// position it was first inserted at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    entries: Vec<(String, CapabilityValue)>,
}

impl Capabilities {
    /// An empty capability set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, keeping the name's original position if it is
    /// already present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<CapabilityValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// [`set`](Self::set) in builder form.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CapabilityValue>) -> Self {
        self.set(name, value);
        self
    }

    /// The value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Number of capabilities in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the capabilities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, CapabilityValue)> for Capabilities {
    fn from_iter<I: IntoIterator<Item = (String, CapabilityValue)>>(iter: I) -> Self {
        let mut capabilities = Self::new();
        for (name, value) in iter {
            capabilities.set(name, value);
        }
        capabilities
    }
}
