//! Ordered, lossless header blocks.
//!
//! # Responsibilities
//! - Keep header lines in wire order
//! - Keep each value exactly as received (leading space, obs-fold lines)
//! - Expose names mutably so the case codec can rewrite their casing
//!
//! # Design Decisions
//! - No normalization: an untouched block serializes to the received bytes
//! - Lookups are case-insensitive on the name and trim the value

use crate::error::ProtocolError;

/// One `name:value` line. `value` is everything after the colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The value without surrounding whitespace.
    pub fn trimmed_value(&self) -> &str {
        self.value.trim()
    }
}

/// The header section of one HTTP message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    fields: Vec<HeaderField>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse header lines (already split on CRLF, without the start line).
    ///
    /// Lines starting with a space or tab continue the previous value.
    pub fn parse<'a, I>(lines: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields: Vec<HeaderField> = Vec::new();

        for line in lines {
            if line.starts_with([' ', '\t']) {
                if let Some(last) = fields.last_mut() {
                    last.value.push_str("\r\n");
                    last.value.push_str(line);
                    continue;
                }
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ProtocolError::MalformedHeader(line.to_string()))?;
            fields.push(HeaderField::new(name, value));
        }

        Ok(Self { fields })
    }

    pub fn push(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// First value whose name matches case-insensitively, trimmed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(HeaderField::trimmed_value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, HeaderField> {
        self.fields.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append `name:value\r\n` for every field.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for field in &self.fields {
            out.extend_from_slice(field.name.as_bytes());
            out.push(b':');
            out.extend_from_slice(field.value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }
}

impl<'a> IntoIterator for &'a HeaderBlock {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<HeaderField> for HeaderBlock {
    fn from_iter<I: IntoIterator<Item = HeaderField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
