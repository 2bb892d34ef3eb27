//! Section records and their byte-exact text form.
//!
//! A section is an ordered list of `Name: value` attributes. Every line ends
//! with CRLF and every section, including the last one, is terminated by an
//! empty CRLF line. [`Section::write_to`] is the only place that text is
//! produced; [`split_sections`] is its inverse at the byte-range level.

use crate::{Error, Result};
use std::ops::Range;

/// Line terminator used throughout manifest and signature-file text.
pub const CRLF: &[u8] = b"\r\n";

/// One stanza of a manifest or signature file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    attributes: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, keeping insertion order.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Iterate attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// First value of the named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the `Name` attribute, present on every entry section.
    pub fn name(&self) -> Option<&str> {
        self.get("Name")
    }

    /// Serialize this section, including its terminating blank line.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for (name, value) in &self.attributes {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(CRLF);
    }

    /// Serialized bytes of this section alone.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Parse one section as returned by [`split_sections`].
    ///
    /// Lines starting with a single space continue the previous value.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Manifest(format!("Section is not valid UTF-8: {}", e)))?;
        let body = text
            .strip_suffix("\r\n\r\n")
            .ok_or_else(|| Error::Manifest("Section is not terminated by a blank line".into()))?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        for line in body.split("\r\n") {
            if let Some(continuation) = line.strip_prefix(' ') {
                let (_, value) = attributes.last_mut().ok_or_else(|| {
                    Error::Manifest("Continuation line without a preceding attribute".into())
                })?;
                value.push_str(continuation);
                continue;
            }

            let (name, value) = line
                .split_once(": ")
                .ok_or_else(|| Error::Manifest(format!("Malformed attribute line: {:?}", line)))?;
            attributes.push((name.to_string(), value.to_string()));
        }

        Ok(Self { attributes })
    }
}

/// Split serialized manifest or signature-file text into section byte ranges.
///
/// Each returned range starts at the first byte of a section and ends just
/// past the CRLF of its terminating blank line, so concatenating all ranges
/// reproduces the input exactly. The first range is the main (header)
/// section.
///
/// # Errors
///
/// Returns [`Error::Manifest`] for a bare CR or LF, a final line without a
/// terminator, trailing text with no blank line after it, or an empty
/// section (two consecutive blank lines).
pub fn split_sections(data: &[u8]) -> Result<Vec<Range<usize>>> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < data.len() {
        let line_end = find_line_end(data, pos)?;
        if line_end == pos {
            if pos == start {
                return Err(Error::Manifest(format!(
                    "Empty section at offset {}",
                    pos
                )));
            }
            sections.push(start..pos + CRLF.len());
            start = pos + CRLF.len();
        }
        pos = line_end + CRLF.len();
    }

    if start != data.len() {
        return Err(Error::Manifest(format!(
            "Section starting at offset {} is not terminated by a blank line",
            start
        )));
    }

    Ok(sections)
}

/// Offset of the CRLF ending the line that starts at `from`.
fn find_line_end(data: &[u8], from: usize) -> Result<usize> {
    let relative = data[from..]
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .ok_or_else(|| Error::Manifest(format!("Unterminated line at offset {}", from)))?;
    let idx = from + relative;

    if data[idx] == b'\r' && data.get(idx + 1) == Some(&b'\n') {
        Ok(idx)
    } else {
        Err(Error::Manifest(format!("Bare line break at offset {}", idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_section_uses_crlf() {
        let section = Section::new()
            .attribute("Name", "hello.txt")
            .attribute("SHA1-Digest", "abc=");
        assert_eq!(
            section.to_bytes(),
            b"Name: hello.txt\r\nSHA1-Digest: abc=\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn test_empty_section_is_single_blank_line() {
        assert_eq!(Section::new().to_bytes(), b"\r\n".to_vec());
    }

    #[test]
    fn test_section_get_and_name() {
        let section = Section::new()
            .attribute("Name", "a/b.bin")
            .attribute("SHA1-Digest", "xyz=");
        assert_eq!(section.name(), Some("a/b.bin"));
        assert_eq!(section.get("SHA1-Digest"), Some("xyz="));
        assert_eq!(section.get("Missing"), None);
    }

    #[test]
    fn test_split_sections_boundaries() {
        let data = b"Manifest-Version: 1.0\r\n\r\n\
Name: a\r\nSHA1-Digest: x\r\n\r\n\
Name: b\r\nSHA1-Digest: y\r\n\r\n";
        let ranges = split_sections(data).unwrap();

        assert_eq!(ranges.len(), 3);
        assert_eq!(&data[ranges[0].clone()], b"Manifest-Version: 1.0\r\n\r\n");
        assert_eq!(&data[ranges[1].clone()], b"Name: a\r\nSHA1-Digest: x\r\n\r\n");
        assert_eq!(&data[ranges[2].clone()], b"Name: b\r\nSHA1-Digest: y\r\n\r\n");
        assert_eq!(ranges.last().unwrap().end, data.len());
    }

    #[test]
    fn test_split_sections_empty_input() {
        assert!(split_sections(b"").unwrap().is_empty());
    }

    #[test]
    fn test_split_sections_rejects_bare_lf() {
        assert!(split_sections(b"Name: a\nSHA1-Digest: x\r\n\r\n").is_err());
    }

    #[test]
    fn test_split_sections_rejects_missing_blank_line() {
        assert!(split_sections(b"Name: a\r\nSHA1-Digest: x\r\n").is_err());
        assert!(split_sections(b"Name: a").is_err());
    }

    #[test]
    fn test_split_sections_rejects_empty_section() {
        assert!(split_sections(b"Name: a\r\n\r\n\r\n").is_err());
    }

    #[test]
    fn test_parse_round_trips_written_section() {
        let section = Section::new()
            .attribute("Name", "dir/file name.txt")
            .attribute("SHA-256-Digest", "Zm9v");
        let parsed = Section::parse(&section.to_bytes()).unwrap();
        assert_eq!(parsed, section);
    }

    #[test]
    fn test_parse_continuation_line() {
        let parsed = Section::parse(b"Name: very/long/\r\n path.txt\r\n\r\n").unwrap();
        assert_eq!(parsed.name(), Some("very/long/path.txt"));
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        assert!(Section::parse(b"no separator here\r\n\r\n").is_err());
        assert!(Section::parse(b" orphan continuation\r\n\r\n").is_err());
    }
}
