//! JAR manifest serialization
//!
//! Lines are `Key: Value`, terminated by CRLF, at most 72 bytes long.
//! Longer lines continue on the next line after a single space. The
//! manifest ends with an empty line.

use std::collections::BTreeMap;

/// Archive path of the manifest entry
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const MAX_LINE_BYTES: usize = 72;

/// Ordered main-section attributes of a JAR manifest
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Manifest shared by every archive of one release
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::build::Manifest;
    /// use std::collections::BTreeMap;
    ///
    /// let manifest = Manifest::for_release("Gradle", "1.3.0", &BTreeMap::new());
    /// assert_eq!(manifest.get("Implementation-Version"), Some("1.3.0"));
    /// ```
    pub fn for_release(title: &str, version: &str, extra: &BTreeMap<String, String>) -> Self {
        let mut manifest = Self::default();
        manifest.insert("Manifest-Version", "1.0");
        manifest.insert("Implementation-Title", title);
        manifest.insert("Implementation-Version", version);
        for (key, value) in extra {
            manifest.insert(key, value);
        }
        manifest
    }

    /// Set an attribute, replacing an existing value in place
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for (key, value) in &self.attributes {
            write_wrapped(&mut out, &format!("{}: {}", key, value));
        }
        out.push_str("\r\n");
        out.into_bytes()
    }

    /// Parse the main section of a manifest
    pub fn parse(content: &str) -> Self {
        let mut logical: Vec<String> = Vec::new();

        for line in content.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                // end of main section
                if !logical.is_empty() {
                    break;
                }
                continue;
            }
            match (line.strip_prefix(' '), logical.last_mut()) {
                (Some(rest), Some(last)) => last.push_str(rest),
                _ => logical.push(line.to_string()),
            }
        }

        let mut manifest = Self::default();
        for line in logical {
            if let Some((key, value)) = line.split_once(": ") {
                manifest.insert(key, value);
            }
        }
        manifest
    }
}

/// Append `line` split into 72-byte physical lines, never inside a UTF-8 sequence
fn write_wrapped(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_BYTES;

    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }

        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        // continuation lines spend one byte on the leading space
        limit = MAX_LINE_BYTES - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_manifest_bytes() {
        let manifest = Manifest::for_release("Gradle", "1.3.0", &BTreeMap::new());
        let text = String::from_utf8(manifest.to_bytes()).unwrap();

        assert_eq!(
            text,
            "Manifest-Version: 1.0\r\nImplementation-Title: Gradle\r\nImplementation-Version: 1.3.0\r\n\r\n"
        );
    }

    #[test]
    fn test_extra_attributes_follow_implementation_attributes() {
        let mut extra = BTreeMap::new();
        extra.insert("Automatic-Module-Name".to_string(), "com.deepl.api".to_string());

        let manifest = Manifest::for_release("Gradle", "1.3.0", &extra);
        let keys: Vec<&str> = manifest.attributes().iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(
            keys,
            vec![
                "Manifest-Version",
                "Implementation-Title",
                "Implementation-Version",
                "Automatic-Module-Name"
            ]
        );
    }

    #[test]
    fn test_long_lines_are_wrapped() {
        let title = "A".repeat(150);
        let manifest = Manifest::for_release(&title, "1.3.0", &BTreeMap::new());
        let text = String::from_utf8(manifest.to_bytes()).unwrap();

        for line in text.split("\r\n") {
            assert!(line.len() <= 72, "line too long: {}", line.len());
        }
        assert_eq!(Manifest::parse(&text).get("Implementation-Title"), Some(title.as_str()));
    }

    #[test]
    fn test_wrap_respects_char_boundaries() {
        let title = "ü".repeat(60);
        let manifest = Manifest::for_release(&title, "1.3.0", &BTreeMap::new());
        let bytes = manifest.to_bytes();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(Manifest::parse(&text).get("Implementation-Title"), Some(title.as_str()));
    }

    #[test]
    fn test_parse_stops_at_first_section_break() {
        let text = "Manifest-Version: 1.0\r\nImplementation-Version: 1.3.0\r\n\r\nName: com/deepl/\r\nImplementation-Version: 9.9.9\r\n";
        let manifest = Manifest::parse(text);

        assert_eq!(manifest.get("Implementation-Version"), Some("1.3.0"));
        assert_eq!(manifest.get("Name"), None);
    }

    #[test]
    fn test_insert_replaces_value() {
        let mut manifest = Manifest::for_release("Gradle", "1.3.0", &BTreeMap::new());
        manifest.insert("Implementation-Version", "1.4.0");

        assert_eq!(manifest.get("Implementation-Version"), Some("1.4.0"));
        assert_eq!(manifest.attributes().len(), 3);
    }
}
