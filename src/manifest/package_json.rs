//! package.json reading and editing
//!
//! Handles:
//! - dependencies
//! - devDependencies
//! - optionalDependencies
//! - peerDependencies (read only)
//! - engines.node
//!
//! Every edit is a text splice scoped to the members it touches, so the
//! rest of the file keeps its bytes. New members copy the layout of their
//! neighbours; a new section uses the indentation found before `"name"`.

use crate::domain::DependencyType;
use crate::error::ManifestError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// Indentation used when none can be detected
const DEFAULT_INDENT: &str = "  ";

/// Section holding peer dependencies; read but never edited
const PEER_SECTION: &str = "peerDependencies";

/// A dependency declared directly in package.json
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependency {
    /// Package name
    pub name: String,
    /// Requested range as written
    pub spec: String,
    /// Section the entry lives in
    pub section: String,
}

/// A parsed package.json together with its original text
#[derive(Debug, Clone)]
pub struct PackageJson {
    path: PathBuf,
    content: String,
    root: Map<String, Value>,
}

impl PackageJson {
    /// Read `package.json` from `project_dir`
    pub fn read(project_dir: &Path) -> Result<Self, ManifestError> {
        let path = project_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::not_found(&path));
        }
        let content =
            fs::read_to_string(&path).map_err(|e| ManifestError::read_error(&path, e))?;
        Self::parse(path, content)
    }

    /// Parse manifest text read from `path`
    pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self, ManifestError> {
        let path = path.into();
        let content = content.into();
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| ManifestError::json_parse_error(&path, e.to_string()))?;
        let Value::Object(root) = value else {
            return Err(ManifestError::InvalidStructure {
                path,
                message: "top-level value is not an object".to_string(),
            });
        };
        Ok(Self {
            path,
            content,
            root,
        })
    }

    /// Path the manifest was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// `name` field
    pub fn name(&self) -> Option<&str> {
        self.root.get("name").and_then(Value::as_str)
    }

    /// `version` field
    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// `engines.node` field
    pub fn engine_constraint(&self) -> Option<&str> {
        self.root
            .get("engines")
            .and_then(|engines| engines.get("node"))
            .and_then(Value::as_str)
    }

    /// All entries of the dependency sections, peer dependencies included
    pub fn direct_dependencies(&self) -> Vec<DirectDependency> {
        let sections = DependencyType::all()
            .iter()
            .map(|t| t.section())
            .chain(std::iter::once(PEER_SECTION));

        let mut deps = Vec::new();
        for section in sections {
            let Some(entries) = self.root.get(section).and_then(Value::as_object) else {
                continue;
            };
            for (name, spec) in entries {
                if let Some(spec) = spec.as_str() {
                    deps.push(DirectDependency {
                        name: name.clone(),
                        spec: spec.to_string(),
                        section: section.to_string(),
                    });
                }
            }
        }
        deps
    }

    /// Returns the requested range of `package` in its `dep_type` section
    pub fn dependency_spec(&self, dep_type: DependencyType, package: &str) -> Option<&str> {
        self.root
            .get(dep_type.section())
            .and_then(|section| section.get(package))
            .and_then(Value::as_str)
    }

    /// Maps each installable direct dependency to its type.
    ///
    /// A package listed in several sections keeps the first of
    /// production, development, optional.
    pub fn dependency_types(&self) -> HashMap<String, DependencyType> {
        let mut types = HashMap::new();
        for dep_type in DependencyType::all() {
            if let Some(entries) = self.root.get(dep_type.section()).and_then(Value::as_object) {
                for name in entries.keys() {
                    types.entry(name.clone()).or_insert(*dep_type);
                }
            }
        }
        types
    }

    /// Returns the text with `package`'s version in `dep_type`'s section
    /// replaced by `version`, leaving every other byte untouched
    pub fn with_updated_version(
        &self,
        dep_type: DependencyType,
        package: &str,
        version: &str,
    ) -> Result<String, ManifestError> {
        let section = dep_type.section();
        let not_found = || ManifestError::entry_not_found(&self.path, package, section);

        let (start, end) = find_top_level_object(&self.content, section).ok_or_else(not_found)?;
        let pattern = format!(r#"("{}"\s*:\s*)"(?:[^"\\]|\\.)*""#, regex::escape(package));
        let re = Regex::new(&pattern).map_err(|e| ManifestError::InvalidStructure {
            path: self.path.clone(),
            message: format!("invalid package name '{}': {}", package, e),
        })?;

        let scope = &self.content[start..end];
        let caps = re.captures(scope).ok_or_else(not_found)?;
        let (Some(whole), Some(prefix)) = (caps.get(0), caps.get(1)) else {
            return Err(not_found());
        };

        let mut updated = String::with_capacity(self.content.len() + version.len());
        updated.push_str(&self.content[..start + whole.start()]);
        updated.push_str(prefix.as_str());
        updated.push('"');
        updated.push_str(&escape_json_string(version));
        updated.push('"');
        updated.push_str(&self.content[start + whole.end()..]);
        Ok(updated)
    }

    /// Returns the text with `original` removed from `dep_type`'s section and
    /// `alternative` added to `dependencies`. Only those two members change.
    pub fn with_replacement(
        &self,
        dep_type: DependencyType,
        original: &str,
        alternative: &str,
        alternative_version: &str,
    ) -> Result<String, ManifestError> {
        let section = dep_type.section();
        let not_found = || ManifestError::entry_not_found(&self.path, original, section);

        let (open, close) = self
            .object_span(&self.content, section)?
            .ok_or_else(not_found)?;
        let members = object_members(&self.content, open, close)
            .ok_or_else(|| self.invalid(format!("cannot read '{}'", section)))?;
        let index = members
            .iter()
            .position(|m| m.key == original)
            .ok_or_else(not_found)?;
        let removed = remove_member(&self.content, open, close, &members, index);

        self.set_nested(
            &removed,
            DependencyType::Production.section(),
            alternative,
            alternative_version,
        )
    }

    /// Returns the text with `engines.node` set to `range`
    pub fn with_engines(&self, range: &str) -> Result<String, ManifestError> {
        self.set_nested(&self.content, "engines", "node", range)
    }

    /// Sets `section.key` to the string `value` in `content`, creating the
    /// section at the end of the document when it is missing
    fn set_nested(
        &self,
        content: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<String, ManifestError> {
        let unit = detect_indent(&self.content);
        let quoted = quote(value);

        if let Some((open, close)) = self.object_span(content, section)? {
            return upsert_member(content, open, close, key, &quoted, &unit)
                .ok_or_else(|| self.invalid(format!("cannot edit '{}'", section)));
        }

        let (open, close) =
            root_object(content).ok_or_else(|| self.invalid("top-level value is not an object"))?;
        let object = if content[open..=close].contains('\n') {
            format!("{{\n{unit}{unit}{}: {}\n{unit}}}", quote(key), quoted, unit = unit)
        } else {
            format!("{{{}: {}}}", quote(key), quoted)
        };
        upsert_member(content, open, close, section, &object, &unit)
            .ok_or_else(|| self.invalid("cannot edit the top-level object"))
    }

    /// Span `(open, close)` of the object under top-level `key`, `None` when
    /// the key is absent
    fn object_span(&self, content: &str, key: &str) -> Result<Option<(usize, usize)>, ManifestError> {
        let (open, close) =
            root_object(content).ok_or_else(|| self.invalid("top-level value is not an object"))?;
        let members = object_members(content, open, close)
            .ok_or_else(|| self.invalid("cannot read the top-level object"))?;
        let Some(member) = members.iter().find(|m| m.key == key) else {
            return Ok(None);
        };
        if content.as_bytes()[member.value_start] != b'{' {
            return Err(self.invalid(format!("'{}' is not an object", key)));
        }
        Ok(Some((member.value_start, member.value_end - 1)))
    }

    fn invalid(&self, message: impl Into<String>) -> ManifestError {
        ManifestError::InvalidStructure {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

/// Write manifest text to `path`
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

/// Returns the whitespace preceding a top-level `"name"` key, or two spaces
pub fn detect_indent(content: &str) -> String {
    Regex::new(r#"(?m)^([ \t]+)"name"\s*:"#)
        .ok()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}

fn escape_json_string(value: &str) -> String {
    let quoted = quote(value);
    quoted[1..quoted.len() - 1].to_string()
}

fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// One `"key": value` pair of an object, as byte offsets into the text
struct Member<'a> {
    /// Key as written, without quotes
    key: &'a str,
    /// Opening quote of the key
    start: usize,
    /// Closing quote of the key
    key_end: usize,
    value_start: usize,
    /// One past the last byte of the value
    value_end: usize,
}

/// Byte span `{ ... }` of the object stored under top-level `key`
fn find_top_level_object(content: &str, key: &str) -> Option<(usize, usize)> {
    let (open, close) = root_object(content)?;
    let members = object_members(content, open, close)?;
    let member = members.iter().find(|m| m.key == key)?;
    (content.as_bytes()[member.value_start] == b'{').then_some((member.value_start, member.value_end))
}

/// Positions of the outermost `{` and its matching `}`
fn root_object(content: &str) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let open = skip_whitespace(bytes, 0);
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    Some((open, matching_close(bytes, open)?))
}

/// Members of the object whose braces sit at `open` and `close`
fn object_members(content: &str, open: usize, close: usize) -> Option<Vec<Member<'_>>> {
    let bytes = content.as_bytes();
    let mut members = Vec::new();
    let mut i = skip_whitespace(bytes, open + 1);

    while i < close {
        if bytes[i] != b'"' {
            return None;
        }
        let key_end = string_end(bytes, i)?;
        let colon = skip_whitespace(bytes, key_end + 1);
        if bytes.get(colon) != Some(&b':') {
            return None;
        }
        let value_start = skip_whitespace(bytes, colon + 1);
        let value_end = value_end(bytes, value_start)?;
        members.push(Member {
            key: &content[i + 1..key_end],
            start: i,
            key_end,
            value_start,
            value_end,
        });

        let next = skip_whitespace(bytes, value_end);
        if bytes.get(next) != Some(&b',') {
            break;
        }
        i = skip_whitespace(bytes, next + 1);
    }
    Some(members)
}

/// Cuts member `index` out of its object along with one neighbouring comma
fn remove_member(content: &str, open: usize, close: usize, members: &[Member<'_>], index: usize) -> String {
    let (from, to) = match members.get(index + 1) {
        Some(next) => (members[index].start, next.start),
        None if index > 0 => (members[index - 1].value_end, members[index].value_end),
        None => (open + 1, close),
    };
    splice(content, from, to, "")
}

/// Sets `key` to the raw JSON `value` in the object spanning `open..=close`.
///
/// An existing member only has its value replaced. A new member follows the
/// last one, laid out with the whitespace and separator the object already
/// uses.
fn upsert_member(content: &str, open: usize, close: usize, key: &str, value: &str, unit: &str) -> Option<String> {
    let members = object_members(content, open, close)?;
    if let Some(existing) = members.iter().find(|m| m.key == key) {
        return Some(splice(content, existing.value_start, existing.value_end, value));
    }

    let key = quote(key);
    match (members.first(), members.last()) {
        (Some(first), Some(last)) => {
            let gap = &content[open + 1..first.start];
            let separator = &content[last.key_end + 1..last.value_start];
            let member = format!(",{}{}{}{}", gap, key, separator, value);
            Some(splice(content, last.value_end, last.value_end, &member))
        }
        _ if !content.contains('\n') => {
            Some(splice(content, open + 1, close, &format!("{}: {}", key, value)))
        }
        _ => {
            let outer = line_indent(content, open);
            let member = format!("\n{}{}{}: {}\n{}", outer, unit, key, value, outer);
            Some(splice(content, open + 1, close, &member))
        }
    }
}

fn splice(content: &str, from: usize, to: usize, text: &str) -> String {
    let mut out = String::with_capacity(content.len() + text.len());
    out.push_str(&content[..from]);
    out.push_str(text);
    out.push_str(&content[to..]);
    out
}

/// Leading whitespace of the line containing `pos`
fn line_indent(content: &str, pos: usize) -> &str {
    let line_start = content[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &content[line_start..pos];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

fn value_end(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start)? {
        b'"' => string_end(bytes, start).map(|end| end + 1),
        b'{' | b'[' => matching_close(bytes, start).map(|end| end + 1),
        _ => {
            let mut i = start;
            while i < bytes.len()
                && !matches!(bytes[i], b',' | b'}' | b']')
                && !bytes[i].is_ascii_whitespace()
            {
                i += 1;
            }
            (i > start).then_some(i)
        }
    }
}

fn string_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Closing `}` or `]` matching the bracket at `open`
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = string_end(bytes, i)?;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
    "name": "demo",
    "version": "1.0.0",
    "engines": {
        "node": ">=16.0.0"
    },
    "dependencies": {
        "zod": "^3.0.0",
        "lodash": "^4.17.21"
    },
    "devDependencies": {
        "lodash": "^4.0.0",
        "jest": "^29.0.0"
    },
    "optionalDependencies": {
        "fsevents": "^2.3.0"
    },
    "peerDependencies": {
        "react": "^18.0.0"
    }
}
"#;

    fn sample() -> PackageJson {
        PackageJson::parse("package.json", SAMPLE).unwrap()
    }

    #[test]
    fn test_read_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackageJson::read(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        let err = PackageJson::read(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::JsonParseError { .. }));
    }

    #[test]
    fn test_parse_non_object() {
        let err = PackageJson::parse("package.json", "[]").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidStructure { .. }));
    }

    #[test]
    fn test_name_and_engines() {
        let manifest = sample();
        assert_eq!(manifest.name(), Some("demo"));
        assert_eq!(manifest.engine_constraint(), Some(">=16.0.0"));
    }

    #[test]
    fn test_direct_dependencies() {
        let deps = sample().direct_dependencies();
        assert_eq!(deps.len(), 6);
        let react = deps.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.section, "peerDependencies");
        assert_eq!(react.spec, "^18.0.0");
    }

    #[test]
    fn test_dependency_types_prefers_production() {
        let types = sample().dependency_types();
        assert_eq!(types["lodash"], DependencyType::Production);
        assert_eq!(types["jest"], DependencyType::Development);
        assert_eq!(types["fsevents"], DependencyType::Optional);
        assert!(!types.contains_key("react"));
    }

    #[test]
    fn test_update_is_scoped_to_section() {
        let manifest = sample();
        let updated = manifest
            .with_updated_version(DependencyType::Development, "lodash", "4.17.21")
            .unwrap();
        assert_eq!(
            updated,
            SAMPLE.replace(
                "\"lodash\": \"^4.0.0\"",
                "\"lodash\": \"4.17.21\""
            )
        );
    }

    #[test]
    fn test_update_preserves_everything_else() {
        let manifest = sample();
        let updated = manifest
            .with_updated_version(DependencyType::Production, "zod", "^3.23.8")
            .unwrap();
        assert_eq!(updated, SAMPLE.replace("^3.0.0", "^3.23.8"));
    }

    #[test]
    fn test_update_missing_entry() {
        let manifest = sample();
        let err = manifest
            .with_updated_version(DependencyType::Optional, "jest", "30.0.0")
            .unwrap_err();
        assert!(matches!(err, ManifestError::EntryNotFound { .. }));
    }

    #[test]
    fn test_update_missing_section() {
        let manifest = PackageJson::parse("package.json", r#"{"name": "x"}"#).unwrap();
        assert!(manifest
            .with_updated_version(DependencyType::Production, "a", "1.0.0")
            .is_err());
    }

    #[test]
    fn test_update_scoped_package_compact_format() {
        let content = r#"{"dependencies": { "@types/node" : "^20.0.0", "a": "1" }}"#;
        let manifest = PackageJson::parse("package.json", content).unwrap();
        let updated = manifest
            .with_updated_version(DependencyType::Production, "@types/node", "20.11.0")
            .unwrap();
        assert_eq!(
            updated,
            r#"{"dependencies": { "@types/node" : "20.11.0", "a": "1" }}"#
        );
    }

    #[test]
    fn test_update_ignores_nested_sections() {
        let content = r#"{
  "overrides": { "dependencies": { "a": "1.0.0" } },
  "dependencies": { "a": "2.0.0" }
}"#;
        let manifest = PackageJson::parse("package.json", content).unwrap();
        let updated = manifest
            .with_updated_version(DependencyType::Production, "a", "3.0.0")
            .unwrap();
        assert!(updated.contains(r#""overrides": { "dependencies": { "a": "1.0.0" } }"#));
        assert!(updated.contains(r#""dependencies": { "a": "3.0.0" }"#));
    }

    #[test]
    fn test_replacement() {
        let manifest = sample();
        let replaced = manifest
            .with_replacement(DependencyType::Development, "jest", "vitest", "^1.6.0")
            .unwrap();
        let parsed: Value = serde_json::from_str(&replaced).unwrap();
        assert!(parsed["devDependencies"].get("jest").is_none());
        assert_eq!(parsed["devDependencies"]["lodash"], "^4.0.0");
        assert_eq!(parsed["dependencies"]["vitest"], "^1.6.0");
        assert!(replaced.contains("\n    \"name\": \"demo\""));
        assert!(replaced.ends_with("}\n"));

        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "name");
        assert_eq!(keys[3], "dependencies");
    }

    #[test]
    fn test_replacement_creates_dependencies_section() {
        let content = "{\n  \"name\": \"x\",\n  \"devDependencies\": {\n    \"a\": \"1.0.0\"\n  }\n}";
        let manifest = PackageJson::parse("package.json", content).unwrap();
        let replaced = manifest
            .with_replacement(DependencyType::Development, "a", "b", "2.0.0")
            .unwrap();
        assert_eq!(
            replaced,
            "{\n  \"name\": \"x\",\n  \"devDependencies\": {},\n  \"dependencies\": {\n    \"b\": \"2.0.0\"\n  }\n}"
        );
    }

    const LAYOUT: &str = r#"{
  "name": "web",
  "description": "caf\u00e9",
  "files": ["dist", "lib"],
  "dependencies": {
    "a": "^1.0.0",
    "c": "^1.0.0"
  },
  "devDependencies": {
    "jest": "^29.0.0"
  }
}
"#;

    fn layout() -> PackageJson {
        PackageJson::parse("package.json", LAYOUT).unwrap()
    }

    #[test]
    fn test_replacement_keeps_untouched_bytes() {
        let replaced = layout()
            .with_replacement(DependencyType::Production, "a", "b", "2.0.0")
            .unwrap();
        assert_eq!(
            replaced,
            r#"{
  "name": "web",
  "description": "caf\u00e9",
  "files": ["dist", "lib"],
  "dependencies": {
    "c": "^1.0.0",
    "b": "2.0.0"
  },
  "devDependencies": {
    "jest": "^29.0.0"
  }
}
"#
        );
    }

    #[test]
    fn test_replacement_of_last_member() {
        let replaced = layout()
            .with_replacement(DependencyType::Production, "c", "d", "1.0.0")
            .unwrap();
        assert_eq!(
            replaced,
            LAYOUT.replace(
                "\"a\": \"^1.0.0\",\n    \"c\": \"^1.0.0\"",
                "\"a\": \"^1.0.0\",\n    \"d\": \"1.0.0\""
            )
        );
    }

    #[test]
    fn test_replacement_empties_dev_section() {
        let replaced = layout()
            .with_replacement(DependencyType::Development, "jest", "vitest", "^1.6.0")
            .unwrap();
        assert_eq!(
            replaced,
            r#"{
  "name": "web",
  "description": "caf\u00e9",
  "files": ["dist", "lib"],
  "dependencies": {
    "a": "^1.0.0",
    "c": "^1.0.0",
    "vitest": "^1.6.0"
  },
  "devDependencies": {}
}
"#
        );
    }

    #[test]
    fn test_replacement_compact_document() {
        let content = r#"{"name":"x","dependencies":{"a":"1"}}"#;
        let manifest = PackageJson::parse("package.json", content).unwrap();
        let replaced = manifest
            .with_replacement(DependencyType::Production, "a", "b", "2.0.0")
            .unwrap();
        assert_eq!(replaced, r#"{"name":"x","dependencies":{"b": "2.0.0"}}"#);
    }

    #[test]
    fn test_replacement_missing_original() {
        let manifest = sample();
        let err = manifest
            .with_replacement(DependencyType::Production, "jest", "vitest", "1.0.0")
            .unwrap_err();
        assert!(matches!(err, ManifestError::EntryNotFound { .. }));
    }

    #[test]
    fn test_with_engines() {
        let content = "{\n\t\"name\": \"x\"\n}\n";
        let manifest = PackageJson::parse("package.json", content).unwrap();
        let updated = manifest.with_engines(">=18.0.0 <=20.11.0").unwrap();
        assert_eq!(
            updated,
            "{\n\t\"name\": \"x\",\n\t\"engines\": {\n\t\t\"node\": \">=18.0.0 <=20.11.0\"\n\t}\n}\n"
        );
    }

    #[test]
    fn test_with_engines_appends_section() {
        let updated = layout().with_engines(">=18.0.0").unwrap();
        assert_eq!(
            updated,
            LAYOUT.replace(
                "    \"jest\": \"^29.0.0\"\n  }\n}\n",
                "    \"jest\": \"^29.0.0\"\n  },\n  \"engines\": {\n    \"node\": \">=18.0.0\"\n  }\n}\n"
            )
        );
    }

    #[test]
    fn test_with_engines_replaces_value_only() {
        let updated = sample().with_engines(">=18.0.0 <=24.11.0").unwrap();
        assert_eq!(updated, SAMPLE.replace(">=16.0.0", ">=18.0.0 <=24.11.0"));
    }

    #[test]
    fn test_with_engines_compact_document() {
        let manifest = PackageJson::parse("package.json", r#"{"name":"x"}"#).unwrap();
        let updated = manifest.with_engines(">=20.0.0").unwrap();
        assert_eq!(updated, r#"{"name":"x","engines":{"node": ">=20.0.0"}}"#);
    }

    #[test]
    fn test_with_engines_rejects_non_object() {
        let manifest = PackageJson::parse("package.json", r#"{"engines": "node"}"#).unwrap();
        let err = manifest.with_engines(">=20.0.0").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidStructure { .. }));
    }

    #[test]
    fn test_detect_indent() {
        assert_eq!(detect_indent(SAMPLE), "    ");
        assert_eq!(detect_indent("{\n  \"name\": \"x\"}"), "  ");
        assert_eq!(detect_indent(r#"{"name":"x"}"#), DEFAULT_INDENT);
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        write_manifest(&path, "{}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
