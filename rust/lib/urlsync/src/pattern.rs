/// A watch pattern over `/`-separated view paths.
///
/// Supports MQTT-style wildcards:
/// - `+` matches exactly one level
/// - `#` matches all remaining levels, including none (must be last)
///
/// ```ignore
/// let p = Pattern::parse("search/+");
/// assert!(p.matches("search/filter"));
/// assert!(!p.matches("search/filter/a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Exact(String),
    Single,
    Multi,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        for level in raw.split('/') {
            match level {
                "+" => segments.push(Segment::Single),
                "#" => {
                    // Anything after `#` is unreachable.
                    segments.push(Segment::Multi);
                    break;
                }
                exact => segments.push(Segment::Exact(exact.to_string())),
            }
        }
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a concrete path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let mut levels = path.split('/');
        for segment in &self.segments {
            match segment {
                Segment::Multi => return true,
                Segment::Single => {
                    if levels.next().is_none() {
                        return false;
                    }
                }
                Segment::Exact(expected) => {
                    if levels.next() != Some(expected.as_str()) {
                        return false;
                    }
                }
            }
        }
        levels.next().is_none()
    }
}
