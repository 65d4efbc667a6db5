use std::fmt;

/// A dotted path into a resource's attribute tree
///
/// Indices are normalised to `0`, so every element of a list shares the
/// path of its schema (`root_block_device.0.volume_id`). Map keys containing
/// dots are quoted: `tags['kubernetes.io/cluster']`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath(String);

impl AttributePath {
    pub fn new(path: &str) -> Self {
        let mut normalised = Self::default();

        for segment in Self::split(path) {
            normalised = if is_index(&segment) {
                normalised.index()
            } else {
                normalised.child(&segment)
            };
        }

        normalised
    }

    /// Tokenize a path, honouring `['...']` quoted segments
    ///
    /// Only the quotes delimiting a bracketed key are removed; apostrophes
    /// anywhere else belong to the segment.
    pub fn split(path: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut rest = path;

        while let Some(c) = rest.chars().next() {
            match c {
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }

                    let (segment, remainder) = match rest[1..].strip_prefix('\'') {
                        Some(quoted) => match quoted.find("']") {
                            Some(end) => (&quoted[..end], &quoted[end + 2..]),
                            None => (quoted, ""),
                        },
                        None => match rest[1..].find(']') {
                            Some(end) => (&rest[1..end + 1], &rest[end + 2..]),
                            None => (&rest[1..], ""),
                        },
                    };

                    if !segment.is_empty() {
                        segments.push(segment.to_string());
                    }
                    rest = remainder;
                    continue;
                }
                '.' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            }
            rest = &rest[c.len_utf8()..];
        }

        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }

    /// Path of a named child attribute or map key
    pub fn child(&self, name: &str) -> Self {
        if name.contains('.') || name.contains('[') || name.contains(']') {
            return Self(format!("{}['{}']", self.0, name));
        }

        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Path of a collection element
    pub fn index(&self) -> Self {
        self.child("0")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> Vec<String> {
        Self::split(&self.0)
    }

    /// Last segment of the path
    pub fn name(&self) -> String {
        self.segments().pop().unwrap_or_default()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// Whether `other` lies strictly below this path
    pub fn is_ancestor_of(&self, other: &AttributePath) -> bool {
        let mine = self.segments();
        let theirs = other.segments();

        theirs.len() > mine.len() && theirs[..mine.len()] == mine[..]
    }

    /// Whether the two paths are equal or one encloses the other
    pub fn overlaps(&self, other: &AttributePath) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// All enclosing paths, nearest first
    pub fn ancestors(&self) -> Vec<AttributePath> {
        let segments = self.segments();
        let mut result = Vec::new();

        for len in (1..segments.len()).rev() {
            let mut path = AttributePath::default();
            for segment in &segments[..len] {
                path = path.child(segment);
            }
            result.push(path);
        }

        result
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Whether a path segment addresses a list or set element
pub fn is_index(segment: &str) -> bool {
    segment == "*" || segment == "#" || (!segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
}
