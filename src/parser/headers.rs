//! Header lines and the multi-valued header table.

/// An ordered, multi-valued header collection.
///
/// Names compare case-insensitively while keeping the casing they were first
/// seen with. Values from repeated lines and from comma-separated lists are
/// flattened into one sequence in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to the entry for `name`, creating it if needed.
    pub fn append<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => existing.extend(values),
            None => self.entries.push((name.to_string(), values.collect())),
        }
    }

    /// All values recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Check if a header exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether any value of `name` equals `token`, ignoring ASCII case.
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get(name)
            .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(token)))
    }

    /// Iterate over entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one non-empty header line into `headers`.
///
/// The name is everything before the first `:`, the value everything after,
/// both trimmed. A line with no colon becomes a name with one empty value.
/// The value is split on `,` per the list-header convention.
pub fn parse_header_line(line: &str, headers: &mut HeaderTable) {
    let (name, value) = match line.split_once(':') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => (line.trim(), ""),
    };

    headers.append(name, value.split(',').map(str::trim));
}
