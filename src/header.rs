//! Header row parsing into dotted field paths.

/// One header column, pre-split into its dot-separated segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPath {
    raw: String,
    segments: Vec<String>,
}

impl HeaderPath {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

/// Ordered list of header paths. Construction never fails: a malformed
/// header still yields a schema and shows up later as odd record data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSchema {
    paths: Vec<HeaderPath>,
}

impl HeaderSchema {
    #[cfg(test)]
    pub fn parse(line: &str, delimiter: u8) -> Self {
        Self::from_tokens(&crate::io_utils::decode_line(line, delimiter))
    }

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let paths = tokens
            .iter()
            .map(|token| HeaderPath::new(token.as_ref()))
            .collect();
        Self { paths }
    }

    pub fn paths(&self) -> &[HeaderPath] {
        &self.paths
    }

    pub fn names(&self) -> Vec<&str> {
        self.paths.iter().map(HeaderPath::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_keeps_order() {
        let schema = HeaderSchema::parse(" name.firstName , name.lastName,age ,address.city", b',');
        assert_eq!(
            schema.names(),
            vec!["name.firstName", "name.lastName", "age", "address.city"]
        );
        assert_eq!(schema.paths()[0].segments(), ["name", "firstName"]);
        assert_eq!(schema.paths()[2].depth(), 1);
    }

    #[test]
    fn malformed_headers_still_produce_a_schema() {
        let schema = HeaderSchema::parse("a..b,,.x,a.b", b',');
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.paths()[0].segments(), ["a", "", "b"]);
        assert_eq!(schema.paths()[1].segments(), [""]);
        assert_eq!(schema.paths()[2].segments(), ["", "x"]);
        // duplicates are kept as-is
        assert_eq!(schema.paths()[3].as_str(), "a.b");
    }

    #[test]
    fn alternate_delimiter() {
        let schema = HeaderSchema::parse("name.firstName;age", b';');
        assert_eq!(schema.names(), vec!["name.firstName", "age"]);
    }
}
