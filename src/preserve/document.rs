//! Lightweight block structure over TMDL text.
//!
//! Each non-blank line opens a [`Node`]; lines indented deeper (by tabs)
//! become its children. Blank lines attach to the innermost open node and
//! `///` doc lines to the node that follows them, so rendering an
//! unmodified document reproduces the input byte for byte.

/// One line and everything nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Raw `///` lines preceding the header.
    pub doc: Vec<String>,
    /// Raw header line, indentation included.
    pub line: String,
    pub children: Vec<Node>,
}

fn tab_depth(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b'\t').count()
}

impl Node {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            doc: Vec::new(),
            line: line.into(),
            children: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        tab_depth(&self.line)
    }

    pub fn is_blank(&self) -> bool {
        self.line.trim().is_empty()
    }

    /// Header line without indentation or trailing whitespace.
    pub fn text(&self) -> &str {
        self.line.trim()
    }

    /// Remainder of the header after `keyword`, if the header starts with it.
    pub fn header(&self, keyword: &str) -> Option<&str> {
        let rest = self.text().strip_prefix(keyword)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim_start())
        } else {
            None
        }
    }

    fn property_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| {
            c.text()
                .strip_prefix(name)
                .is_some_and(|rest| rest.trim_start().starts_with(':'))
        })
    }

    /// Value of a `name: value` child.
    pub fn property(&self, name: &str) -> Option<&str> {
        let child = &self.children[self.property_index(name)?];
        let rest = child.text().strip_prefix(name)?;
        rest.trim_start().strip_prefix(':').map(str::trim)
    }

    /// True when a bare `name` child is present (`isHidden`, `isKey`).
    pub fn has_flag(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.text() == name)
    }

    /// Replace the value of an existing property. Returns false when the
    /// property is absent.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        let Some(i) = self.property_index(name) else {
            return false;
        };
        let child = &mut self.children[i];
        let tabs = "\t".repeat(child.depth());
        child.line = format!("{}{}: {}", tabs, name, value);
        true
    }

    /// Insert `name: value` right after the `anchor` property, or first.
    pub fn insert_property_after(&mut self, anchor: &str, name: &str, value: &str) {
        let tabs = "\t".repeat(self.depth() + 1);
        let node = Node::new(format!("{}{}: {}", tabs, name, value));
        match self.property_index(anchor) {
            Some(i) => self.children.insert(i + 1, node),
            None => self.children.insert(0, node),
        }
    }

    /// Children whose header starts with `keyword`.
    pub fn blocks<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.header(keyword).is_some())
    }

    pub fn blocks_mut<'a>(&'a mut self, keyword: &'a str) -> impl Iterator<Item = &'a mut Node> + 'a {
        self.children
            .iter_mut()
            .filter(move |c| c.header(keyword).is_some())
    }

    pub fn render_into(&self, out: &mut String) {
        for doc in &self.doc {
            out.push_str(doc);
            out.push('\n');
        }
        out.push_str(&self.line);
        out.push('\n');
        for child in &self.children {
            child.render_into(out);
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }
}

/// A parsed TMDL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
    trailing_newline: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            trailing_newline: true,
        }
    }
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        if text.is_empty() {
            return Self {
                nodes: Vec::new(),
                trailing_newline: false,
            };
        }

        let mut roots: Vec<Node> = Vec::new();
        let mut open: Vec<Node> = Vec::new();
        let mut pending_doc: Vec<String> = Vec::new();

        fn close(open: &mut Vec<Node>, roots: &mut Vec<Node>, depth: usize) {
            while open.last().is_some_and(|n| n.depth() >= depth) {
                if let Some(node) = open.pop() {
                    match open.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
            }
        }

        for line in body.split('\n') {
            if line.trim().is_empty() {
                match open.last_mut() {
                    Some(node) => node.children.push(Node::new(line)),
                    None => roots.push(Node::new(line)),
                }
                continue;
            }
            if line.trim_start().starts_with("///") {
                pending_doc.push(line.to_string());
                continue;
            }
            close(&mut open, &mut roots, tab_depth(line));
            let mut node = Node::new(line);
            node.doc = std::mem::take(&mut pending_doc);
            open.push(node);
        }
        close(&mut open, &mut roots, 0);
        // Doc lines with nothing after them.
        roots.extend(pending_doc.into_iter().map(Node::new));

        Self {
            nodes: roots,
            trailing_newline,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.render_into(&mut out);
        }
        if !self.trailing_newline {
            out.pop();
        }
        out
    }

    pub fn blocks<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.header(keyword).is_some())
    }

    pub fn blocks_mut<'a>(&'a mut self, keyword: &'a str) -> impl Iterator<Item = &'a mut Node> + 'a {
        self.nodes
            .iter_mut()
            .filter(move |n| n.header(keyword).is_some())
    }
}
