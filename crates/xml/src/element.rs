//! A small owned XML element tree.
//!
//! We keep only what the dictionary loaders need: names, attributes, text, and child elements.  Text keeps track of
//! entity references separately, since the loaders store some references as ids rather than text.

/// A piece of an element's character data.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Text(String),
    /// A reference to an entity declared in the document's DTD.
    Entity { name: String, expansion: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
    /// How much of `content` came before the first child element.
    leading: Option<usize>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Element {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Append text, merging with any text immediately before it.
    pub fn push_text(&mut self, text: &str) {
        if let Some(Content::Text(last)) = self.content.last_mut() {
            last.push_str(text);
        } else {
            self.content.push(Content::Text(text.to_string()));
        }
    }

    pub fn push_entity(&mut self, name: impl Into<String>, expansion: impl Into<String>) {
        self.content.push(Content::Entity {
            name: name.into(),
            expansion: expansion.into(),
        });
    }

    pub fn push_child(&mut self, child: Element) {
        if self.leading.is_none() {
            self.leading = Some(self.content.len());
        }
        self.children.push(child);
    }

    /// Content before the first child element.
    fn leading_content(&self) -> &[Content] {
        &self.content[..self.leading.unwrap_or(self.content.len())]
    }

    /// Get an attribute by its qualified name, e.g. `xml:lang`.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter_content(&self) -> impl Iterator<Item = &Content> {
        self.content.iter()
    }

    pub fn iter_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// The first child with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All descendants reached by following `path` one level per name, in document order.
    ///
    /// An empty path returns this element.
    pub fn find_path(&self, path: &[&str]) -> Vec<&Element> {
        let mut found = vec![self];
        for name in path.iter() {
            found = found
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.name == *name))
                .collect();
        }
        found
    }

    /// The text before the first child element, with surrounding whitespace trimmed, or `None` if there is none.
    ///
    /// Entity references contribute their expansion.  Text after a child element (`b` in `<gloss>a<pri/>b</gloss>`)
    /// is not included.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        for c in self.leading_content() {
            match c {
                Content::Text(t) => out.push_str(t),
                Content::Entity { expansion, .. } => out.push_str(expansion),
            }
        }

        let trimmed = out.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// If the element's leading content is exactly one entity reference (ignoring whitespace), the entity's name.
    pub fn entity_reference(&self) -> Option<&str> {
        let mut meaningful = self.leading_content().iter().filter(|c| match c {
            Content::Text(t) => !t.trim().is_empty(),
            Content::Entity { .. } => true,
        });

        match (meaningful.next(), meaningful.next()) {
            (Some(Content::Entity { name, .. }), None) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Text of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.find(name).and_then(|x| x.text())
    }
}
