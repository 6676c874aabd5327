//! Page snapshot: a minimal element tree the localizer reads and mutates.
//!
//! Elements carry a tag, attributes, their own text (or raw HTML) content and
//! children. Elements are addressed by [`ElementPath`], the child indices
//! from the root, which stay valid because localization never adds or
//! removes elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Own content of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    Text(String),
    Html(String),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Content::Text(text) | Content::Html(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.content = Content::Text(text.to_string());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(&self) -> &str {
        self.content.as_str()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute("class", &joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute("class", &joined);
    }
}

/// Child indices leading from the root to an element. The root is `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ElementPath(pub Vec<usize>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn get(&self, path: &ElementPath) -> Option<&Element> {
        path.0
            .iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    pub fn get_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        path.0
            .iter()
            .try_fold(&mut self.root, |node, &index| node.children.get_mut(index))
    }

    /// Every element with its path, in document (pre-)order.
    pub fn elements(&self) -> Vec<(ElementPath, &Element)> {
        let mut out = Vec::new();
        let mut stack = vec![(ElementPath::default(), &self.root)];
        while let Some((path, element)) = stack.pop() {
            for (index, child) in element.children.iter().enumerate().rev() {
                let mut child_path = path.0.clone();
                child_path.push(index);
                stack.push((ElementPath(child_path), child));
            }
            out.push((path, element));
        }
        out
    }

    /// Paths of all elements carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Vec<ElementPath> {
        self.elements()
            .into_iter()
            .filter(|(_, element)| element.has_class(class))
            .map(|(path, _)| path)
            .collect()
    }
}
