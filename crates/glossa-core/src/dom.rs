//! DOM construction and traversal helpers over `markup5ever_rcdom`

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Decode raw bytes with a charset label, falling back to lossy UTF-8
pub fn decode_bytes(data: &[u8], charset: Option<&str>) -> String {
    match charset.and_then(|label| Encoding::for_label(label.trim().as_bytes())) {
        Some(encoding) => {
            let (text, _, _) = encoding.decode(data);
            text.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    }
}

/// Parse markup text into a DOM
pub fn html_to_dom(text: &str) -> std::io::Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut text.as_bytes())
}

/// Find elements along a path of element names, searching at any depth
/// between path steps
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found = Vec::new();
    let Some((first, rest)) = node_names.split_first() else {
        return found;
    };

    let matches = get_node_name(node).is_some_and(|name| name == *first);
    if matches && rest.is_empty() {
        found.push(node.clone());
    }

    let next: &[&str] = if matches && !rest.is_empty() {
        rest
    } else {
        node_names
    };
    for child in node.children.borrow().iter() {
        found.append(&mut find_nodes(child, next));
    }

    found
}

/// First element child with the given name
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| get_node_name(child) == Some(node_name))
        .cloned()
}

/// Element children, in document order
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// First element descendant (excluding the node itself) whose name is in `names`
pub fn first_descendant(node: &Handle, names: &[&str]) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if get_node_name(child).is_some_and(|name| names.contains(&name)) {
            return Some(child.clone());
        }
        if let Some(found) = first_descendant(child, names) {
            return Some(found);
        }
    }
    None
}

/// Attribute value
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// All attributes, in source order
pub fn get_node_attrs(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Local element name
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Contents of a text node
pub fn get_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// Concatenated text of all descendant text nodes
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}
