use serde::Serialize;

use super::slug::HEADING_TAGS;
use crate::markup::MarkupNode;

/// One heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub value: String,
    pub depth: u8,
    pub id: Option<String>,
    pub children: Vec<TocEntry>,
}

/// Headings in document order, each nested under the closest preceding
/// heading of smaller depth.
pub fn extract_toc(node: &MarkupNode) -> Vec<TocEntry> {
    let mut flat = Vec::new();
    node.walk(&mut |n| {
        if let Some(el) = n.as_element()
            && let Some(level) = HEADING_TAGS.iter().position(|tag| *tag == el.tag)
        {
            flat.push(TocEntry {
                value: n.text_content(),
                depth: level as u8 + 1,
                id: el.attrs.get_str("id").map(str::to_string),
                children: Vec::new(),
            });
        }
    });
    nest(flat)
}

fn nest(flat: Vec<TocEntry>) -> Vec<TocEntry> {
    let mut roots: Vec<TocEntry> = Vec::new();
    for entry in flat {
        insert(&mut roots, entry);
    }
    roots
}

fn insert(siblings: &mut Vec<TocEntry>, entry: TocEntry) {
    let nests = siblings.last().is_some_and(|last| last.depth < entry.depth);
    if nests && let Some(last) = siblings.last_mut() {
        insert(&mut last.children, entry);
    } else {
        siblings.push(entry);
    }
}

/// Indented outline, one heading per line.
pub fn format_toc(entries: &[TocEntry]) -> String {
    let mut out = String::new();
    write_entries(entries, 0, &mut out);
    out
}

fn write_entries(entries: &[TocEntry], indent: usize, out: &mut String) {
    for entry in entries {
        out.push_str(&"  ".repeat(indent));
        out.push_str(&entry.value);
        if let Some(id) = &entry.id {
            out.push_str(&format!(" (#{id})"));
        }
        out.push('\n');
        write_entries(&entry.children, indent + 1, out);
    }
}
