//! Terminal rendering of an outline via `termtree`.

use termtree::Tree;

use crate::domain::{CollapseState, NodeType, Outline, OutlineNode, TreePath};

pub trait OutlineDisplay {
    /// Build a printable tree headed by `heading`, honouring collapsed rows.
    fn to_term_tree(&self, heading: &str, collapse: &CollapseState) -> Tree<String>;
}

/// Row label: `[kind] title  (path)` plus lesson details and a collapsed marker.
pub fn row_label(path: &TreePath, node: &OutlineNode, hidden_children: usize) -> String {
    let mut label = format!("[{}] {}  ({})", node.node_type, node.title, path);
    if node.node_type == NodeType::Lesson {
        if let Some(kind) = node.lesson.lesson_type {
            label.push_str(&format!(" {}", kind));
        }
        if let Some(minutes) = node.lesson.duration {
            label.push_str(&format!(" {} min", minutes));
        }
        if !node.lesson.attachments.is_empty() {
            label.push_str(&format!(" +{} files", node.lesson.attachments.len()));
        }
    }
    if hidden_children > 0 {
        label.push_str(&format!(" ▸ {} hidden", hidden_children));
    }
    label
}

impl OutlineDisplay for Outline {
    fn to_term_tree(&self, heading: &str, collapse: &CollapseState) -> Tree<String> {
        let mut tree = Tree::new(heading.to_string());
        if self.is_empty() {
            tree.push(Tree::new("(empty)".to_string()));
            return tree;
        }

        fn build(outline: &Outline, path: TreePath, collapse: &CollapseState) -> Option<Tree<String>> {
            let node = outline.get(&path)?;
            let count = outline.child_count(&path).unwrap_or(0);
            if collapse.is_collapsed(&node.id) {
                return Some(Tree::new(row_label(&path, node, count)));
            }
            let leaves: Vec<_> = (0..count)
                .filter_map(|i| build(outline, path.child(i), collapse))
                .collect();
            Some(Tree::new(row_label(&path, node, 0)).with_leaves(leaves))
        }

        let top = self.child_count(&TreePath::root()).unwrap_or(0);
        for i in 0..top {
            if let Some(child) = build(self, TreePath::new(vec![i]), collapse) {
                tree.push(child);
            }
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EditorVariant, LessonDetails, LessonType, TreeNode};

    #[test]
    fn renders_lesson_details_and_hides_collapsed() {
        let mut lesson = TreeNode::new("Welcome", NodeType::Lesson).with_id("l1");
        lesson.lesson = LessonDetails {
            duration: Some(5),
            lesson_type: Some(LessonType::Video),
            ..LessonDetails::default()
        };
        let outline = Outline::from_nodes(
            EditorVariant::Curriculum,
            vec![TreeNode::new("Basics", NodeType::Section)
                .with_id("s1")
                .with_children(vec![TreeNode::new("Start", NodeType::Unit)
                    .with_id("u1")
                    .with_children(vec![TreeNode::new("Hello", NodeType::Topic)
                        .with_id("t1")
                        .with_children(vec![lesson])])])],
        )
        .unwrap();

        let expanded = outline
            .to_term_tree("curriculum:c1", &CollapseState::new())
            .to_string();
        assert!(expanded.contains("[lesson] Welcome  (0.0.0.0) Video 5 min"));

        let mut collapse = CollapseState::new();
        collapse.set_collapsed("u1", true);
        let folded = outline.to_term_tree("curriculum:c1", &collapse).to_string();
        assert!(folded.contains("[unit] Start  (0.0) ▸ 1 hidden"));
        assert!(!folded.contains("Welcome"));
    }

    #[test]
    fn empty_outline_says_so() {
        let outline = Outline::new(EditorVariant::Structure);
        let text = outline.to_term_tree("k", &CollapseState::new()).to_string();
        assert!(text.contains("(empty)"));
    }
}
