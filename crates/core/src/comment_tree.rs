//! Comment tree assembly.
//!
//! Turns the flat, parent-referencing comment list of one poll into a forest
//! of reply trees. Pure and synchronous: the caller has already fetched the
//! comments, nothing here touches storage.
//!
//! Ordering is `(created_at, id)` ascending, both for top-level comments and
//! for siblings, so any permutation of the same input yields the same forest.
//!
//! Comments are never dropped:
//! - a comment whose parent is not in the input (deleted, or from another
//!   poll) is placed at the top level;
//! - a comment naming itself as parent is a top-level comment;
//! - comments whose parent chain loops are cut loose at the earliest member
//!   of the loop, which becomes a top-level comment.

use std::collections::{HashMap, HashSet};

use pollhub_db::entities::comment;
use serde::Serialize;

/// A comment together with its direct replies, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    /// The comment itself.
    #[serde(flatten)]
    pub comment: comment::Model,
    /// Direct replies.
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including this one.
    #[must_use]
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

// Replies are unlinked onto a flat stack first, so dropping a long reply
// chain does not recurse once per level.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Assemble a poll's comments into a forest of reply trees.
///
/// Runs in `O(n log n)` for the ordering plus `O(n)` for wiring. Assembly,
/// [`CommentNode::size`] and dropping use explicit stacks, so reply depth is
/// unbounded for them. The derived `Serialize`, `PartialEq`, `Clone` and
/// `Debug` impls still recurse once per level.
#[must_use]
pub fn assemble_comment_tree(mut comments: Vec<comment::Model>) -> Vec<CommentNode> {
    comments.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    let n = comments.len();

    // From here on a comment is identified by its position in sorted order.
    let parent: Vec<Option<usize>> = {
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(n);
        for (pos, c) in comments.iter().enumerate() {
            position.entry(c.id.as_str()).or_insert(pos);
        }

        comments
            .iter()
            .enumerate()
            .map(|(pos, c)| {
                c.parent_id
                    .as_deref()
                    .and_then(|id| position.get(id).copied())
                    .filter(|&p| p != pos)
            })
            .collect()
    };

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (pos, p) in parent.iter().enumerate() {
        if let Some(p) = *p {
            children[p].push(pos);
        }
    }

    let mut walk = Walk {
        visited: vec![false; n],
        tree_children: vec![Vec::new(); n],
        order: Vec::with_capacity(n),
    };
    let mut roots = Vec::new();

    for pos in 0..n {
        if parent[pos].is_none() {
            roots.push(pos);
            walk.visit_from(pos, &children);
        }
    }

    // Whatever is left hangs off a parent cycle.
    for pos in 0..n {
        if !walk.visited[pos] {
            let root = cycle_entry(pos, &parent);
            tracing::warn!(
                comment_id = %comments[root].id,
                "Comment parent chain loops, promoting to top level"
            );
            roots.push(root);
            walk.visit_from(root, &children);
        }
    }
    roots.sort_unstable();

    // Build bottom-up: `order` lists every parent before its descendants.
    let mut slots: Vec<Option<comment::Model>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = (0..n).map(|_| None).collect();
    for &pos in walk.order.iter().rev() {
        let replies = walk.tree_children[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(comment) = slots[pos].take() {
            built[pos] = Some(CommentNode { comment, replies });
        }
    }

    roots
        .into_iter()
        .filter_map(|pos| built[pos].take())
        .collect()
}

struct Walk {
    visited: Vec<bool>,
    tree_children: Vec<Vec<usize>>,
    order: Vec<usize>,
}

impl Walk {
    fn visit_from(&mut self, root: usize, children: &[Vec<usize>]) {
        self.visited[root] = true;
        let mut stack = vec![root];
        while let Some(pos) = stack.pop() {
            self.order.push(pos);
            for &child in &children[pos] {
                if !self.visited[child] {
                    self.visited[child] = true;
                    self.tree_children[pos].push(child);
                    stack.push(child);
                }
            }
        }
    }
}

/// Earliest member of the parent cycle above `start`.
fn cycle_entry(start: usize, parent: &[Option<usize>]) -> usize {
    let mut seen = HashSet::new();
    let mut cur = start;
    while seen.insert(cur) {
        match parent[cur] {
            Some(p) => cur = p,
            None => return cur,
        }
    }

    let mut earliest = cur;
    let mut member = parent[cur];
    while let Some(m) = member {
        if m == cur {
            break;
        }
        earliest = earliest.min(m);
        member = parent[m];
    }
    earliest
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rand::seq::SliceRandom;

    fn create_test_comment(id: &str, parent_id: Option<&str>, t: i64) -> comment::Model {
        let at = Utc.timestamp_opt(1_700_000_000 + t, 0).unwrap().fixed_offset();
        comment::Model {
            id: id.to_string(),
            poll_id: "p1".to_string(),
            user_id: "user1".to_string(),
            parent_id: parent_id.map(ToString::to_string),
            content: format!("comment {id}"),
            created_at: at,
            updated_at: at,
        }
    }

    /// `(id, replies)` outline for compact assertions.
    #[derive(Debug, PartialEq, Eq)]
    struct Shape(String, Vec<Shape>);

    fn shape(forest: &[CommentNode]) -> Vec<Shape> {
        forest
            .iter()
            .map(|n| Shape(n.comment.id.clone(), shape(&n.replies)))
            .collect()
    }

    fn leaf(id: &str) -> Shape {
        Shape(id.to_string(), vec![])
    }

    fn total(forest: &[CommentNode]) -> usize {
        forest.iter().map(CommentNode::size).sum()
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_comment_tree(vec![]).is_empty());
    }

    #[test]
    fn test_reply_and_orphan() {
        let comments = vec![
            create_test_comment("1", None, 0),
            create_test_comment("2", Some("1"), 1),
            create_test_comment("3", Some("99"), 2),
        ];

        let forest = assemble_comment_tree(comments);

        assert_eq!(
            shape(&forest),
            vec![Shape("1".to_string(), vec![leaf("2")]), leaf("3")]
        );
    }

    #[test]
    fn test_sibling_order_by_created_at_then_id() {
        let comments = vec![
            create_test_comment("root", None, 0),
            create_test_comment("c", Some("root"), 5),
            create_test_comment("b", Some("root"), 3),
            create_test_comment("a", Some("root"), 5),
        ];

        let forest = assemble_comment_tree(comments);

        assert_eq!(
            shape(&forest),
            vec![Shape(
                "root".to_string(),
                vec![leaf("b"), leaf("a"), leaf("c")]
            )]
        );
    }

    #[test]
    fn test_reply_older_than_parent_still_nested() {
        // Clock skew: reply timestamp precedes its parent
        let comments = vec![
            create_test_comment("late-parent", None, 10),
            create_test_comment("early-reply", Some("late-parent"), 1),
        ];

        let forest = assemble_comment_tree(comments);

        assert_eq!(
            shape(&forest),
            vec![Shape("late-parent".to_string(), vec![leaf("early-reply")])]
        );
    }

    #[test]
    fn test_deterministic_across_permutations() {
        let comments = vec![
            create_test_comment("01", None, 0),
            create_test_comment("02", Some("01"), 1),
            create_test_comment("03", Some("01"), 1),
            create_test_comment("04", Some("02"), 2),
            create_test_comment("05", None, 2),
            create_test_comment("06", Some("missing"), 3),
            create_test_comment("07", Some("05"), 4),
            create_test_comment("08", Some("04"), 5),
            create_test_comment("09", None, 5),
        ];
        let expected = assemble_comment_tree(comments.clone());

        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut shuffled = comments.clone();
            shuffled.shuffle(&mut rng);
            assert_eq!(assemble_comment_tree(shuffled), expected);
        }
    }

    #[test]
    fn test_idempotent() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
        ];
        assert_eq!(
            assemble_comment_tree(comments.clone()),
            assemble_comment_tree(comments)
        );
    }

    #[test]
    fn test_no_comment_lost() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
            create_test_comment("c", Some("gone"), 2),
            create_test_comment("d", Some("c"), 3),
            create_test_comment("e", Some("also-gone"), 4),
        ];

        let forest = assemble_comment_tree(comments);

        assert_eq!(total(&forest), 5);
        assert_eq!(
            shape(&forest),
            vec![
                Shape("a".to_string(), vec![leaf("b")]),
                Shape("c".to_string(), vec![leaf("d")]),
                leaf("e"),
            ]
        );
    }

    #[test]
    fn test_self_parent_is_top_level() {
        let comments = vec![create_test_comment("a", Some("a"), 0)];

        let forest = assemble_comment_tree(comments);

        assert_eq!(shape(&forest), vec![leaf("a")]);
    }

    #[test]
    fn test_parent_cycle_broken_at_earliest_member() {
        let comments = vec![
            create_test_comment("x", Some("z"), 1),
            create_test_comment("y", Some("x"), 2),
            create_test_comment("z", Some("y"), 3),
            create_test_comment("w", Some("y"), 0),
            create_test_comment("top", None, 5),
        ];

        let forest = assemble_comment_tree(comments);

        assert_eq!(total(&forest), 5);
        assert_eq!(
            shape(&forest),
            vec![
                Shape(
                    "x".to_string(),
                    vec![Shape("y".to_string(), vec![leaf("w"), leaf("z")])]
                ),
                leaf("top"),
            ]
        );
    }

    #[test]
    fn test_deep_chain() {
        let depth = 2_000;
        let mut comments = vec![create_test_comment("0", None, 0)];
        for i in 1..depth {
            let parent = (i - 1).to_string();
            comments.push(create_test_comment(
                &i.to_string(),
                Some(&parent),
                i as i64,
            ));
        }

        let forest = assemble_comment_tree(comments);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].size(), depth);
    }

    #[test]
    fn test_very_deep_chain_assembles_and_drops() {
        let depth: usize = 200_000;
        let mut comments = vec![create_test_comment("0", None, 0)];
        for i in 1..depth {
            let parent = (i - 1).to_string();
            comments.push(create_test_comment(
                &i.to_string(),
                Some(&parent),
                i as i64,
            ));
        }

        let forest = assemble_comment_tree(comments);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].size(), depth);

        drop(forest);
    }

    #[test]
    fn test_serializes_flat_fields_with_replies() {
        let forest = assemble_comment_tree(vec![
            create_test_comment("1", None, 0),
            create_test_comment("2", Some("1"), 1),
        ]);

        let value = serde_json::to_value(&forest).unwrap();

        assert_eq!(value[0]["id"], "1");
        assert_eq!(value[0]["content"], "comment 1");
        assert_eq!(value[0]["replies"][0]["id"], "2");
        assert_eq!(value[0]["replies"][0]["parent_id"], "1");
        assert!(value[0]["replies"][0]["replies"].as_array().unwrap().is_empty());
    }
}
