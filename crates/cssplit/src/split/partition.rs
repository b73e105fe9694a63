//! The partitioning walk.
//!
//! Each cycle walks the remaining tree in document order, charging selectors
//! to a [`Budget`]. When the next rule or unbreakable region does not fit, the
//! cycle's range is extracted into a fragment and the walk starts over on the
//! shrunken tree. Cycles repeat until a walk reaches the end of the tree.

use cssplit_core::logging::{DisplayTree, targets};
use cssplit_core::{Node, NodeId, SyntaxTree};

use super::budget::Budget;
use super::classify::{Region, region, rules_within};
use super::extract::extract;
use super::rule::split_rule;
use crate::error::{ConfigError, Error, Result};

/// Splits a tree into fragments of at most `max_selectors` selectors.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    max_selectors: usize,
}

/// State of the cycle in progress.
#[derive(Debug)]
struct Cycle {
    budget: Budget,
    /// First qualifying node of the cycle.
    start: Option<NodeId>,
    /// Last node known to belong to the cycle.
    trailing: Option<NodeId>,
}

impl Cycle {
    fn new(max_selectors: usize) -> Self {
        Self {
            budget: Budget::new(max_selectors),
            start: None,
            trailing: None,
        }
    }

    fn boundary(&self) -> Result<(NodeId, NodeId)> {
        match (self.start, self.trailing) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(Error::contract("cut requested before anything was counted")),
        }
    }
}

/// Outcome of one walk over the tree.
enum Walk {
    /// Extract `start..=end` and walk again.
    Cut { start: NodeId, end: NodeId },
    /// The walk reached the end: everything left is the remainder.
    Finished,
}

impl Partitioner {
    /// Create a partitioner.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMaxSelectors`] if `max_selectors` is 0.
    pub fn new(max_selectors: usize) -> Result<Self> {
        if max_selectors == 0 {
            return Err(ConfigError::InvalidMaxSelectors(max_selectors).into());
        }
        Ok(Self { max_selectors })
    }

    /// The selector budget per fragment.
    pub fn max_selectors(&self) -> usize {
        self.max_selectors
    }

    /// Cut fragments out of `tree` until the rest fits the budget.
    ///
    /// Returns the fragments in extraction order; `tree` keeps the remainder.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySelectorList`] if any rule has no selectors (checked before
    /// the tree is touched). [`Error::Contract`] on internal inconsistencies.
    pub fn partition(&self, tree: &mut SyntaxTree) -> Result<Vec<SyntaxTree>> {
        validate(tree)?;

        let mut fragments = Vec::new();
        loop {
            match self.walk(tree)? {
                Walk::Cut { start, end } => {
                    let fragment = extract(tree, start, end)?;
                    tracing::debug!(
                        target: targets::SPLIT,
                        fragment = fragments.len(),
                        selectors = fragment.selector_count(),
                        "cut fragment"
                    );
                    tracing::trace!(target: targets::SPLIT, "remaining:\n{}", DisplayTree(tree));
                    fragments.push(fragment);
                }
                Walk::Finished => break,
            }
        }

        Ok(fragments)
    }

    /// Walk the tree from the top until the budget overflows.
    fn walk(&self, tree: &mut SyntaxTree) -> Result<Walk> {
        let mut cycle = Cycle::new(self.max_selectors);
        let mut stack: Vec<NodeId> = tree.children(tree.root())?.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            match tree.get(id)? {
                Node::Rule(rule) => {
                    let count = rule.selector_count();
                    if cycle.budget.fits(count) {
                        cycle.budget.charge(count);
                        cycle.start.get_or_insert(id);
                        cycle.trailing = Some(id);
                        continue;
                    }

                    let keep = cycle.budget.remaining();
                    if keep > 0 {
                        split_rule(tree, id, keep)?;
                        cycle.start.get_or_insert(id);
                        cycle.trailing = Some(id);
                        tracing::trace!(target: targets::SPLIT, keep, count, "split rule");
                    }
                    let (start, end) = cycle.boundary()?;
                    return Ok(Walk::Cut { start, end });
                }

                Node::Block(block) => match region(block.kind) {
                    Region::Unbreakable => {
                        let rules = rules_within(tree, id)?;
                        let (Some(&first), Some(last)) =
                            (rules.first(), tree.descendants(id)?.last().copied())
                        else {
                            continue;
                        };

                        if !cycle.budget.fits(1) {
                            let (start, end) = cycle.boundary()?;
                            return Ok(Walk::Cut { start, end });
                        }
                        cycle.budget.charge(1);
                        cycle.start.get_or_insert(first);
                        cycle.trailing = Some(last);
                    }
                    Region::PropertyBag | Region::Nested => {
                        stack.extend(tree.children(id)?.iter().rev().copied());
                    }
                },

                Node::Declaration(_) => {
                    cycle.start.get_or_insert(id);
                }

                Node::Root | Node::Directive(_) => {}
            }
        }

        Ok(Walk::Finished)
    }
}

/// Reject rules without selectors.
pub fn validate(tree: &SyntaxTree) -> Result<()> {
    for (id, rule) in tree.rules() {
        if rule.selectors.is_empty() {
            return Err(Error::EmptySelectorList {
                position: tree.source(id)?,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssplit_core::{AtBlock, StyleRule};

    #[test]
    fn zero_budget_rejected() {
        assert!(matches!(
            Partitioner::new(0),
            Err(Error::Config(ConfigError::InvalidMaxSelectors(0)))
        ));
    }

    #[test]
    fn empty_selector_list_rejected() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        tree.append(root, Node::Rule(StyleRule::new(["a"]))).unwrap();
        tree.append(root, Node::Rule(StyleRule::new(Vec::<String>::new())))
            .unwrap();

        let result = Partitioner::new(1).unwrap().partition(&mut tree);
        assert!(matches!(result, Err(Error::EmptySelectorList { .. })));
        assert_eq!(tree.selector_count(), 1);
    }

    #[test]
    fn fitting_tree_is_untouched() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        tree.append(root, Node::Rule(StyleRule::new(["a", "b"]))).unwrap();
        let media = tree
            .append(root, Node::Block(AtBlock::new("media", "print")))
            .unwrap();
        tree.append(media, Node::Rule(StyleRule::new(["c"]))).unwrap();

        let fragments = Partitioner::new(3).unwrap().partition(&mut tree).unwrap();
        assert!(fragments.is_empty());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn oversized_rule_is_split_repeatedly() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        tree.append(root, Node::Rule(StyleRule::new(["a", "b", "c", "d", "e"])))
            .unwrap();

        let fragments = Partitioner::new(2).unwrap().partition(&mut tree).unwrap();

        let selectors: Vec<Vec<String>> = fragments
            .iter()
            .map(|fragment| fragment.rules()[0].1.selectors.clone())
            .collect();
        assert_eq!(selectors, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(tree.rules()[0].1.selectors, vec!["e"]);
    }
}
