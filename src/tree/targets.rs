//! Link targets and the title index.

use smol_str::SmolStr;

use super::Tree;
use crate::base::{NodeId, canonical_title};
use crate::node::{NodeKind, NodePayload, TargetKind};

/// One named anchor in a tree's target index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRec {
    pub node: NodeId,
    /// Fragment inside the node's page; empty for the page itself.
    pub reference: SmolStr,
    /// Lower wins.
    pub priority: i32,
    pub kind: TargetKind,
}

impl TargetRec {
    pub fn new(node: NodeId, kind: TargetKind, reference: impl Into<SmolStr>) -> Self {
        Self {
            node,
            reference: reference.into(),
            priority: kind.default_priority(),
            kind,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn rank(&self) -> (i32, u8) {
        (self.priority, self.kind.precedence())
    }
}

/// Result of [`Tree::find_unambiguous_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatch {
    pub node: NodeId,
    pub reference: SmolStr,
    /// Other nodes registered under the same name at the winner's priority.
    pub ambiguous: Vec<NodeId>,
}

impl TargetMatch {
    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous.is_empty()
    }
}

impl Tree {
    /// Add a record under the canonical form of `name`. Re-inserting an
    /// identical record is a no-op.
    pub fn insert_target(&mut self, name: &str, rec: TargetRec) {
        let key = SmolStr::new(canonical_title(name));
        if key.is_empty() {
            return;
        }
        let recs = self.targets.entry(key).or_default();
        if !recs.contains(&rec) {
            recs.push(rec);
        }
    }

    pub fn targets_named(&self, name: &str) -> &[TargetRec] {
        self.targets
            .get(canonical_title(name).as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Register classes, functions, pages, recorded anchors and subtitles
    /// of the subtree at `root`. Safe to repeat.
    pub fn resolve_targets(&mut self, root: NodeId) {
        let mut count = 0usize;
        for id in self.preorder(root) {
            let node = self.get(id);
            let mut pending: Vec<(SmolStr, TargetRec)> = Vec::new();
            let mut title = None;

            match node.payload() {
                NodePayload::Class(_) => {
                    pending.push((node.name().into(), TargetRec::new(id, TargetKind::Class, "")));
                }
                NodePayload::Function(_) => {
                    pending.push((node.name().into(), TargetRec::new(id, TargetKind::Function, "")));
                }
                NodePayload::Page(page) | NodePayload::Document(page) => {
                    pending.push((page.title.clone(), TargetRec::new(id, TargetKind::Page, "")));
                    if let Some(subtitle) = &page.subtitle {
                        pending.push((
                            subtitle.clone(),
                            TargetRec::new(id, TargetKind::Subtitle, canonical_title(subtitle)),
                        ));
                    }
                    title = Some(page.title.clone());
                }
                _ => {}
            }
            for anchor in node.anchors() {
                pending.push((
                    anchor.name.clone(),
                    TargetRec::new(id, anchor.kind, anchor.reference.clone()),
                ));
            }

            count += pending.len();
            for (name, rec) in pending {
                self.insert_target(&name, rec);
            }
            if let Some(title) = title {
                self.insert_title(&title, id);
            }
        }
        tracing::debug!(
            "[TARGETS] {}: registered {} targets from {:?}",
            self.module(),
            count,
            root
        );
    }

    fn insert_title(&mut self, title: &str, id: NodeId) {
        let key = SmolStr::new(canonical_title(title));
        let name = SmolStr::new(self.get(id).name());
        let existing: Vec<NodeId> = self.titles.get(&key).cloned().unwrap_or_default();
        if existing.iter().any(|&n| n == id || self.get(n).name() == name) {
            return;
        }
        self.titles.entry(key).or_default().push(id);
    }

    /// The anchor reference `target` has on `node`, if `node` registered it.
    pub fn find_target(&self, target: &str, node: NodeId) -> Option<&str> {
        self.targets_named(target)
            .iter()
            .find(|rec| rec.node == node)
            .map(|rec| rec.reference.as_str())
    }

    /// Best record for `target`: lowest priority, then kind precedence, then
    /// insertion order.
    ///
    /// Every other distinct node at the winning priority is reported in
    /// [`TargetMatch::ambiguous`], best ranked first. Among records tied on
    /// kind as well, a node from `qml_module` wins over the first inserted.
    pub fn find_unambiguous_target(
        &self,
        target: &str,
        qml_module: Option<&str>,
    ) -> Option<TargetMatch> {
        let recs = self.targets_named(target);
        let best = recs.iter().map(TargetRec::rank).min()?;

        let mut same_priority: Vec<&TargetRec> =
            recs.iter().filter(|r| r.priority == best.0).collect();
        same_priority.sort_by_key(|r| r.rank());
        let mut tied: Vec<&TargetRec> = Vec::new();
        for rec in same_priority {
            if !tied.iter().any(|t| t.node == rec.node) {
                tied.push(rec);
            }
        }

        let winner = qml_module
            .and_then(|qmid| {
                tied.iter()
                    .take_while(|rec| rec.rank() == best)
                    .find(|rec| self.get(rec.node).qml_module() == Some(qmid))
                    .copied()
            })
            .unwrap_or(tied[0]);

        Some(TargetMatch {
            node: winner.node,
            reference: winner.reference.clone(),
            ambiguous: tied
                .iter()
                .filter(|rec| rec.node != winner.node)
                .map(|rec| rec.node)
                .collect(),
        })
    }

    /// Page or document titled `title`. With several, one from `qml_module`
    /// is preferred.
    pub fn find_doc_node_by_title(&self, title: &str, qml_module: Option<&str>) -> Option<NodeId> {
        let nodes = self.titles.get(canonical_title(title).as_str())?;
        qml_module
            .and_then(|qmid| {
                nodes
                    .iter()
                    .copied()
                    .find(|&id| self.get(id).qml_module() == Some(qmid))
            })
            .or_else(|| nodes.first().copied())
    }

    /// Page-producing doc node whose name is `name` (e.g. `"overview.html"`).
    pub fn find_document_by_name(&self, name: &str) -> Option<NodeId> {
        self.get(NodeId::ROOT)
            .children()
            .find(name)
            .iter()
            .copied()
            .find(|&id| matches!(self.get(id).kind(), NodeKind::Page | NodeKind::Document))
    }
}
