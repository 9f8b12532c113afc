//! Property accessor binding.
//!
//! The parser records accessor names (`READ text WRITE setText`) before the
//! functions they name have necessarily been created. The worklist is
//! drained once all functions of the tree exist.

use smol_str::SmolStr;

use super::Tree;
use crate::base::NodeId;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{DatabaseError, Result};
use crate::node::{FunctionRole, NodeKind};

impl Tree {
    /// Queue `function_name` as the `role` accessor of `property`.
    pub fn add_property_accessor(
        &mut self,
        property: NodeId,
        role: FunctionRole,
        function_name: &str,
    ) -> Result<()> {
        match self.node(property).map(|n| n.kind()) {
            Some(NodeKind::Property) => {}
            Some(kind) => {
                return Err(DatabaseError::invariant(
                    self.module(),
                    format!("accessor '{function_name}' recorded on a {kind} node"),
                ));
            }
            None => {
                return Err(DatabaseError::UnknownNode {
                    module: SmolStr::new(self.module()),
                    node: property,
                });
            }
        }
        let entries = self.pending_accessors.entry(property).or_default();
        let entry = (role, SmolStr::new(function_name));
        if !entries.contains(&entry) {
            entries.push(entry);
        }
        Ok(())
    }

    pub fn pending_accessor_count(&self) -> usize {
        self.pending_accessors.values().map(Vec::len).sum()
    }

    /// Drain the accessor worklist.
    ///
    /// A sibling function with the accessor's name binds if its access and
    /// status match the property's, or if it is undocumented. The binding is
    /// recorded in both directions. Misses come back as
    /// `UnresolvedAccessor` diagnostics.
    pub fn resolve_properties(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let pending = std::mem::take(&mut self.pending_accessors);

        for (property, entries) in pending {
            let Some(owner) = self.get(property).parent() else {
                continue;
            };
            for (role, function_name) in entries {
                match self.find_accessor(owner, property, &function_name) {
                    Some(function) => self.bind_accessor(property, role, function),
                    None => {
                        let node = self.get(property);
                        diagnostics.push(
                            Diagnostic::warning(
                                DiagnosticKind::UnresolvedAccessor,
                                self.module(),
                                node.location().clone(),
                                format!(
                                    "{} function '{}' of property '{}' not found",
                                    role.as_str(),
                                    function_name,
                                    self.full_name(property)
                                ),
                            )
                            .with_node(self.node_ref(property)),
                        );
                    }
                }
            }
        }
        diagnostics
    }

    fn find_accessor(&self, owner: NodeId, property: NodeId, name: &str) -> Option<NodeId> {
        let prop = self.get(property);
        self.get(owner)
            .children()
            .find(name)
            .iter()
            .copied()
            .find(|&id| {
                let f = self.get(id);
                f.is_function()
                    && ((f.access() == prop.access() && f.status() == prop.status())
                        || !f.has_doc())
            })
    }

    fn bind_accessor(&mut self, property: NodeId, role: FunctionRole, function: NodeId) {
        tracing::trace!(
            "[PROPERTY] {}: {} {} -> {:?}",
            self.module(),
            self.full_name(property),
            role.as_str(),
            function
        );
        if let Some(data) = self.get_mut(property).payload_mut().as_property_mut() {
            if !data.accessors.contains(&(role, function)) {
                data.accessors.push((role, function));
            }
        }
        if let Some(data) = self.get_mut(function).payload_mut().as_function_mut() {
            data.associated_property = Some((property, role));
        }
    }
}
