//! Node data model.
//!
//! A [`Node`] is one documented symbol. Variants form a closed tagged union
//! ([`NodePayload`]) whose discriminant is [`NodeKind`]. Inner nodes own a
//! [`ChildMap`]; nodes live in their tree's arena and refer to their parent
//! by [`NodeId`](crate::base::NodeId).

mod anchor;
mod children;
mod kind;
mod payload;
mod symbol;

pub use anchor::{Anchor, TargetKind};
pub use children::ChildMap;
pub use kind::{Access, FunctionRole, Genus, NodeKind, Status, Virtualness};
pub use payload::{
    ClassData, CollectionData, CollisionData, DerivedClass, FunctionData, NodePayload, PageData,
    Parameter, PropertyData, QmlTypeData, RelatedClass,
};
pub use symbol::{Node, NodeMeta};
