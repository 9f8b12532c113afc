use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Kind of a named anchor inside a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Explicit `\target`.
    Target,
    Keyword,
    /// Table-of-contents heading.
    Contents,
    Class,
    Function,
    Page,
    Subtitle,
}

impl TargetKind {
    /// Priority used when the caller does not give one. Lower wins.
    pub fn default_priority(&self) -> i32 {
        match self {
            TargetKind::Target => 0,
            TargetKind::Keyword => 1,
            TargetKind::Class | TargetKind::Function | TargetKind::Page => 2,
            TargetKind::Contents => 3,
            TargetKind::Subtitle => 4,
        }
    }

    /// Tie-break rank among records of equal priority. Lower wins:
    /// Class > Function > Page > Keyword > Target > Contents > Subtitle.
    pub fn precedence(&self) -> u8 {
        match self {
            TargetKind::Class => 0,
            TargetKind::Function => 1,
            TargetKind::Page => 2,
            TargetKind::Keyword => 3,
            TargetKind::Target => 4,
            TargetKind::Contents => 5,
            TargetKind::Subtitle => 6,
        }
    }
}

/// A target recorded on a node by the parser, registered into the tree's
/// target index by `resolve_targets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub kind: TargetKind,
    pub name: SmolStr,
    pub reference: SmolStr,
}
