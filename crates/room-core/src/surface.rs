//! Render surface seam
//!
//! A render surface is the caller-owned container that track elements are
//! mounted into. Only element nodes can hold children; text nodes, documents
//! and fragments are rejected by the bootstrapper up front.

use crate::types::{ElementId, MediaElement};

/// Kind of DOM node backing a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Element,
    Text,
    Document,
    Fragment,
}

/// Container that rendering elements are appended to and removed from
pub trait RenderSurface: Send + Sync {
    fn kind(&self) -> SurfaceKind;

    /// Append an element as the last child
    fn append_child(&self, element: MediaElement);

    /// Remove a child, returning false when the element is not parented here
    fn remove_child(&self, id: ElementId) -> bool;

    fn contains(&self, id: ElementId) -> bool;

    fn child_count(&self) -> usize;
}
