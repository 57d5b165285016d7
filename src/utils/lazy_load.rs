//! One-shot lazy loading of deferred content
//!
//! Elements carry a deferred source that is only promoted to their active
//! source once they scroll into view. A `LazyLoader` plays the part of a
//! visibility observer: it watches the elements picked by a selector and, on
//! each viewport report, promotes and stops watching those that became
//! visible.

use std::collections::BTreeSet;
use std::ops::Range;

/// Something with a deferred source that can be promoted to its active source
pub trait LazyElement {
    /// The source waiting to be loaded, if any
    fn deferred_source(&self) -> Option<&str>;

    /// Moves the deferred source into place
    fn promote(&mut self);
}

/// A text slot whose content is loaded on first view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LazySource {
    deferred: Option<String>,
    active: Option<String>,
}

impl LazySource {
    pub fn deferred(source: impl Into<String>) -> Self {
        Self {
            deferred: Some(source.into()),
            active: None,
        }
    }

    /// The loaded content, `None` until promoted
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

impl LazyElement for LazySource {
    fn deferred_source(&self) -> Option<&str> {
        self.deferred.as_deref()
    }

    fn promote(&mut self) {
        if let Some(source) = self.deferred.take() {
            self.active = Some(source);
        }
    }
}

/// Watches element indices and promotes each one the first time it is visible
///
/// Unobserved elements are never promoted again by the same loader, even if
/// their deferred source is replaced later.
#[derive(Debug, Clone, Default)]
pub struct LazyLoader {
    observed: BTreeSet<usize>,
}

impl LazyLoader {
    /// Observes every element matching `selector`
    pub fn observe<T, S>(elements: &[T], selector: S) -> Self
    where
        S: Fn(&T) -> bool,
    {
        let observed = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| selector(element))
            .map(|(index, _)| index)
            .collect();
        Self { observed }
    }

    /// Observes every element that still has a deferred source
    pub fn observe_deferred<T: LazyElement>(elements: &[T]) -> Self {
        Self::observe(elements, |element| element.deferred_source().is_some())
    }

    /// Reports which elements are on screen, promoting the observed ones
    ///
    /// # Returns
    /// The number of elements promoted by this report
    pub fn on_viewport<T: LazyElement>(&mut self, elements: &mut [T], visible: Range<usize>) -> usize {
        let end = visible.end.min(elements.len());
        let intersecting: Vec<usize> = self
            .observed
            .range(visible.start..end.max(visible.start))
            .copied()
            .collect();

        for index in &intersecting {
            elements[*index].promote();
            self.observed.remove(index);
        }

        if !intersecting.is_empty() {
            tracing::debug!(count = intersecting.len(), "Promoted lazily loaded elements");
        }
        intersecting.len()
    }

    pub fn is_observing(&self, index: usize) -> bool {
        self.observed.contains(&index)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }
}
