//! Pagination calculator and navigation controls
//!
//! `Pagination::compute` derives a descriptor from the item count, page size
//! and requested page. `PaginationControls` turns a descriptor into a
//! Previous / page numbers / Next bar with a "Showing X-Y of Z items" caption.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Maximum number of numbered page links shown at once
pub const MAX_PAGE_LINKS: i64 = 5;

/// Page size used when the caller does not pick one
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Derived pagination state for one page of a list
///
/// `current_page` is taken as given and not clamped to `1..=total_pages`, so
/// the indices are signed and may fall outside `0..total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: usize,
    pub items_per_page: usize,
    pub current_page: i64,
    pub total_pages: i64,
    pub start_index: i64,
    pub end_index: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Computes the descriptor for `current_page` (1-based)
    pub fn compute(total_items: usize, items_per_page: usize, current_page: i64) -> Self {
        let total = total_items as i64;
        let per_page = items_per_page as i64;

        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        let start_index = (current_page - 1) * per_page;
        let end_index = (start_index + per_page).min(total);

        Self {
            total_items,
            items_per_page,
            current_page,
            total_pages,
            start_index,
            end_index,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }

    /// Range of item indices on this page, clipped to the list bounds
    pub fn item_range(&self) -> std::ops::Range<usize> {
        let start = self.start_index.clamp(0, self.total_items as i64) as usize;
        let end = self.end_index.clamp(0, self.total_items as i64) as usize;
        start..end.max(start)
    }
}

/// A target within the pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    Previous,
    Page(i64),
    Next,
}

/// One rendered link of the pagination bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub target: PageTarget,
    pub label: String,
    pub active: bool,
    pub disabled: bool,
}

/// Navigation bar built from a `Pagination` descriptor
///
/// The bar holds no page state of its own. `activate` reports the page a link
/// points at and leaves it to the caller to recompute the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControls {
    pagination: Pagination,
    links: Vec<PageLink>,
    caption: String,
}

impl PaginationControls {
    pub fn new(pagination: &Pagination) -> Self {
        let mut links = Vec::new();

        links.push(PageLink {
            target: PageTarget::Previous,
            label: "Previous".to_string(),
            active: false,
            disabled: !pagination.has_prev,
        });

        let (first, last) = page_window(pagination.current_page, pagination.total_pages);
        for page in first..=last {
            links.push(PageLink {
                target: PageTarget::Page(page),
                label: page.to_string(),
                active: page == pagination.current_page,
                disabled: false,
            });
        }

        links.push(PageLink {
            target: PageTarget::Next,
            label: "Next".to_string(),
            active: false,
            disabled: !pagination.has_next,
        });

        let caption = format!(
            "Showing {}-{} of {} items",
            pagination.start_index + 1,
            pagination.end_index,
            pagination.total_items
        );

        Self {
            pagination: *pagination,
            links,
            caption,
        }
    }

    pub fn links(&self) -> &[PageLink] {
        &self.links
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Resolves a link to the page it navigates to, or `None` if it is inert
    pub fn resolve(&self, target: PageTarget) -> Option<i64> {
        match target {
            PageTarget::Previous if self.pagination.has_prev => {
                Some(self.pagination.current_page - 1)
            }
            PageTarget::Next if self.pagination.has_next => Some(self.pagination.current_page + 1),
            PageTarget::Page(page) => self
                .links
                .iter()
                .any(|link| link.target == PageTarget::Page(page))
                .then_some(page),
            _ => None,
        }
    }

    /// Activates a link, calling `on_page_change` with its page unless it is disabled
    ///
    /// # Returns
    /// `true` if `on_page_change` was called
    pub fn activate<F>(&self, target: PageTarget, on_page_change: F) -> bool
    where
        F: FnOnce(i64),
    {
        match self.resolve(target) {
            Some(page) => {
                on_page_change(page);
                true
            }
            None => false,
        }
    }

    fn link_line(&self) -> Line<'static> {
        let mut spans = Vec::with_capacity(self.links.len() * 2);
        for (i, link) in self.links.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            let style = if link.disabled {
                Style::default().fg(Color::DarkGray)
            } else if link.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let label = match link.target {
                PageTarget::Page(_) => format!(" {} ", link.label),
                _ => link.label.clone(),
            };
            spans.push(Span::styled(label, style));
        }
        Line::from(spans)
    }
}

impl Widget for &PaginationControls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            self.link_line(),
            Line::from(Span::styled(
                self.caption.clone(),
                Style::default().fg(Color::Gray),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// First and last numbered page shown around `current`
///
/// The window is centred on `current` and shifted left when it would run
/// past `total_pages`.
fn page_window(current: i64, total_pages: i64) -> (i64, i64) {
    let mut first = (current - MAX_PAGE_LINKS / 2).max(1);
    let last = (first + MAX_PAGE_LINKS - 1).min(total_pages);
    if last - first < MAX_PAGE_LINKS - 1 {
        first = (last - MAX_PAGE_LINKS + 1).max(1);
    }
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn page_numbers(controls: &PaginationControls) -> Vec<i64> {
        controls
            .links()
            .iter()
            .filter_map(|link| match link.target {
                PageTarget::Page(page) => Some(page),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_compute_middle_page() {
        let p = Pagination::compute(95, 10, 3);
        assert_eq!(p.total_pages, 10);
        assert_eq!(p.start_index, 20);
        assert_eq!(p.end_index, 30);
        assert!(p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_compute_last_partial_page() {
        let p = Pagination::compute(95, 10, 10);
        assert_eq!(p.start_index, 90);
        assert_eq!(p.end_index, 95);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_compute_first_page() {
        let p = Pagination::compute(5, 10, 1);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.start_index, 0);
        assert_eq!(p.end_index, 5);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_compute_empty_list() {
        let p = Pagination::compute(0, 10, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.end_index, 0);
        assert!(!p.has_next);
        assert_eq!(p.item_range(), 0..0);
    }

    #[test]
    fn test_compute_does_not_clamp_out_of_range_pages() {
        let below = Pagination::compute(30, 10, 0);
        assert_eq!(below.start_index, -10);
        assert_eq!(below.end_index, 0);
        assert!(!below.has_prev);
        assert!(below.has_next);

        let above = Pagination::compute(30, 10, 7);
        assert_eq!(above.start_index, 60);
        assert_eq!(above.end_index, 30);
        assert!(!above.has_next);
        assert_eq!(above.item_range(), 30..30);
    }

    #[test]
    fn test_compute_zero_page_size() {
        let p = Pagination::compute(10, 0, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.start_index, 0);
        assert_eq!(p.end_index, 0);
    }

    #[test]
    fn test_compute_properties_hold_across_inputs() {
        for total in [0usize, 1, 9, 10, 11, 95, 100] {
            for per_page in [1usize, 3, 10, 25] {
                for page in -1..=12 {
                    let p = Pagination::compute(total, per_page, page);
                    let expected_pages = (total as f64 / per_page as f64).ceil() as i64;
                    assert_eq!(p.total_pages, expected_pages);
                    assert_eq!(p.has_next, page < expected_pages);
                    assert_eq!(p.has_prev, page > 1);
                    assert!(p.end_index - p.start_index <= per_page as i64);
                }
            }
        }
    }

    #[test]
    fn test_controls_window_centred_on_current_page() {
        let controls = PaginationControls::new(&Pagination::compute(95, 10, 5));
        assert_eq!(page_numbers(&controls), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_controls_window_shifts_at_end() {
        let controls = PaginationControls::new(&Pagination::compute(95, 10, 10));
        assert_eq!(page_numbers(&controls), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_controls_window_with_few_pages() {
        let controls = PaginationControls::new(&Pagination::compute(25, 10, 1));
        assert_eq!(page_numbers(&controls), vec![1, 2, 3]);
    }

    #[test]
    fn test_controls_disable_prev_and_next_at_bounds() {
        let controls = PaginationControls::new(&Pagination::compute(10, 10, 1));
        let links = controls.links();
        assert!(links.first().unwrap().disabled);
        assert!(links.last().unwrap().disabled);
        assert!(links.iter().any(|l| l.active && l.target == PageTarget::Page(1)));
    }

    #[test]
    fn test_controls_caption() {
        let controls = PaginationControls::new(&Pagination::compute(95, 10, 3));
        assert_eq!(controls.caption(), "Showing 21-30 of 95 items");
    }

    #[test]
    fn test_activate_calls_back_with_target_page() {
        let controls = PaginationControls::new(&Pagination::compute(95, 10, 3));

        let mut seen = Vec::new();
        assert!(controls.activate(PageTarget::Next, |page| seen.push(page)));
        assert!(controls.activate(PageTarget::Previous, |page| seen.push(page)));
        assert!(controls.activate(PageTarget::Page(5), |page| seen.push(page)));

        assert_eq!(seen, vec![4, 2, 5]);
    }

    #[test]
    fn test_activate_disabled_link_is_inert() {
        let controls = PaginationControls::new(&Pagination::compute(30, 10, 1));
        let mut called = false;

        assert!(!controls.activate(PageTarget::Previous, |_| called = true));
        assert!(!controls.activate(PageTarget::Page(9), |_| called = true));
        assert!(!called);
    }

    #[test]
    fn test_controls_render() {
        let controls = PaginationControls::new(&Pagination::compute(95, 10, 3));
        let mut terminal = Terminal::new(TestBackend::new(60, 2)).unwrap();

        terminal
            .draw(|frame| frame.render_widget(&controls, frame.area()))
            .unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(content.contains("Previous"));
        assert!(content.contains("Next"));
        assert!(content.contains("Showing 21-30 of 95 items"));
    }
}
