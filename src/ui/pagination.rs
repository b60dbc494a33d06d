use crate::errors::{AppError, AppResult};
use crate::models::NotesPage;

const PAGE_RANGE: u32 = 2;
const MARGIN_PAGES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current: u32,
    total_pages: u32,
}

impl Pagination {
    /// Only exists when there is more than one page to move between.
    pub fn new(current: u32, total_pages: u32) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }
        Some(Self {
            current: current.clamp(1, total_pages),
            total_pages,
        })
    }

    pub fn for_page(page: &NotesPage, current: u32) -> Option<Self> {
        Self::new(current, page.total_pages)
    }

    pub fn select(&self, page: u32) -> AppResult<u32> {
        if page < 1 || page > self.total_pages {
            return Err(AppError::Validation(format!(
                "Page {} is out of range (1-{})",
                page, self.total_pages
            )));
        }
        Ok(page)
    }

    pub fn next(&self) -> Option<u32> {
        (self.current < self.total_pages).then_some(self.current + 1)
    }

    pub fn previous(&self) -> Option<u32> {
        (self.current > 1).then_some(self.current - 1)
    }

    /// Page numbers to show, with `None` marking an elided gap.
    pub fn visible_pages(&self) -> Vec<Option<u32>> {
        let mut pages = Vec::new();
        let mut last_shown = 0u32;
        for page in 1..=self.total_pages {
            let in_margin = page <= MARGIN_PAGES || page > self.total_pages - MARGIN_PAGES;
            let in_range = page + PAGE_RANGE >= self.current && page <= self.current + PAGE_RANGE;
            if !(in_margin || in_range) {
                continue;
            }
            if last_shown != 0 && page > last_shown + 1 {
                pages.push(None);
            }
            pages.push(Some(page));
            last_shown = page;
        }
        pages
    }

    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        parts.push(if self.previous().is_some() { "<" } else { " " }.to_string());
        for page in self.visible_pages() {
            parts.push(match page {
                Some(page) if page == self.current => format!("[{}]", page),
                Some(page) => page.to_string(),
                None => "...".to_string(),
            });
        }
        parts.push(if self.next().is_some() { ">" } else { " " }.to_string());
        parts.join(" ").trim().to_string()
    }
}
