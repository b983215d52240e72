use crate::consts::consts::{DEFAULT_LIMIT, DEFAULT_PAGE};

/// Offset/limit window over the guest list, `page` is 1-based
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    /// Anything absent, non-numeric or below 1 falls back to the default
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Half-open `[start, end)` range, each end clamped to `len`
    pub fn window(&self, len: usize) -> (usize, usize) {
        let start = self.offset();
        let end = start.saturating_add(self.limit);

        (start.min(len), end.min(len))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v >= 1)
}
