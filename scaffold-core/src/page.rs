//! Page arithmetic for listing queries.

use serde::{Deserialize, Serialize};

use crate::error::{ScaffoldError, ScaffoldResult};

/// A 1-indexed page of `per_page` documents.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: usize,
    pub per_page: usize,
}

impl PaginationParams {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// Rejects zero pages and zero page sizes.
    pub fn validate(&self) -> ScaffoldResult<()> {
        if self.page == 0 {
            return Err(ScaffoldError::bad_request("page must be greater than 0"));
        }
        if self.per_page == 0 {
            return Err(ScaffoldError::bad_request("limit must be greater than 0"));
        }

        Ok(())
    }

    /// Number of documents to skip: `per_page * (page - 1)`.
    ///
    /// # Errors
    ///
    /// Returns a bad request if the parameters are invalid or the product overflows.
    pub fn offset(&self) -> ScaffoldResult<usize> {
        self.validate()?;

        self.per_page
            .checked_mul(self.page - 1)
            .ok_or_else(|| ScaffoldError::bad_request("page is out of range"))
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

/// One page of results together with its position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items on this page.
    pub count: usize,
    /// The 1-indexed page number.
    pub page: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: usize) -> Self {
        Self {
            count: items.len(),
            items,
            page,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn first_page_skips_nothing() {
        assert_eq!(PaginationParams::new(1, 10).offset().unwrap(), 0);
        assert_eq!(PaginationParams::new(3, 25).offset().unwrap(), 50);
    }

    #[test]
    fn zero_values_are_rejected() {
        let page = PaginationParams::new(0, 10).offset().unwrap_err();
        let limit = PaginationParams::new(1, 0).offset().unwrap_err();

        assert_eq!(page.kind(), ErrorKind::BadRequest);
        assert_eq!(limit.message(), "limit must be greater than 0");
    }

    #[test]
    fn overflow_is_a_bad_request() {
        let err = PaginationParams::new(usize::MAX, 2).offset().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn page_counts_its_items() {
        let page = Page::new(vec!["a", "b"], 2);

        assert_eq!(page.count, 2);
        assert_eq!(page.page, 2);
        assert!(!page.is_empty());
    }
}
