pub mod location;
pub mod project_outlook;
pub mod rbac;
pub mod record;
pub mod user;

use serde::Deserialize;
use utoipa::IntoParams;

/// Fixed page size of every paginated listing.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * PAGE_SIZE
    }
}
