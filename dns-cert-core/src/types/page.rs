//! 分页结果

use serde::{Deserialize, Serialize};

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
}

impl<T> Page<T> {
    /// 从完整列表中截取一页，`page` 从 1 开始，0 视为 1
    pub fn slice(all: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let total = all.len();
        let size = page_size as usize;
        let skip = (page as usize - 1).saturating_mul(size);
        let items = all.into_iter().skip(skip).take(size).collect();
        Self {
            items,
            page,
            page_size,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_requested_page() {
        let page = Page::slice((1..=5).collect::<Vec<_>>(), 2, 2);
        assert_eq!(page.items, vec![3, 4]);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn page_past_end_is_empty() {
        let page = Page::slice(vec![1, 2], 3, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn page_zero_is_first_page() {
        assert_eq!(Page::slice(vec![1, 2, 3], 0, 2).items, vec![1, 2]);
    }
}
