use serde::{Deserialize, Serialize};

/// Offset-based page envelope returned by the paginated fetches.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<(String, i64)>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }
        let remainder = total_rows % page_size;
        // When the total is an exact multiple, the last page starts one full
        // page before the end, not at the end itself.
        let last_offset = if remainder == 0 {
            (total_rows - page_size).max(0)
        } else {
            total_rows - remainder
        };
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);

        let page_count = ((total_rows as f64) / (page_size as f64)).ceil() as usize;
        let current_page = (current_offset / page_size) as usize;

        let page_list = (0..page_count)
            .map(|n| {
                let page = if n == current_page {
                    String::from("...")
                } else {
                    format!("{}", n + 1)
                };

                (page, (n as i64) * page_size)
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![(String::from("1"), 0)],
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_many() {
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5, 6], 13, 6, 0);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.next_offset, 6);
        assert_eq!(page.page_list.len(), 3);
        assert_eq!(page.page_list[0].0, "...");
    }

    #[test]
    fn empty_input_yields_the_empty_envelope() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 6, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_list, vec![(String::from("1"), 0)]);
    }

    #[test]
    fn last_page_does_not_advance() {
        let page = PageContext::from_rows(vec![1], 13, 6, 12);
        assert_eq!(page.next_offset, 12);
        assert_eq!(page.prev_offset, 6);
    }

    #[test]
    fn exact_multiple_total_stops_at_the_real_last_page() {
        // 12 rows at page size 6: pages start at 0 and 6, nothing at 12.
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5, 6], 12, 6, 0);
        assert_eq!(page.next_offset, 6);

        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5, 6], 12, 6, 6);
        assert_eq!(page.next_offset, 6);
        assert_eq!(page.prev_offset, 0);
    }

    #[test]
    fn single_full_page_never_advances() {
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5, 6], 6, 6, 0);
        assert_eq!(page.next_offset, 0);
    }
}
