use crate::types::{Task, TaskFilters};

pub const DEFAULT_PAGE_SIZE: usize = 6;

pub fn matches(task: &Task, filters: &TaskFilters) -> bool {
    let search = filters.search.to_lowercase();
    filters.status.matches(&task.status)
        && filters.priority.matches(&task.priority)
        && (search.is_empty() || task.title.to_lowercase().contains(&search))
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &TaskFilters) -> Vec<&'a Task> {
    tasks.iter().filter(|task| matches(task, filters)).collect()
}

/// One-based page slice. Page 0 is treated as page 1; pages past the end are
/// empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// The visible page of a filtered list with its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<'a> {
    pub items: Vec<&'a Task>,
    pub page: usize,
    pub total_pages: usize,
    pub matching: usize,
    pub total: usize,
}

impl<'a> ListView<'a> {
    pub fn build(tasks: &'a [Task], filters: &TaskFilters, page: usize, page_size: usize) -> Self {
        let filtered = filter_tasks(tasks, filters);
        let items = paginate(&filtered, page, page_size).to_vec();
        Self {
            items,
            page: page.max(1),
            total_pages: total_pages(filtered.len(), page_size),
            matching: filtered.len(),
            total: tasks.len(),
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("Showing {} of {} tasks", self.items.len(), self.matching);
        if self.matching != self.total {
            summary.push_str(&format!(" ({} total)", self.total));
        }
        if self.total_pages > 1 {
            summary.push_str(&format!(" | page {}/{}", self.page, self.total_pages));
        }
        summary
    }
}
