use ratatui::layout::{Position, Rect};

use crate::board::DropTarget;
use crate::types::TaskStatus;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Hit {
    Column(TaskStatus),
    Task { task_id: String, status: TaskStatus },
    DismissError,
}

impl Hit {
    pub fn drop_target(&self) -> Option<DropTarget> {
        match self {
            Hit::Column(status) => Some(DropTarget::Column(*status)),
            Hit::Task { task_id, .. } => Some(DropTarget::Task(task_id.clone())),
            Hit::DismissError => None,
        }
    }
}

/// Stacking order of hit regions; later variants sit on top.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum InteractionLayer {
    Column,
    Card,
    Banner,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Region {
    layer: InteractionLayer,
    area: Rect,
    hit: Hit,
}

/// Screen regions registered during the last draw, used to map pointer
/// positions back to cards and columns.
#[derive(Debug, Default, Clone)]
pub struct InteractionMap {
    regions: Vec<Region>,
}

impl InteractionMap {
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn register(&mut self, layer: InteractionLayer, area: Rect, hit: Hit) {
        self.regions.push(Region { layer, area, hit });
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Highest layer wins; within a layer the latest registration wins.
    pub fn resolve(&self, col: u16, row: u16) -> Option<&Hit> {
        let point = Position::new(col, row);
        self.regions
            .iter()
            .filter(|region| region.area.contains(point))
            .max_by_key(|region| region.layer)
            .map(|region| &region.hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_beats_the_column_under_it() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(10, 10, 5, 2);

        map.register(
            InteractionLayer::Card,
            rect,
            Hit::Task {
                task_id: "1".to_string(),
                status: TaskStatus::Pending,
            },
        );
        map.register(
            InteractionLayer::Column,
            rect,
            Hit::Column(TaskStatus::Pending),
        );

        assert_eq!(
            map.resolve(11, 10).and_then(Hit::drop_target),
            Some(DropTarget::Task("1".to_string()))
        );
    }

    #[test]
    fn later_region_wins_within_a_layer() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(4, 4, 4, 1);

        map.register(InteractionLayer::Column, rect, Hit::Column(TaskStatus::Pending));
        map.register(
            InteractionLayer::Column,
            rect,
            Hit::Column(TaskStatus::Completed),
        );

        assert_eq!(
            map.resolve(5, 4),
            Some(&Hit::Column(TaskStatus::Completed))
        );
    }

    #[test]
    fn resolve_misses_outside_every_region() {
        let mut map = InteractionMap::default();
        map.register(
            InteractionLayer::Banner,
            Rect::new(0, 0, 10, 1),
            Hit::DismissError,
        );

        assert_eq!(map.resolve(10, 0), None);
        assert_eq!(map.resolve(3, 0), Some(&Hit::DismissError));
        assert_eq!(Hit::DismissError.drop_target(), None);
    }
}
