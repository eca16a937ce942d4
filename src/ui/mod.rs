pub mod conversation;

use ratatui::layout::Rect;

/// Whether the terminal cell `(column, row)` lies inside `area`.
pub fn hit(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

/// A centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_bounds() {
        let area = Rect::new(2, 3, 4, 2);
        assert!(hit(area, 2, 3));
        assert!(hit(area, 5, 4));
        assert!(!hit(area, 6, 4));
        assert!(!hit(area, 2, 5));
        assert!(!hit(area, 1, 3));
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered(area, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centered(area, 40, 40), area);
    }
}
