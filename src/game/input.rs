use super::grid::Dir;

pub fn parse_direction(value: Dir) -> Option<Dir> {
    if value.x.abs() > 1 || value.y.abs() > 1 {
        return None;
    }
    // Exactly one axis may be non-zero; (0,0) and diagonals are ignored.
    if (value.x == 0) == (value.y == 0) {
        return None;
    }
    Some(value)
}
