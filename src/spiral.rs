//! Acquisition order of the 5x5 field grid.

/// Tiles per grid side.
pub const GRID_SIDE: usize = 5;

/// Fields acquired per well.
pub const FIELDS_PER_WELL: usize = GRID_SIDE * GRID_SIDE;

/// Field index acquired at each (row, col) of the grid, row-major.
///
/// Acquisition starts at the centre (0) and winds clockwise outwards: 1 to the
/// right of the centre, 2 below it, and so on until the outer ring finishes
/// along the top row, 20 at the top-left corner to 24 at the top-right.
///
/// Note that the top-right cell is 24, not 20: the outer ring is laid out as
/// the instrument acquires it, and 20 is the top-left corner.
pub const SPIRAL_INDEX_MAP: [[usize; GRID_SIDE]; GRID_SIDE] = [
    [20, 21, 22, 23, 24],
    [19, 6, 7, 8, 9],
    [18, 5, 0, 1, 10],
    [17, 4, 3, 2, 11],
    [16, 15, 14, 13, 12],
];

/// Field index acquired at grid position (row, col).
pub fn field_at(row: usize, col: usize) -> usize {
    SPIRAL_INDEX_MAP[row][col]
}

/// Grid position of a field index.
pub fn position_of(field: usize) -> Option<(usize, usize)> {
    SPIRAL_INDEX_MAP.iter().enumerate().find_map(|(row, cols)| {
        cols.iter()
            .position(|&f| f == field)
            .map(|col| (row, col))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_is_a_permutation_of_all_fields() {
        let mut seen = [false; FIELDS_PER_WELL];
        for row in SPIRAL_INDEX_MAP.iter() {
            for &field in row.iter() {
                assert!(!seen[field], "field {} appears twice", field);
                seen[field] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn centre_and_corner() {
        assert_eq!(field_at(2, 2), 0);
        assert_eq!(field_at(0, GRID_SIDE - 1), 24);
        assert_eq!(field_at(0, 0), 20);
        assert_eq!(field_at(GRID_SIDE - 1, GRID_SIDE - 1), 12);
    }

    #[test]
    fn consecutive_fields_are_grid_neighbours() {
        for field in 1..FIELDS_PER_WELL {
            let (r0, c0) = position_of(field - 1).unwrap();
            let (r1, c1) = position_of(field).unwrap();
            let step = r0.abs_diff(r1) + c0.abs_diff(c1);
            assert_eq!(step, 1, "fields {} and {} are not adjacent", field - 1, field);
        }
    }

    #[test]
    fn position_round_trips() {
        for field in 0..FIELDS_PER_WELL {
            let (row, col) = position_of(field).unwrap();
            assert_eq!(field_at(row, col), field);
        }
        assert_eq!(position_of(FIELDS_PER_WELL), None);
    }
}
