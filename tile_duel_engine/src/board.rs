// The 4×4 board and the slide-and-merge step.
//
// `Board` is a plain row-major grid of tile values (0 = empty). A move is
// expressed as four independent "lines": for each direction, `Direction::cell`
// maps (line index, position along the line) to a board cell so that the
// line is always read in the order tiles travel toward. `merge_line` then
// only has to know how to push values toward index 0, and the same mapping
// writes the processed line back.
//
// Merge semantics follow classic 2048: each tile takes part in at most one
// merge per move, so `[2, 2, 2, 2]` becomes `[4, 4, 0, 0]`, never
// `[8, 0, 0, 0]`.

use serde::{Deserialize, Serialize};

/// Side length of the board. Fixed; the wire format depends on it.
pub const BOARD_SIZE: usize = 4;

/// A tile value. Zero marks an empty cell.
pub type Tile = u32;

/// One line of the board in travel order.
pub type Line = [Tile; BOARD_SIZE];

/// A board coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Direction of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Board cell at position `pos` of line `line`, where position 0 is the
    /// edge tiles slide toward. UP walks columns top to bottom, DOWN columns
    /// bottom to top, LEFT rows left to right, RIGHT rows right to left.
    pub fn cell(self, line: usize, pos: usize) -> Cell {
        let last = BOARD_SIZE - 1;
        match self {
            Direction::Up => Cell::new(pos, line),
            Direction::Down => Cell::new(last - pos, line),
            Direction::Left => Cell::new(line, pos),
            Direction::Right => Cell::new(line, last - pos),
        }
    }
}

/// Row-major 4×4 grid of tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    rows: [[Tile; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An all-empty board.
    pub const EMPTY: Board = Board {
        rows: [[0; BOARD_SIZE]; BOARD_SIZE],
    };

    pub fn from_rows(rows: [[Tile; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[Tile; BOARD_SIZE]; BOARD_SIZE] {
        &self.rows
    }

    pub fn get(&self, cell: Cell) -> Tile {
        self.rows[cell.row][cell.col]
    }

    pub fn set(&mut self, cell: Cell, value: Tile) {
        self.rows[cell.row][cell.col] = value;
    }

    /// All 16 cells in row-major order.
    pub fn cells() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Cell::new(row, col)))
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Cell> {
        Self::cells().filter(|c| self.get(*c) == 0).collect()
    }

    pub fn has_empty_cell(&self) -> bool {
        self.rows.iter().flatten().any(|v| *v == 0)
    }

    /// True if two horizontally or vertically adjacent cells hold the same
    /// value, i.e. a move could still merge something on a full board.
    pub fn has_adjacent_pair(&self) -> bool {
        Self::cells().any(|c| {
            let v = self.get(c);
            let right = c.col + 1 < BOARD_SIZE && self.get(Cell::new(c.row, c.col + 1)) == v;
            let below = c.row + 1 < BOARD_SIZE && self.get(Cell::new(c.row + 1, c.col)) == v;
            right || below
        })
    }

    /// Slide and merge every line toward `dir`. Returns the merge score.
    pub fn slide(&mut self, dir: Direction) -> u32 {
        let mut gained = 0;
        for line in 0..BOARD_SIZE {
            let mut values: Line = [0; BOARD_SIZE];
            for (pos, v) in values.iter_mut().enumerate() {
                *v = self.get(dir.cell(line, pos));
            }
            gained += merge_line(&mut values);
            for (pos, v) in values.iter().enumerate() {
                self.set(dir.cell(line, pos), *v);
            }
        }
        gained
    }
}

/// Push the non-zero values of `line` toward index 0, merging equal
/// neighbours once each. Returns the sum of the merged values.
pub fn merge_line(line: &mut Line) -> u32 {
    let len = line.iter().filter(|v| **v != 0).count();
    let mut packed: Line = [0; BOARD_SIZE];
    for (slot, v) in packed.iter_mut().zip(line.iter().filter(|v| **v != 0)) {
        *slot = *v;
    }

    let mut gained = 0;
    let mut i = 0;
    while i + 1 < len {
        if packed[i] == packed[i + 1] {
            packed[i] *= 2;
            gained += packed[i];
            packed[i + 1] = 0;
            // The consumed right-hand tile cannot merge again.
            i += 2;
        } else {
            i += 1;
        }
    }

    *line = [0; BOARD_SIZE];
    for (slot, v) in line.iter_mut().zip(packed.iter().filter(|v| **v != 0)) {
        *slot = *v;
    }
    gained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(mut line: Line) -> (Line, u32) {
        let gained = merge_line(&mut line);
        (line, gained)
    }

    #[test]
    fn four_equal_tiles_merge_pairwise() {
        assert_eq!(merged([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
    }

    #[test]
    fn mixed_pairs_score_sum_of_results() {
        assert_eq!(merged([2, 2, 4, 4]), ([4, 8, 0, 0], 12));
    }

    #[test]
    fn gaps_are_compacted_before_merging() {
        assert_eq!(merged([2, 0, 0, 2]), ([4, 0, 0, 0], 4));
        assert_eq!(merged([0, 4, 0, 8]), ([4, 8, 0, 0], 0));
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        assert_eq!(merged([4, 4, 8, 0]), ([8, 8, 0, 0], 8));
        assert_eq!(merged([2, 2, 4, 0]), ([4, 4, 0, 0], 4));
    }

    #[test]
    fn three_equal_tiles_merge_leading_pair() {
        assert_eq!(merged([8, 8, 8, 0]), ([16, 8, 0, 0], 16));
    }

    #[test]
    fn second_pass_only_changes_line_by_merging() {
        // Output is always compacted, so re-applying the step can only alter
        // the line through a fresh merge of tiles the first pass created.
        let samples: [Line; 8] = [
            [2, 2, 2, 2],
            [2, 2, 4, 4],
            [0, 0, 0, 0],
            [4, 0, 4, 8],
            [2, 4, 8, 16],
            [16, 16, 0, 32],
            [0, 2, 0, 2],
            [0, 8, 2, 8],
        ];
        for sample in samples {
            let (once, _) = merged(sample);
            let zeros_trail = once.iter().skip_while(|v| **v != 0).all(|v| *v == 0);
            assert!(zeros_trail, "output of {sample:?} not compacted: {once:?}");
            let (twice, gained) = merged(once);
            assert_eq!(gained == 0, once == twice, "sample {sample:?}");
        }
        assert_eq!(merged([4, 8, 0, 0]), ([4, 8, 0, 0], 0));
    }

    #[test]
    fn direction_mapping_reads_toward_edge() {
        assert_eq!(Direction::Up.cell(1, 0), Cell::new(0, 1));
        assert_eq!(Direction::Down.cell(1, 0), Cell::new(3, 1));
        assert_eq!(Direction::Left.cell(2, 3), Cell::new(2, 3));
        assert_eq!(Direction::Right.cell(2, 0), Cell::new(2, 3));
    }

    #[test]
    fn slide_each_direction() {
        let board = Board::from_rows([
            [2, 0, 0, 2],
            [0, 4, 0, 0],
            [0, 4, 0, 0],
            [8, 0, 0, 0],
        ]);

        let mut left = board;
        assert_eq!(left.slide(Direction::Left), 4);
        assert_eq!(
            left,
            Board::from_rows([[4, 0, 0, 0], [4, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0]])
        );

        let mut right = board;
        assert_eq!(right.slide(Direction::Right), 4);
        assert_eq!(
            right,
            Board::from_rows([[0, 0, 0, 4], [0, 0, 0, 4], [0, 0, 0, 4], [0, 0, 0, 8]])
        );

        let mut up = board;
        assert_eq!(up.slide(Direction::Up), 8);
        assert_eq!(
            up,
            Board::from_rows([[2, 8, 0, 2], [8, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]])
        );

        let mut down = board;
        assert_eq!(down.slide(Direction::Down), 8);
        assert_eq!(
            down,
            Board::from_rows([[0, 0, 0, 0], [0, 0, 0, 0], [2, 0, 0, 0], [8, 8, 0, 2]])
        );
    }

    #[test]
    fn empty_cells_and_adjacency() {
        let full_no_pairs = Board::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ]);
        assert!(!full_no_pairs.has_empty_cell());
        assert!(full_no_pairs.empty_cells().is_empty());
        assert!(!full_no_pairs.has_adjacent_pair());

        let mut vertical_pair = full_no_pairs;
        vertical_pair.set(Cell::new(3, 3), 4);
        assert!(vertical_pair.has_adjacent_pair());

        assert_eq!(Board::EMPTY.empty_cells().len(), 16);
    }
}
