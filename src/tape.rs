/// Number of cells used by [`crate::Interpreter`] and the one-shot entry points.
pub const DEFAULT_CELLS: usize = 30_000;

/// A fixed-size tape of 8-bit cells with a cursor that wraps at both ends.
///
/// Cell arithmetic wraps modulo 256. Moving right from cell `N - 1` lands on
/// cell 0 and moving left from cell 0 lands on cell `N - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape<const N: usize = DEFAULT_CELLS> {
    cells: Box<[u8]>,
    cursor: usize,
}

impl<const N: usize> Tape<N> {
    const NON_EMPTY: () = assert!(N >= 1, "a tape needs at least one cell");

    pub fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self {
            cells: vec![0; N].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Value of the cell under the cursor.
    pub fn read(&self) -> u8 {
        self.cells[self.cursor]
    }

    pub fn write(&mut self, value: u8) {
        self.cells[self.cursor] = value;
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = if self.cursor == N - 1 { 0 } else { self.cursor + 1 };
    }

    pub fn move_left(&mut self) {
        self.cursor = if self.cursor == 0 { N - 1 } else { self.cursor - 1 };
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl<const N: usize> Default for Tape<N> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const CELLS: usize = 17;

    proptest! {
        #[test]
        fn n_moves_right_return_to_start(start in 0..CELLS) {
            let mut tape: Tape<CELLS> = Tape::new();
            for _ in 0..start {
                tape.move_right();
            }
            prop_assert_eq!(tape.cursor(), start);
            for _ in 0..CELLS {
                tape.move_right();
            }
            prop_assert_eq!(tape.cursor(), start);
        }

        #[test]
        fn n_moves_left_return_to_start(start in 0..CELLS) {
            let mut tape: Tape<CELLS> = Tape::new();
            for _ in 0..start {
                tape.move_right();
            }
            for _ in 0..CELLS {
                tape.move_left();
            }
            prop_assert_eq!(tape.cursor(), start);
        }

        #[test]
        fn cursor_stays_in_range(moves in prop::collection::vec(any::<bool>(), 0..200)) {
            let mut tape: Tape<CELLS> = Tape::new();
            for right in moves {
                if right { tape.move_right() } else { tape.move_left() }
                prop_assert!(tape.cursor() < CELLS);
            }
        }
    }
}
