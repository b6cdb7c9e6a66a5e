use rand::seq::SliceRandom;
use rand::Rng;

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// Every winning combination, zero based.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn from_is_player_one(is_player_one: bool) -> Self {
        if is_player_one {
            Player::One
        } else {
            Player::Two
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Player),
}

/// A winning line, one based so it can be shown to players as dialed digits.
pub type WinningLine = [u8; 3];

/// An active game of Tic-Tac-Toe between two players.
///
/// Selecting a field after [`TicTacToe::done`] reports `true` is a contract
/// violation of the caller and is not guarded against.
#[derive(Debug, Clone, Default)]
pub struct TicTacToe {
    cells: [Cell; CELLS],
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, index: usize) -> Cell {
        self.cells[index]
    }

    /// Marks the zero based `index` for the given player if the cell is empty.
    ///
    /// `index` must be below [`CELLS`].
    pub fn select_field(&mut self, index: usize, is_player_one: bool) -> bool {
        if self.cells[index] != Cell::Empty {
            return false;
        }
        self.cells[index] = Cell::Taken(Player::from_is_player_one(is_player_one));
        true
    }

    /// Marks a uniformly chosen empty cell and returns its zero based index.
    ///
    /// Returns `None` only when the board is full.
    pub fn select_random_field<R: Rng + ?Sized>(
        &mut self,
        is_player_one: bool,
        rng: &mut R,
    ) -> Option<usize> {
        let free: Vec<usize> = (0..CELLS)
            .filter(|&i| self.cells[i] == Cell::Empty)
            .collect();
        let index = *free.choose(rng)?;
        self.cells[index] = Cell::Taken(Player::from_is_player_one(is_player_one));
        Some(index)
    }

    /// Returns the winner and the one based winning line.
    ///
    /// Player one is checked before player two.
    pub fn has_winner(&self) -> Option<(Player, WinningLine)> {
        [Player::One, Player::Two]
            .into_iter()
            .find_map(|player| self.winning_line(player).map(|line| (player, line)))
    }

    fn winning_line(&self, player: Player) -> Option<WinningLine> {
        LINES
            .iter()
            .find(|line| line.iter().all(|&i| self.cells[i] == Cell::Taken(player)))
            .map(|line| [line[0] as u8 + 1, line[1] as u8 + 1, line[2] as u8 + 1])
    }

    /// The game is over on a win or when no empty cell remains.
    pub fn done(&self) -> bool {
        self.has_winner().is_some() || self.cells.iter().all(|c| *c != Cell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draw_is_only_done_after_ninth_move() {
        // X O X / X O O / O X X
        let moves = [(0, true), (1, false), (2, true), (4, false), (3, true), (5, false), (7, true), (6, false)];
        let mut game = TicTacToe::new();
        for (index, is_one) in moves {
            assert!(!game.done());
            assert!(game.select_field(index, is_one));
        }
        assert!(!game.done());
        assert!(game.select_field(8, true));
        assert!(game.done());
        assert!(game.has_winner().is_none());
    }

    #[test]
    fn top_row_wins_before_board_is_full() {
        let mut game = TicTacToe::new();
        game.select_field(0, true);
        game.select_field(3, false);
        game.select_field(1, true);
        game.select_field(4, false);
        assert!(!game.done());
        game.select_field(2, true);

        assert_eq!(game.has_winner(), Some((Player::One, [1, 2, 3])));
        assert!(game.done());
    }

    #[test]
    fn diagonal_win_for_player_two() {
        let mut game = TicTacToe::new();
        for (index, is_one) in [(0, true), (2, false), (1, true), (4, false), (8, true), (6, false)] {
            game.select_field(index, is_one);
        }
        assert_eq!(game.has_winner(), Some((Player::Two, [3, 5, 7])));
    }

    #[test]
    fn occupied_cell_is_rejected_without_change() {
        let mut game = TicTacToe::new();
        assert!(game.select_field(4, true));
        assert!(!game.select_field(4, false));
        assert_eq!(game.cell(4), Cell::Taken(Player::One));
    }

    #[test]
    fn random_field_only_takes_empty_cells() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = TicTacToe::new();
        for index in [0, 2, 4, 6] {
            game.select_field(index, true);
        }

        for _ in 0..5 {
            let before = game.clone();
            let index = game.select_random_field(false, &mut rng).unwrap();
            assert_eq!(before.cell(index), Cell::Empty);
            assert_eq!(game.cell(index), Cell::Taken(Player::Two));
            let changed = (0..CELLS).filter(|&i| before.cell(i) != game.cell(i)).count();
            assert_eq!(changed, 1);
        }

        assert_eq!(game.select_random_field(true, &mut rng), None);
    }
}
