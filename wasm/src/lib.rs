use autosweep as ms;
use wasm_bindgen::prelude::*;

// Outcome byte appended to the serialized state by `choose_cell`.
const CONTINUE: u8 = 0;
const WIN: u8 = 1;
const LOSS: u8 = 2;

fn load(bts: &[u8]) -> Result<ms::Board, String> {
    ms::Board::from_bytes(bts).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn create_game(
    rows: usize,
    cols: usize,
    mines: usize,
    seed: Option<u64>,
) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut config = ms::GameConfig::new(rows, cols, mines);
    config.seed = seed;
    let board = ms::Board::new(config).map_err(|e| e.to_string())?;
    board.to_bytes().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut board = load(&bts)?;
    let outcome = board
        .apply_move(ms::Point { x, y })
        .map_err(|e| e.to_string())?;
    let mut xs = board.to_bytes().map_err(|e| e.to_string())?;
    xs.push(match outcome {
        ms::MoveOutcome::Continue => CONTINUE,
        ms::MoveOutcome::Win => WIN,
        ms::MoveOutcome::Loss => LOSS,
    });
    Ok(xs)
}

/// Row-major cell values: -1 hidden, -2 mine, otherwise the adjacent mine count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = load(&bts)?;
    Ok(board
        .projection()
        .values()
        .map(|cell| match cell {
            ms::Cell::Hidden => -1,
            ms::Cell::Mine => -2,
            ms::Cell::Revealed(n) => *n as i8,
        })
        .collect())
}

#[wasm_bindgen]
pub fn is_ended(bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    Ok(load(&bts)?.is_ended())
}

/// The cell a fresh player would reveal next, as `[x, y]`, or empty when it has none.
#[wasm_bindgen]
pub fn suggest_move(bts: Vec<u8>) -> Result<Vec<usize>, String> {
    console_error_panic_hook::set_once();

    let board = load(&bts)?;
    let mut player = ms::Player::new(board.rows(), board.cols(), board.mine_count());
    player
        .observe(board.projection())
        .map_err(|e| e.to_string())?;
    let next = player.next_move().map_err(|e| e.to_string())?;
    log::debug!("suggesting {next:?}");
    Ok(next.map(|p| vec![p.x, p.y]).unwrap_or_default())
}
