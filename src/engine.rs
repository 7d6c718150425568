//! Core game engine for the triple-match tile puzzle.
//!
//! This module defines the game's fundamental components:
//! - `TileKind`: The closed vocabulary of tile symbols.
//! - `Tile`: A positioned, typed tile with a layer index and a derived
//!   clickability flag.
//! - `resolve_clickable`: The occlusion resolver, which recomputes which
//!   tiles are unobstructed after every board mutation.
//! - `Game`: Manages a play session, including the board, the bounded dock,
//!   power-up charges, and processing player moves.
use itertools::Itertools;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

/// The kind of a tile. Equality is the only semantic operation; three equal
/// kinds collected in the dock form a match.
///
/// The vocabulary is ordered: tutorial levels use a prefix of it, advanced
/// levels a longer prefix. The `Display` form is the upper-case ticker, which
/// is also the token accepted by [`crate::utils::tiles_from_spec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TileKind {
    Btc,
    Eth,
    Usdt,
    Bnb,
    Sol,
    Xrp,
    Doge,
    Ada,
    Avax,
    Shib,
    Dot,
    Trx,
    Link,
    Matic,
    Uni,
}

/// Footprint width of a tile, in screen units.
pub const TILE_WIDTH: f32 = 48.0;
/// Footprint height of a tile, in screen units.
pub const TILE_HEIGHT: f32 = 54.0;
/// Vertical compression applied when projecting grid rows to the screen.
/// Because `TILE_HEIGHT * TILE_Y_STRIDE < TILE_HEIGHT`, tiles on adjacent
/// rows overlap vertically, which is what produces the stacked look.
pub const TILE_Y_STRIDE: f32 = 0.9;

/// Maximum number of tiles the dock can hold before the session is lost.
pub const DOCK_CAPACITY: usize = 7;

/// A single tile on the board or in the dock.
///
/// `x` and `y` are half-unit grid coordinates on a shared 2D projection;
/// `z` is the layer index, higher layers sit on top of lower ones.
/// `clickable` is derived state owned by [`resolve_clickable`]: it is only
/// meaningful after the collection it belongs to has been resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    /// Stable identifier, unique within a session. Reinserted copies get a
    /// derived id so they remain distinguishable from their origin.
    pub id: String,
    pub kind: TileKind,
    pub x: f32,
    pub y: f32,
    pub z: i32,
    pub clickable: bool,
}

impl Tile {
    /// Creates a provisionally-clickable tile. The flag is a placeholder
    /// until the collection is passed through [`resolve_clickable`].
    pub fn new(id: impl Into<String>, kind: TileKind, x: f32, y: f32, z: i32) -> Self {
        Tile {
            id: id.into(),
            kind,
            x,
            y,
            z,
            clickable: true,
        }
    }

    /// Top-left corner of the tile's screen-space footprint.
    fn screen_origin(&self) -> (f32, f32) {
        (self.x * TILE_WIDTH, self.y * TILE_HEIGHT * TILE_Y_STRIDE)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<5} (x={}, y={}, z={})",
            self.kind, self.x, self.y, self.z
        )
    }
}

/// Returns `true` iff `over` occludes `under`: `over` sits on a strictly
/// higher layer and the two axis-aligned footprints strictly overlap on both
/// axes. Exact edge contact does not count as overlap.
fn covers(under: &Tile, over: &Tile) -> bool {
    if over.z <= under.z {
        return false;
    }

    let (u_left, u_top) = under.screen_origin();
    let (o_left, o_top) = over.screen_origin();
    let u_right = u_left + TILE_WIDTH;
    let u_bottom = u_top + TILE_HEIGHT;
    let o_right = o_left + TILE_WIDTH;
    let o_bottom = o_top + TILE_HEIGHT;

    u_left < o_right && u_right > o_left && u_top < o_bottom && u_bottom > o_top
}

/// Recomputes the `clickable` flag for every tile in the collection.
///
/// A tile is clickable iff no other tile in the same collection occludes it.
/// This is a full O(n²) pass; it must be re-run after any structural change
/// to the collection (tile removed, returned, or repositioned), and only
/// then are the flags valid. Kind, id, and position are never touched.
///
/// Resolving an empty slice is a no-op, and resolving an already-resolved
/// collection leaves every flag unchanged.
///
/// # Examples
/// ```
/// use tristack::engine::{resolve_clickable, Tile, TileKind};
///
/// let mut tiles = vec![
///     Tile::new("a", TileKind::Btc, 0.0, 0.0, 0),
///     Tile::new("b", TileKind::Eth, 0.0, 0.0, 1),
/// ];
/// resolve_clickable(&mut tiles);
/// assert!(!tiles[0].clickable); // buried under "b"
/// assert!(tiles[1].clickable);
/// ```
pub fn resolve_clickable(tiles: &mut [Tile]) {
    let blocked: Vec<bool> = tiles
        .iter()
        .map(|tile| tiles.iter().any(|other| covers(tile, other)))
        .collect();
    for (tile, blocked) in tiles.iter_mut().zip(blocked) {
        tile.clickable = !blocked;
    }
}

/// The power-ups a session can spend charges on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PowerUp {
    Undo,
    Shuffle,
    Remove,
}

/// Remaining charges per power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charges {
    pub undo: u32,
    pub shuffle: u32,
    pub remove: u32,
}

impl Charges {
    /// Charge allotment for a difficulty tier. The tutorial tier plays
    /// without tools.
    fn for_level(level: u32) -> Self {
        if level <= 1 {
            Charges {
                undo: 0,
                shuffle: 0,
                remove: 0,
            }
        } else {
            Charges {
                undo: 1,
                shuffle: 1,
                remove: 1,
            }
        }
    }
}

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Won,
    Lost,
}

/// Why a mutation request was rejected. Every rejection is a strict no-op:
/// neither the board nor the dock is altered on any error path, so callers
/// that discard the error get silent-no-op semantics.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no tile with id `{0}` on the board")]
    NoSuchTile(String),
    #[error("tile `{0}` is covered by a higher tile")]
    Occluded(String),
    #[error("the dock is full")]
    DockFull,
    #[error("the dock is empty")]
    DockEmpty,
    #[error("the remove power-up needs at least three docked tiles")]
    NeedThreeDocked,
    #[error("no {0} charges left")]
    NoCharges(PowerUp),
    #[error("the game is over")]
    GameOver,
}

/// Grid row where the remove power-up stages its returned tiles, below the
/// playable clamp range so they never land on top of live stacks.
const STAGING_ROW_Y: f32 = 8.0;
/// Layer headroom granted to returned tiles so they sit above everything.
const STAGING_Z_GAP: i32 = 10;

/// Manages the state and progression of one puzzle session.
///
/// `Game` owns the board and dock collections and applies every mutation
/// operation, re-running [`resolve_clickable`] on the board before
/// returning. Match clearing and loss declaration are two-phase: queries
/// ([`Game::pending_match`], [`Game::loss_pending`]) report the condition,
/// and the caller commits it ([`Game::clear_match`], [`Game::declare_loss`])
/// after whatever feedback delay it wants. A mutation in between can cancel
/// a pending loss by completing a triad.
///
/// # Examples
/// ```
/// use tristack::engine::{Game, Phase, Tile, TileKind};
///
/// let mut game = Game::with_tiles(vec![
///     Tile::new("a", TileKind::Btc, 0.0, 0.0, 0),
///     Tile::new("b", TileKind::Btc, 2.0, 0.0, 0),
///     Tile::new("c", TileKind::Btc, 4.0, 0.0, 0),
/// ]);
/// game.click("a").unwrap();
/// game.click("b").unwrap();
/// game.click("c").unwrap();
/// assert_eq!(game.clear_match(), Some(TileKind::Btc));
/// assert_eq!(game.phase(), Phase::Won);
/// ```
#[derive(Clone, Debug)]
pub struct Game {
    board: Vec<Tile>,
    dock: Vec<Tile>,
    charges: Charges,
    phase: Phase,
    initial_tiles: usize,
}

impl Game {
    /// Creates a session for the given difficulty level with a freshly
    /// generated board. Randomness comes from the caller so tests can seed
    /// it.
    pub fn new(level: u32, rng: &mut impl Rng) -> Self {
        let board = crate::generator::generate_level(level, rng);
        let initial_tiles = board.len();
        Game {
            board,
            dock: Vec::new(),
            charges: Charges::for_level(level),
            phase: Phase::Playing,
            initial_tiles,
        }
    }

    /// Creates a session over a fixed tile collection. The collection is
    /// resolved on entry, and one charge of each power-up is granted. This
    /// is the fixture constructor used throughout the tests.
    pub fn with_tiles(mut tiles: Vec<Tile>) -> Self {
        resolve_clickable(&mut tiles);
        let initial_tiles = tiles.len();
        Game {
            board: tiles,
            dock: Vec::new(),
            charges: Charges {
                undo: 1,
                shuffle: 1,
                remove: 1,
            },
            phase: Phase::Playing,
            initial_tiles,
        }
    }

    /// The current board collection, with valid `clickable` flags.
    pub fn board(&self) -> &[Tile] {
        &self.board
    }

    /// The current dock collection, in commit order (oldest first).
    pub fn dock(&self) -> &[Tile] {
        &self.dock
    }

    /// Remaining power-up charges.
    pub fn charges(&self) -> Charges {
        self.charges
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of tiles the session started with.
    pub fn initial_tile_count(&self) -> usize {
        self.initial_tiles
    }

    /// Percentage of the starting tiles that have been permanently cleared.
    pub fn cleared_percent(&self) -> u32 {
        let total = self.initial_tiles.max(1);
        let remaining = self.board.len() + self.dock.len();
        ((total - remaining) * 100 / total) as u32
    }

    fn ensure_playing(&self) -> Result<(), MoveError> {
        match self.phase {
            Phase::Playing => Ok(()),
            _ => Err(MoveError::GameOver),
        }
    }

    /// Commits one clickable board tile to the dock.
    ///
    /// Rejected (without state change) if the session is over, the dock is
    /// at capacity, the id is unknown, or the tile is occluded. On success
    /// the board is re-resolved.
    pub fn click(&mut self, id: &str) -> Result<(), MoveError> {
        self.ensure_playing()?;
        if self.dock.len() >= DOCK_CAPACITY {
            return Err(MoveError::DockFull);
        }
        let index = self
            .board
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| MoveError::NoSuchTile(id.to_string()))?;
        if !self.board[index].clickable {
            return Err(MoveError::Occluded(id.to_string()));
        }

        let tile = self.board.remove(index);
        self.dock.push(tile);
        resolve_clickable(&mut self.board);
        Ok(())
    }

    /// Reports the kind of a completed triad in the dock, if any. Kinds are
    /// examined in commit order, so when two triads coexist the older one is
    /// reported first.
    pub fn pending_match(&self) -> Option<TileKind> {
        let counts = self.dock.iter().map(|t| t.kind).counts();
        self.dock
            .iter()
            .map(|t| t.kind)
            .find(|kind| counts[kind] >= 3)
    }

    /// Removes exactly three dock tiles of the pending match's kind (the
    /// three oldest of that kind) and returns the kind, or `None` when no
    /// triad is complete. This is the only path that permanently discards
    /// tiles; clearing the last of them wins the session.
    pub fn clear_match(&mut self) -> Option<TileKind> {
        let kind = self.pending_match()?;
        let mut removed = 0;
        self.dock.retain(|tile| {
            if tile.kind == kind && removed < 3 {
                removed += 1;
                false
            } else {
                true
            }
        });
        debug!("cleared a {kind} triad, {} tiles docked", self.dock.len());

        if self.board.is_empty() && self.dock.is_empty() {
            self.phase = Phase::Won;
            debug!("board and dock empty: session won");
        }
        Some(kind)
    }

    /// `true` when the dock has hit capacity with no triad to clear. The
    /// caller decides when to convert this into a loss via
    /// [`Game::declare_loss`].
    pub fn loss_pending(&self) -> bool {
        self.phase == Phase::Playing
            && self.dock.len() >= DOCK_CAPACITY
            && self.pending_match().is_none()
    }

    /// Re-checks the loss condition and commits it. Returns `true` if the
    /// session transitioned to `Lost`. The re-check makes the call safe to
    /// issue after a delay during which a match may have been cleared.
    pub fn declare_loss(&mut self) -> bool {
        if self.loss_pending() {
            self.phase = Phase::Lost;
            debug!("dock full with no triad: session lost");
            true
        } else {
            false
        }
    }

    /// Returns the most recently committed dock tile to the board at the
    /// position and layer it still carries. Costs one undo charge.
    pub fn undo(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        if self.dock.is_empty() {
            return Err(MoveError::DockEmpty);
        }
        if self.charges.undo == 0 {
            return Err(MoveError::NoCharges(PowerUp::Undo));
        }

        let tile = self.dock.pop().expect("dock checked non-empty above");
        self.charges.undo -= 1;
        self.board.push(tile);
        resolve_clickable(&mut self.board);
        Ok(())
    }

    /// Redistributes the board's kinds uniformly at random across the
    /// board's fixed positions. Costs one shuffle charge.
    ///
    /// Occlusion ignores kind, so clickability cannot actually change; the
    /// resolver is still re-run as the contract demands after any mutation.
    pub fn shuffle(&mut self, rng: &mut impl Rng) -> Result<(), MoveError> {
        self.ensure_playing()?;
        if self.charges.shuffle == 0 {
            return Err(MoveError::NoCharges(PowerUp::Shuffle));
        }

        let mut kinds: Vec<TileKind> = self.board.iter().map(|t| t.kind).collect();
        kinds.shuffle(rng);
        for (tile, kind) in self.board.iter_mut().zip(kinds) {
            tile.kind = kind;
        }
        self.charges.shuffle -= 1;
        resolve_clickable(&mut self.board);
        Ok(())
    }

    /// Takes the three oldest dock tiles and reinserts them on the board at
    /// the staging row, above every existing layer, with derived ids. Costs
    /// one remove charge.
    ///
    /// The staging x origin alternates between the left and right half of
    /// the row by charge parity, so two consecutive uses do not overlap.
    pub fn remove_three(&mut self) -> Result<(), MoveError> {
        self.ensure_playing()?;
        if self.charges.remove == 0 {
            return Err(MoveError::NoCharges(PowerUp::Remove));
        }
        if self.dock.len() < 3 {
            return Err(MoveError::NeedThreeDocked);
        }

        let start_x = if self.charges.remove % 2 == 0 { 0.5 } else { 3.5 };
        let max_z = self.board.iter().map(|t| t.z).max().unwrap_or(10);

        let returned: Vec<Tile> = self
            .dock
            .drain(..3)
            .enumerate()
            .map(|(i, tile)| Tile {
                id: format!("{}-returned", tile.id),
                x: start_x + i as f32,
                y: STAGING_ROW_Y,
                z: max_z + STAGING_Z_GAP + i as i32,
                ..tile
            })
            .collect();
        self.board.extend(returned);
        self.charges.remove -= 1;
        resolve_clickable(&mut self.board);
        Ok(())
    }
}
