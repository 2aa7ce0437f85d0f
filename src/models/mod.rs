pub mod game;
pub mod song;
pub mod station;

pub use game::{
    CreateGameRequest, GameSnapshot, GameSummary, GuessRequest, RoundResult, RoundStart, RoundView,
    ScanProgress, Score,
};
pub use song::{decade_of, ResolvedSong, SongIdentity};
pub use station::StationRecord;
