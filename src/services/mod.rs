pub mod error;
pub mod game_manager;
pub mod game_session;
pub mod musicbrainz;
pub mod now_playing;
pub mod radio_browser;
pub mod resolution_cache;
pub mod round_scanner;
pub mod score_store;
pub mod title_parser;
pub mod year_resolver;

pub use game_manager::GameManager;
pub use musicbrainz::MusicBrainzClient;
pub use now_playing::IcecastNowPlaying;
pub use radio_browser::RadioBrowserClient;
pub use round_scanner::RoundScanner;
pub use score_store::{MemoryScoreStore, RedisScoreStore, ScoreStore};
pub use year_resolver::{ReleaseYearResolver, ResolverConfig};
