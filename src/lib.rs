pub mod chunker;
pub mod detector;
pub mod dispatcher;
pub mod events;
pub mod marker;
pub mod markup;
pub mod record;
pub mod redaction_set;
pub mod source;
pub mod turn;

// Re-export main types for convenient access
pub use chunker::{Chunk, ChunkerConfig, SentenceChunker};
pub use detector::{Detector, HttpDetector, HttpDetectorConfig, PatternDetector};
pub use dispatcher::{DetectionDispatcher, DetectionStats, DispatchConfig};
pub use events::TurnEvent;
pub use marker::{MarkerCodec, Span};
pub use markup::{MarkupNode, MarkupTransformer};
pub use redaction_set::{RedactionSet, RedactionSetFrozen};

// Re-export turn driver
pub use turn::{run_turn, TurnConfig, TurnContext, TurnOutcome};
