// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários compartilhados por todo o sistema:
// - Token tracking e budget management
// - Action tracking (contagem de ações por tipo)
// - Text processing
// - Timing e performance
// - Text segmentation (chunking)
// - Semantic reference building
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Contagem de ações executadas por tipo ao longo de uma sessão.
pub mod action_tracker;
/// Sistema de referências semânticas usando embeddings e cosine similarity.
pub mod build_ref;
/// Chunking de texto para processamento de referências.
pub mod segment;
mod text;
mod timing;
mod token_tracker;

pub use action_tracker::{ActionStats, ActionTracker};
pub use build_ref::{ReferenceBuilder, ReferenceBuilderConfig, ReferenceError, ReferenceResult};
pub use segment::{chunk_text, ChunkOptions, ChunkResult, ChunkType};
pub use text::*;
pub use timing::{ActionTimer, TimingStats};
pub use token_tracker::{TokenTracker, TrackerStats};
