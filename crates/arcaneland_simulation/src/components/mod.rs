//! ECS Components для боевых юнитов
//!
//! Организация по доменам:
//! - actor: health ledger (Health)
//! - unit: capability traits (HasHealth, Identifiable, Locatable)
//! - world: позиция и точки спавна (WorldPosition, SpawnPoints)

pub mod actor;
pub mod unit;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use unit::*;
pub use world::*;
