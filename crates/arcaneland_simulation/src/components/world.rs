//! Позиционирование в мире (2D top-down)
//!
//! Физика и движение живут в движке; симуляции нужна только точка, куда
//! спавнить подкрепление, дропать лут и откуда стрелять death burst.

use bevy::prelude::*;

/// Позиция юнита в мировых координатах
///
/// Обновляется хостом (движком) после движения, симуляция только читает.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct WorldPosition(pub Vec2);

/// Точки спавна подкрепления, привязанные к боссу
///
/// Пустой список = фича спавна выключена (no-op + warning один раз).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SpawnPoints {
    pub points: Vec<Vec2>,
}

impl SpawnPoints {
    pub fn new(points: impl IntoIterator<Item = Vec2>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
