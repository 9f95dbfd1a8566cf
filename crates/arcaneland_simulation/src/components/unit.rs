//! Capability traits для боевых юнитов
//!
//! Клон-агрегатор работает с любым типом, который умеет отдать HP, id и позицию.
//! Никакой иерархии: ECS-вью (`UnitView`) и тестовые заглушки реализуют одно и то же.

use bevy::prelude::*;
use crate::components::Health;

pub trait HasHealth {
    fn current_hp(&self) -> u32;
    fn max_hp(&self) -> u32;

    fn is_down(&self) -> bool {
        self.current_hp() == 0
    }
}

pub trait Identifiable {
    fn unit_id(&self) -> Entity;
}

pub trait Locatable {
    fn location(&self) -> Vec2;
}

/// Юнит, из которого можно собрать босса-из-клонов
pub trait CloneBossUnit: HasHealth + Identifiable + Locatable {}

impl<T: HasHealth + Identifiable + Locatable> CloneBossUnit for T {}

impl HasHealth for Health {
    fn current_hp(&self) -> u32 {
        self.current()
    }

    fn max_hp(&self) -> u32 {
        self.max()
    }
}

/// Снимок юнита из ECS (entity + Health + позиция)
#[derive(Debug, Clone, Copy)]
pub struct UnitView {
    pub entity: Entity,
    pub health: Health,
    pub position: Vec2,
}

impl HasHealth for UnitView {
    fn current_hp(&self) -> u32 {
        self.health.current()
    }

    fn max_hp(&self) -> u32 {
        self.health.max()
    }
}

impl Identifiable for UnitView {
    fn unit_id(&self) -> Entity {
        self.entity
    }
}

impl Locatable for UnitView {
    fn location(&self) -> Vec2 {
        self.position
    }
}
