//! SimClock: монотонное время симуляции
//!
//! Все cooldown'ы и фазы считаются от SimClock, а не от `Time<Fixed>` напрямую:
//! реальный драйвер продвигает его из FixedUpdate, тесты вручную через
//! `advance_tick`. Никаких скрытых ожиданий, только числа.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    elapsed: f32,
    delta: f32,
    tick: u64,
}

impl SimClock {
    /// Сдвинуть время на `delta` секунд (отрицательные значения игнорируются)
    pub fn advance(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.delta = delta;
        self.elapsed += delta;
        self.tick += 1;
    }

    /// Текущее время (секунды от старта симуляции)
    pub fn now(&self) -> f32 {
        self.elapsed
    }

    /// Длительность последнего тика
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}
