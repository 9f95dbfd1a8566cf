//! Health ledger: HP любого боевого юнита (босс, дракон, радио-босс, клон, игрок)

use bevy::prelude::*;

/// Здоровье юнита
///
/// Инварианты:
/// - 0 ≤ current ≤ max, max ≥ 1
/// - `dead` монотонный (false → true ровно один раз, при current == 0)
/// - после смерти ни урон, ни хил не меняют current
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    current: u32,
    max: u32,
    dead: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Результат `Health::apply_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerDamage {
    /// Сколько HP реально снято (≤ HP до удара)
    pub applied: u32,
    /// true только на том ударе, который убил юнита
    pub died: bool,
}

impl Health {
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    /// Юнит, заспавненный уже раненым (current зажат в [1, max])
    pub fn with_current(max: u32, current: u32) -> Self {
        let max = max.max(1);
        Self {
            current: current.clamp(1, max),
            max,
            dead: false,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    /// Снять HP. No-op если юнит мертв или amount == 0.
    pub fn apply_damage(&mut self, amount: u32) -> LedgerDamage {
        if self.dead || amount == 0 {
            return LedgerDamage::default();
        }

        let applied = amount.min(self.current);
        self.current -= applied;

        let died = self.current == 0;
        if died {
            self.dead = true;
        }

        LedgerDamage { applied, died }
    }

    /// Вылечить, с clamp до max. Возвращает новое HP.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.dead {
            self.current = self.current.saturating_add(amount).min(self.max);
        }
        self.current
    }
}
