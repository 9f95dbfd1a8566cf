//! Tests for the damage pipeline.

#[cfg(test)]
mod tests {
    use crate::boss::ShieldSet;
    use crate::combat::{resolve_damage, DamageBlock};
    use crate::components::Health;

    #[test]
    fn test_plain_damage_reaches_ledger() {
        let mut health = Health::new(100);
        let resolution = resolve_damage(&mut health, None, false, 30);

        assert_eq!(resolution.applied, 30);
        assert!(!resolution.entity_died);
        assert_eq!(resolution.blocked, None);
        assert_eq!(health.current(), 70);
    }

    #[test]
    fn test_overkill_clamps_to_zero() {
        let mut health = Health::new(50);
        let resolution = resolve_damage(&mut health, None, false, 80);

        // Applied = реально снятое HP, а не raw
        assert_eq!(resolution.applied, 50);
        assert!(resolution.entity_died);
        assert_eq!(health.current(), 0);
    }

    #[test]
    fn test_closed_shield_gate_blocks() {
        let mut health = Health::new(100);
        let shields = ShieldSet::new(7, 0.5, 3.5);

        let resolution = resolve_damage(&mut health, Some(&shields), false, 40);

        assert_eq!(resolution.blocked, Some(DamageBlock::Shielded));
        assert_eq!(resolution.applied, 0);
        assert_eq!(health.current(), 100);
    }

    #[test]
    fn test_open_shield_gate_lets_damage_through() {
        let mut health = Health::new(100);
        let mut shields = ShieldSet::new(7, 0.5, 3.5);
        for index in 0..4 {
            shields.strike(index);
        }

        let resolution = resolve_damage(&mut health, Some(&shields), false, 40);
        assert_eq!(resolution.applied, 40);
        assert_eq!(health.current(), 60);
    }

    #[test]
    fn test_intangible_blocks() {
        let mut health = Health::new(200);
        let resolution = resolve_damage(&mut health, None, true, 25);

        assert_eq!(resolution.blocked, Some(DamageBlock::Intangible));
        assert_eq!(health.current(), 200);
    }

    #[test]
    fn test_shield_checked_before_intangible() {
        let mut health = Health::new(100);
        let shields = ShieldSet::new(3, 0.0, 1.0);

        let resolution = resolve_damage(&mut health, Some(&shields), true, 10);
        assert_eq!(resolution.blocked, Some(DamageBlock::Shielded));
    }

    #[test]
    fn test_dead_target_is_noop() {
        let mut health = Health::new(10);
        let first = resolve_damage(&mut health, None, false, 10);
        assert!(first.entity_died);

        // Повторная смерть не случается
        let second = resolve_damage(&mut health, None, false, 10);
        assert_eq!(second.blocked, Some(DamageBlock::AlreadyDead));
        assert!(!second.entity_died);
        assert_eq!(health.current(), 0);
    }

    #[test]
    fn test_zero_damage_is_noop() {
        let mut health = Health::new(10);
        let resolution = resolve_damage(&mut health, None, false, 0);

        assert_eq!(resolution.blocked, Some(DamageBlock::ZeroAmount));
        assert_eq!(health.current(), 10);
    }
}
