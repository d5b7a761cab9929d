//! Boss fights as ordered phase state machines
//!
//! A [`Boss`] owns one entity plus an ordered list of [`BossPhase`]s. Each
//! phase carries its own health pool, firing sites and attack patterns. A
//! phase ends when its pool is emptied or its time limit passes, whichever
//! comes first; the final phase ending destroys the boss.

use glam::Vec2;

use crate::assets::SoundCue;
use crate::consts::SCREEN_CLEAR_DURATION_MS;
use crate::sim::entity::{EntityId, GroupId};
use crate::sim::movement::{MoveCtx, MovementFn};
use crate::sim::pattern::{AttackPattern, PatternFactory};
use crate::sim::world::{UiEvent, World};

/// One phase of a boss fight: a health pool, a time limit and the attack
/// patterns that run while it lasts.
pub struct BossPhase {
    /// Attack name shown in the banner
    pub name: String,
    /// Pattern factory plus the site offset from the boss centre it fires from
    pattern_defs: Vec<(PatternFactory, Vec2)>,
    pub max_hp: i32,
    /// Hard time limit; runs out even with health remaining
    pub duration_ms: Option<u64>,
    pub current_hp: i32,
    started_at: Option<u64>,
    patterns: Vec<AttackPattern>,
    sites: Vec<EntityId>,
}

impl BossPhase {
    pub fn new(
        name: &str,
        pattern_defs: Vec<(PatternFactory, Vec2)>,
        max_hp: i32,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern_defs,
            max_hp,
            duration_ms,
            current_hp: max_hp,
            started_at: None,
            patterns: Vec::new(),
            sites: Vec::new(),
        }
    }

    /// Arm the phase: reset its health pool, spawn its firing sites anchored
    /// to the boss and instantiate its patterns.
    fn start(&mut self, world: &mut World, boss: EntityId) {
        self.started_at = Some(world.now_ms);
        self.current_hp = self.max_hp;
        for (factory, offset) in &self.pattern_defs {
            let site = world.spawn_offset_site(boss, *offset, 0);
            self.sites.push(site);
            self.patterns.push(factory(site));
        }
    }

    fn expired(&self, now: u64) -> bool {
        match (self.duration_ms, self.started_at) {
            (Some(limit), Some(start)) => now.saturating_sub(start) > limit,
            _ => false,
        }
    }

    /// Retire everything the phase put into the world
    fn teardown(&mut self, world: &mut World) {
        for pattern in &mut self.patterns {
            pattern.kill_projectiles(world);
        }
        for site in self.sites.drain(..) {
            world.kill(site);
        }
    }
}

/// A boss entity driven through its phases
pub struct Boss {
    pub entity: EntityId,
    pub name: String,
    phases: Vec<BossPhase>,
    index: usize,
    movement: MovementFn,
    pub active: bool,
    transitioning: bool,
}

impl Boss {
    /// Spawn the boss entity and arm its first phase. Scroll stops for the
    /// duration of the fight.
    pub fn new(
        world: &mut World,
        name: &str,
        pos: Vec2,
        phases: Vec<BossPhase>,
        movement: MovementFn,
        reward: i32,
    ) -> Self {
        let first_hp = phases.first().map(|p| p.max_hp).unwrap_or(1);
        let entity = world.spawn_boss_entity(name, pos, first_hp, reward);
        let mut boss = Self {
            entity,
            name: name.to_string(),
            phases,
            index: 0,
            movement,
            active: true,
            transitioning: false,
        };
        if boss.phases.is_empty() {
            world.kill(entity);
            boss.active = false;
            return boss;
        }
        world.scroll_speed = 0.0;
        boss.start_phase(world);
        boss
    }

    pub fn phase_index(&self) -> usize {
        self.index
    }

    fn start_phase(&mut self, world: &mut World) {
        let entity = self.entity;
        // Every phase entry clears the playfield of enemy fire.
        world.spawn_bomb("screen_clear", entity, SCREEN_CLEAR_DURATION_MS, GroupId::Bullets);
        let phase = &mut self.phases[self.index];
        phase.start(world, entity);
        if let Some(e) = world.get_mut(entity) {
            e.health = phase.max_hp;
        }
        world.push_ui(UiEvent::ShowBanner { text: phase.name.clone() });
        world.push_ui(UiEvent::BossHealth { current: phase.max_hp, max: phase.max_hp });
        log::info!("boss {} entering phase {} ({})", self.name, self.index, phase.name);
    }

    /// Apply one hit to the current phase's health pool
    pub fn take_damage(&mut self, world: &mut World) {
        if self.transitioning {
            return;
        }
        if world.get(self.entity).is_none_or(|e| e.bomb_immunity || !e.alive) {
            return;
        }
        let phase = &mut self.phases[self.index];
        phase.current_hp -= 1;
        let current = phase.current_hp;
        let max = phase.max_hp;
        if let Some(e) = world.get_mut(self.entity) {
            e.health = current;
        }
        world.push_ui(UiEvent::BossHealth { current, max });
        if current <= 0 {
            world.play(SoundCue::EnemyDeath);
            self.next_phase(world);
        }
    }

    /// Close out the current phase and arm the next, or finish the fight
    fn next_phase(&mut self, world: &mut World) {
        self.transitioning = true;
        let phase = &mut self.phases[self.index];
        world.push_ui(UiEvent::RetireBanner { text: phase.name.clone() });
        phase.teardown(world);

        self.index += 1;
        if self.index >= self.phases.len() {
            log::info!("boss {} destroyed", self.name);
            world.spawn_bomb("screen_clear", self.entity, SCREEN_CLEAR_DURATION_MS,
                GroupId::Bullets);
            if let Some(pos) = world.center(self.entity) {
                world.push_ui(UiEvent::DeathEffect { pos, size: 70.0 });
            }
            world.play(SoundCue::EnemyDeath);
            world.kill(self.entity);
            world.scroll_speed = world.base_scroll_speed;
            self.active = false;
            return;
        }
        self.start_phase(world);
        self.transitioning = false;
    }

    pub fn update(&mut self, world: &mut World) {
        if !self.active {
            return;
        }
        if !world.is_alive(self.entity) {
            // Killed from outside the phase machine (stage teardown).
            world.scroll_speed = world.base_scroll_speed;
            self.active = false;
            return;
        }

        let ctx = MoveCtx { now_ms: world.now_ms, scroll_speed: world.scroll_speed };
        let hits = match world.get_mut(self.entity) {
            Some(e) => {
                (self.movement)(e, &ctx);
                std::mem::take(&mut e.hits_taken)
            }
            None => 0,
        };
        for _ in 0..hits {
            self.take_damage(world);
            if !self.active {
                return;
            }
        }

        for pattern in &mut self.phases[self.index].patterns {
            pattern.update(world);
        }

        if self.phases[self.index].expired(world.now_ms) {
            self.next_phase(world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pattern::Pattern;
    use crate::sim::test_world;
    use crate::sim::{movement, world::World};

    fn circle_factory(target: EntityId) -> PatternFactory {
        Box::new(move |site| {
            AttackPattern::Single(Pattern::circle(
                site,
                target,
                "pellet",
                Vec2::new(4.0, 10.0),
                4,
                100,
                5.0,
                0.0,
                false,
            ))
        })
    }

    fn hit(world: &mut World, boss: &Boss) {
        world.get_mut(boss.entity).unwrap().hits_taken += 1;
    }

    #[test]
    fn test_phase_transitions_on_final_hit() {
        let mut w = test_world();
        let phases = vec![
            BossPhase::new("opening", Vec::new(), 10, None),
            BossPhase::new("closer", Vec::new(), 5, None),
        ];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);

        for n in 1..=9 {
            hit(&mut w, &boss);
            boss.update(&mut w);
            assert_eq!(boss.phase_index(), 0, "transitioned early at hit {n}");
        }
        hit(&mut w, &boss);
        boss.update(&mut w);
        assert_eq!(boss.phase_index(), 1);
        assert!(boss.active);
        // New phase starts at its own full pool.
        assert_eq!(w.get(boss.entity).unwrap().health, 5);
    }

    #[test]
    fn test_external_damage_reaches_the_phase_pool() {
        let mut w = test_world();
        let phases = vec![BossPhase::new("only", Vec::new(), 3, None)];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        boss.take_damage(&mut w);
        assert_eq!(w.get(boss.entity).unwrap().health, 2);
        assert!(w.ui_events.iter().any(|e| matches!(
            e,
            UiEvent::BossHealth { current: 2, max: 3 }
        )));
    }

    #[test]
    fn test_phase_index_monotonic_until_destroyed() {
        let mut w = test_world();
        let phases = vec![
            BossPhase::new("one", Vec::new(), 2, None),
            BossPhase::new("two", Vec::new(), 2, None),
            BossPhase::new("three", Vec::new(), 2, None),
        ];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        let mut last = 0;
        for _ in 0..12 {
            // Let each entry's screen-clear shockwave expire so the boss's
            // bomb immunity lapses and hits land.
            w.advance(500);
            w.tick();
            hit(&mut w, &boss);
            boss.update(&mut w);
            assert!(boss.phase_index() >= last);
            last = boss.phase_index();
            if !boss.active {
                break;
            }
        }
        assert!(!boss.active);
        assert!(!w.is_alive(boss.entity));
    }

    #[test]
    fn test_duration_limit_ends_phase_with_health_remaining() {
        let mut w = test_world();
        let phases = vec![
            BossPhase::new("timed", Vec::new(), 100, Some(500)),
            BossPhase::new("after", Vec::new(), 5, None),
        ];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        boss.update(&mut w);
        assert_eq!(boss.phase_index(), 0);
        w.advance(501);
        boss.update(&mut w);
        assert_eq!(boss.phase_index(), 1);
        assert!(boss.active);
    }

    #[test]
    fn test_first_phase_entry_clears_enemy_fire() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 100.0), 0);
        for x in [200.0, 400.0, 600.0] {
            w.spawn_bullet(
                "shot",
                Vec2::new(x, 400.0),
                Vec2::ZERO,
                Vec2::ZERO,
                Vec2::new(4.0, 10.0),
                site,
            );
        }
        let phases = vec![BossPhase::new("opening", Vec::new(), 10, None)];
        let _boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        // The entry shockwave sweeps the playfield within its duration.
        for _ in 0..30 {
            w.advance(16);
            w.tick();
        }
        assert_eq!(w.group_len(GroupId::Bullets), 0);
    }

    #[test]
    fn test_transition_clears_sites_and_deploys_screen_clear() {
        let mut w = test_world();
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let phases = vec![
            BossPhase::new(
                "sites",
                vec![
                    (circle_factory(player), Vec2::new(-40.0, 0.0)),
                    (circle_factory(player), Vec2::new(40.0, 0.0)),
                ],
                1,
                None,
            ),
            BossPhase::new("after", Vec::new(), 5, None),
        ];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        assert_eq!(w.group_len(GroupId::Sites), 2);
        boss.update(&mut w);
        assert!(w.group_len(GroupId::Bullets) > 0);

        hit(&mut w, &boss);
        boss.update(&mut w);
        assert_eq!(boss.phase_index(), 1);
        // Outgoing sites and projectiles retired, screen clear deployed.
        assert_eq!(w.group_len(GroupId::Sites), 0);
        assert_eq!(w.group_len(GroupId::Bullets), 0);
        // One shockwave from the initial entry, one from the transition.
        let bombs: Vec<_> = w
            .group_ids(GroupId::PlayerBullets)
            .into_iter()
            .filter(|id| w.get(*id).is_some_and(|e| e.name == "screen_clear"))
            .collect();
        assert_eq!(bombs.len(), 2);
        assert!(w.ui_events.iter().any(|e| matches!(
            e,
            UiEvent::RetireBanner { text } if text == "sites"
        )));
    }

    #[test]
    fn test_fight_stops_scroll_and_destruction_restores_it() {
        let mut w = test_world();
        let base = w.scroll_speed;
        let phases = vec![BossPhase::new("only", Vec::new(), 1, None)];
        let mut boss = Boss::new(&mut w, "warlord", Vec2::new(400.0, 150.0), phases,
            movement::stationary(), 5000);
        assert_eq!(w.scroll_speed, 0.0);

        hit(&mut w, &boss);
        boss.update(&mut w);
        assert!(!boss.active);
        assert!(!w.is_alive(boss.entity));
        assert_eq!(w.scroll_speed, base);
        assert!(w.ui_events.iter().any(|e| matches!(
            e,
            UiEvent::DeathEffect { size, .. } if *size == 70.0
        )));
    }
}
