//! Enemy wave formations
//!
//! A [`Formation`] is a declarative bundle of popcorn enemies, big enemies
//! and static firing sites, laid out as offsets from a shared spawn position.
//! The stage scheduler drives it: it spawns once when its time arrives, runs
//! its members every tick, and reports `finished` once everything it put into
//! the world is gone, enemies included.

use glam::Vec2;

use crate::consts::{CANVAS_HEIGHT, SITE_DESPAWN_MARGIN};
use crate::sim::entity::EntityId;
use crate::sim::movement::{MoveCtx, MovementFactory, MovementFn};
use crate::sim::pattern::{AttackPattern, PatternFactory};
use crate::sim::world::World;

/// One popcorn enemy in a formation
pub struct FormationEntry {
    pub sprite: String,
    pub offset: Vec2,
    pub size: Vec2,
    pub movement: MovementFactory,
    pub pattern: PatternFactory,
    /// Quiet period after spawning before the enemy starts firing
    pub fire_delay_ms: u64,
    pub reward: i32,
}

/// One durable enemy that cycles through several patterns
pub struct BigEnemyEntry {
    pub sprite: String,
    pub offset: Vec2,
    pub movement: MovementFactory,
    pub patterns: Vec<PatternFactory>,
    /// Time each pattern runs before cycling to the next
    pub interval_ms: u64,
    pub health: i32,
    pub reward: i32,
}

/// One static firing site that scrolls with the background
pub struct FiringSiteEntry {
    pub offset: Vec2,
    pub pattern: PatternFactory,
    pub reward: i32,
}

enum UnitKind {
    Popcorn {
        pattern: AttackPattern,
        fire_delay_ms: u64,
        spawn_ms: u64,
    },
    Big {
        factories: Vec<PatternFactory>,
        current: Option<AttackPattern>,
        interval_ms: u64,
        index: usize,
        last_switch: u64,
    },
}

/// A spawned formation member and its per-unit controllers
struct Unit {
    entity: EntityId,
    movement: MovementFn,
    kind: UnitKind,
}

pub struct Formation {
    pub name: String,
    pub spawn_position: Vec2,
    /// Multiplier applied to member offsets
    pub scale: f32,
    /// Stage-relative spawn time
    pub spawn_time_ms: u64,
    spawned: bool,
    entries: Vec<FormationEntry>,
    big_entries: Vec<BigEnemyEntry>,
    site_defs: Vec<FiringSiteEntry>,
    units: Vec<Unit>,
    patterns: Vec<AttackPattern>,
    sites: Vec<EntityId>,
}

impl Formation {
    pub fn new(name: &str, spawn_position: Vec2, spawn_time_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            spawn_position,
            scale: 1.0,
            spawn_time_ms,
            spawned: false,
            entries: Vec::new(),
            big_entries: Vec::new(),
            site_defs: Vec::new(),
            units: Vec::new(),
            patterns: Vec::new(),
            sites: Vec::new(),
        }
    }

    pub fn add_popcorn(&mut self, entry: FormationEntry) {
        self.entries.push(entry);
    }

    pub fn add_big_enemy(&mut self, entry: BigEnemyEntry) {
        self.big_entries.push(entry);
    }

    pub fn add_site(&mut self, entry: FiringSiteEntry) {
        self.site_defs.push(entry);
    }

    pub fn spawned(&self) -> bool {
        self.spawned
    }

    /// A formation is done only when everything it spawned is gone: all
    /// member enemies dead or despawned, all sites scrolled off or killed.
    pub fn finished(&self) -> bool {
        self.spawned && self.units.is_empty() && self.sites.is_empty() && self.patterns.is_empty()
    }

    fn spawn(&mut self, world: &mut World) {
        self.spawned = true;
        log::debug!("formation {} spawning at {}", self.name, self.spawn_position);
        for entry in std::mem::take(&mut self.entries) {
            let pos = self.spawn_position + entry.offset * self.scale;
            let id = world.spawn_popcorn(&entry.sprite, pos, entry.size, entry.reward);
            self.units.push(Unit {
                entity: id,
                movement: (entry.movement)(),
                kind: UnitKind::Popcorn {
                    pattern: (entry.pattern)(id),
                    fire_delay_ms: entry.fire_delay_ms,
                    spawn_ms: world.now_ms,
                },
            });
        }
        for entry in std::mem::take(&mut self.big_entries) {
            let pos = self.spawn_position + entry.offset * self.scale;
            let id = world.spawn_big_enemy(&entry.sprite, pos, entry.health, entry.reward);
            let factories = entry.patterns;
            let current = factories.first().map(|f| f(id));
            self.units.push(Unit {
                entity: id,
                movement: (entry.movement)(),
                kind: UnitKind::Big {
                    factories,
                    current,
                    interval_ms: entry.interval_ms,
                    index: 0,
                    last_switch: world.now_ms,
                },
            });
        }
        for entry in std::mem::take(&mut self.site_defs) {
            let pos = self.spawn_position + entry.offset * self.scale;
            let id = world.spawn_site(pos, entry.reward);
            self.sites.push(id);
            self.patterns.push((entry.pattern)(id));
        }
    }

    pub fn update(&mut self, world: &mut World) {
        if !self.spawned {
            if world.now_ms >= self.spawn_time_ms {
                self.spawn(world);
            }
            return;
        }

        let now = world.now_ms;
        let scroll = world.scroll_speed;

        // Sites ride the background scroll and despawn well past the bottom.
        self.sites.retain(|&site| {
            let Some(e) = world.get_mut(site) else { return false };
            if !e.alive {
                return false;
            }
            e.pos.y += scroll;
            if e.pos.y > CANVAS_HEIGHT + SITE_DESPAWN_MARGIN {
                e.alive = false;
                return false;
            }
            true
        });

        self.patterns.retain_mut(|pattern| {
            if pattern.owners_dead(world) {
                pattern.kill_projectiles(world);
                false
            } else {
                pattern.update(world);
                true
            }
        });

        let ctx = MoveCtx { now_ms: now, scroll_speed: scroll };
        self.units.retain_mut(|unit| {
            if !world.is_alive(unit.entity) {
                return false;
            }
            if let Some(e) = world.get_mut(unit.entity) {
                (unit.movement)(e, &ctx);
            }
            match &mut unit.kind {
                UnitKind::Popcorn { pattern, fire_delay_ms, spawn_ms } => {
                    if now.saturating_sub(*spawn_ms) > *fire_delay_ms {
                        pattern.update(world);
                    }
                }
                UnitKind::Big { factories, current, interval_ms, index, last_switch } => {
                    if factories.len() > 1 && now.saturating_sub(*last_switch) >= *interval_ms {
                        // Bullets in flight keep flying; beams come down with
                        // the pattern that owns them.
                        if let Some(c) = current
                            && c.is_laser()
                        {
                            c.kill_projectiles(world);
                        }
                        *index = (*index + 1) % factories.len();
                        *current = Some(factories[*index](unit.entity));
                        *last_switch = now;
                    }
                    if let Some(c) = current {
                        c.update(world);
                    }
                }
            }
            true
        });
    }

    /// Forcibly retire everything this formation put into the world
    pub fn teardown(&mut self, world: &mut World) {
        for pattern in &mut self.patterns {
            pattern.kill_projectiles(world);
        }
        self.patterns.clear();
        for site in self.sites.drain(..) {
            world.kill(site);
        }
        for mut unit in self.units.drain(..) {
            world.kill(unit.entity);
            match &mut unit.kind {
                UnitKind::Popcorn { pattern, .. } => pattern.kill_projectiles(world),
                UnitKind::Big { current, .. } => {
                    if let Some(c) = current {
                        c.kill_projectiles(world);
                    }
                }
            }
        }
    }
}
