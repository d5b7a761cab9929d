//! Stage scripting and scheduling
//!
//! A [`StageHandler`] runs two queues: timed events that fire once when their
//! stage-relative time arrives, and conditional events that fire once when
//! their predicate first holds. Actions receive a [`StageContext`] so they
//! can spawn formations and bosses and flip script flags. [`Stage`] ties the
//! handler to the formation and boss lists and drives them every tick.

use crate::sim::boss::Boss;
use crate::sim::formation::Formation;
use crate::sim::world::World;

/// Progress flags shared between scheduled actions and predicates
#[derive(Debug, Default, Clone, Copy)]
pub struct StageScript {
    pub boss_spawned: bool,
    /// All scheduled waves have spawned and been cleared
    pub waves_done: bool,
    pub stage_complete: bool,
}

/// What a scheduled action may reach
pub struct StageContext<'a> {
    pub world: &'a mut World,
    pub formations: &'a mut Vec<Formation>,
    pub bosses: &'a mut Vec<Boss>,
    pub script: &'a mut StageScript,
}

pub type StageAction = Box<dyn FnMut(&mut StageContext)>;
pub type StagePredicate = Box<dyn Fn(&StageContext) -> bool>;

struct TimedEvent {
    time_ms: u64,
    action: StageAction,
}

struct ConditionalEvent {
    predicate: StagePredicate,
    action: StageAction,
}

/// One-shot event scheduler with a stage-relative clock
#[derive(Default)]
pub struct StageHandler {
    events: Vec<TimedEvent>,
    conditionals: Vec<ConditionalEvent>,
    start_time: u64,
    waves_scheduled: bool,
}

impl StageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once, `delay_ms` after stage start
    pub fn schedule(&mut self, delay_ms: u64, action: StageAction) {
        self.events.push(TimedEvent { time_ms: delay_ms, action });
    }

    /// Run `action` once, on the first tick `predicate` holds
    pub fn wait_until(&mut self, predicate: StagePredicate, action: StageAction) {
        self.conditionals.push(ConditionalEvent { predicate, action });
    }

    /// True once every timed event has fired
    pub fn events_drained(&self) -> bool {
        self.events.is_empty()
    }

    /// Script signal: every wave this stage will run has been scheduled.
    /// Called by the stage author after the last `schedule`; the end-of-waves
    /// state is only reachable once this is set.
    pub fn mark_waves_done(&mut self) {
        self.waves_scheduled = true;
    }

    pub fn all_waves_scheduled(&self) -> bool {
        self.waves_scheduled
    }

    /// Restart the stage clock at `now_ms` and drop all pending events
    pub fn reset(&mut self, now_ms: u64) {
        self.start_time = now_ms;
        self.events.clear();
        self.conditionals.clear();
        self.waves_scheduled = false;
    }

    /// Fire everything that is due. Due events fire in registration order,
    /// several per tick if the clock jumped past more than one.
    pub fn update(&mut self, ctx: &mut StageContext) {
        let current = ctx.world.now_ms.saturating_sub(self.start_time);

        let mut i = 0;
        while i < self.events.len() {
            if current >= self.events[i].time_ms {
                let mut event = self.events.remove(i);
                (event.action)(ctx);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.conditionals.len() {
            if (self.conditionals[i].predicate)(ctx) {
                let mut event = self.conditionals.remove(i);
                (event.action)(ctx);
            } else {
                i += 1;
            }
        }
    }
}

/// A running stage: scheduler, script flags, formations and bosses
#[derive(Default)]
pub struct Stage {
    pub handler: StageHandler,
    pub script: StageScript,
    pub formations: Vec<Formation>,
    pub bosses: Vec<Boss>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// One scheduler pass, then every formation and boss; finished
    /// formations and destroyed bosses are pruned.
    pub fn update(&mut self, world: &mut World) {
        let mut ctx = StageContext {
            world: &mut *world,
            formations: &mut self.formations,
            bosses: &mut self.bosses,
            script: &mut self.script,
        };
        self.handler.update(&mut ctx);

        let mut i = 0;
        while i < self.formations.len() {
            self.formations[i].update(world);
            if self.formations[i].finished() {
                let mut formation = self.formations.remove(i);
                formation.teardown(world);
            } else {
                i += 1;
            }
        }

        for boss in &mut self.bosses {
            boss.update(world);
        }
        self.bosses.retain(|b| b.active);

        if !self.script.waves_done
            && self.handler.all_waves_scheduled()
            && self.handler.events_drained()
            && self.formations.is_empty()
        {
            self.script.waves_done = true;
        }
    }
}
