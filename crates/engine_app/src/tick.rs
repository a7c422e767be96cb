//! Demo tick loop.
//!
//! Each tick runs a fixed sequence of passes over a particle world:
//!
//! 1. Integrate transforms of awake particles.
//! 2. Age lifetimes through a join cache and tag expired particles.
//! 3. Remove expired particles, remembering where they died.
//! 4. Apply removals and leave debris where particles died.
//! 5. Put a rotating subset of particles to sleep for the next tick.

use std::time::Instant;

use glam::Vec3;
use serde::Serialize;
use tracing::{debug, info};

use engine_component::{Absent, Entity};
use engine_select::{LiveContext, SelectError, ops};
use engine_store::{EntityStore, StoreConfig, StoreError, World};

use crate::components::{Expired, Lifetime, Sleeping, Transform, Velocity};

/// Particles in this many groups take turns sleeping.
const SLEEP_GROUPS: u64 = 5;

/// Configuration for the demo tick loop.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Target ticks per second; sets the time step.
    pub tick_rate: f32,
    /// Number of ticks to run.
    pub ticks: u64,
    /// Particles spawned before the first tick.
    pub entities: usize,
    /// Store configuration.
    pub store: StoreConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            ticks: 3,
            entities: 1000,
            store: StoreConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Override the number of particles.
    #[must_use]
    pub fn with_entities(mut self, entities: usize) -> Self {
        self.entities = entities;
        self
    }

    /// Override the number of ticks.
    #[must_use]
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    /// Override the tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Override the store configuration.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TickReport {
    /// Tick counter after this tick.
    pub tick_id: u64,
    /// Particles integrated.
    pub moved: usize,
    /// Particles whose lifetime ran out.
    pub expired: usize,
    /// Entities purged by the store update.
    pub removed: usize,
    /// Debris entities created.
    pub debris: usize,
    /// Particles put to sleep for the next tick.
    pub sleeping: usize,
    /// Live entities after the tick.
    pub live: usize,
    /// Mean position over every transform.
    pub mean_position: [f32; 3],
}

/// The demo's tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    /// Loop configuration.
    config: DemoConfig,
    /// The simulated world.
    world: World,
}

impl TickLoop {
    /// Create a tick loop over an empty world.
    #[must_use]
    pub fn new(config: DemoConfig) -> Self {
        let world = World::with_config(config.store.clone());
        Self {
            tick_id: 0,
            config,
            world,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spawn the configured number of particles.
    ///
    /// Every fourth particle is immortal and carries no lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if a component type fails to register.
    pub fn populate(&mut self) -> Result<(), StoreError> {
        self.world.register::<Sleeping>()?;
        self.world.register::<Expired>()?;
        for i in 0..self.config.entities {
            let transform = Transform::from_position(Vec3::new(i as f32, 0.0, 0.0));
            let velocity = Velocity(Vec3::Y * ((i % 3) as f32 + 1.0));
            if i % 4 == 3 {
                self.world.spawn((transform, velocity))?;
            } else {
                let lifetime = Lifetime(0.01 + (i % 10) as f32 * 0.01);
                self.world.spawn((transform, velocity, lifetime))?;
            }
        }
        info!(
            entities = self.config.entities,
            components = self.world.registry().len(),
            "world populated"
        );
        Ok(())
    }

    /// Run one tick with time step `dt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has no room for the aging cache.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, SelectError> {
        self.tick_id += 1;
        let mut report = TickReport {
            tick_id: self.tick_id,
            ..TickReport::default()
        };

        ops::select::<(Transform, Velocity, Absent<Sleeping>), _>(&mut self.world).for_each(
            |view| {
                let velocity = view.get::<Velocity>().0;
                let transform = view.get_mut::<Transform>();
                *transform = transform.translated(velocity * dt);
                report.moved += 1;
            },
        );

        {
            let mut aging = ops::cache::<(Lifetime, Transform), _>(&mut self.world)?;
            ops::cached_select::<(Lifetime,), _, _>(&mut aging).for_each(|view| {
                let left = {
                    let lifetime = view.get_mut::<Lifetime>();
                    lifetime.0 -= dt;
                    lifetime.0
                };
                if left <= 0.0 {
                    view.enable_tag::<Expired>();
                    report.expired += 1;
                }
            });
            debug!(tick_id = self.tick_id, aged = aging.len(), "aged lifetimes");
        }

        let mut graves = Vec::new();
        ops::select::<(Expired, Transform), _>(&mut self.world).for_each(|view| {
            graves.push(view.get::<Transform>().position);
            view.remove();
        });
        report.removed = self.world.update();

        let mut ctx = LiveContext::new(&mut self.world);
        for position in graves {
            let mut view = ops::create_entity::<Transform, _>(&mut ctx);
            if !view.invalid() {
                view.get_mut::<Transform>().position = position;
                report.debris += 1;
            }
        }

        ops::clear_type::<Sleeping, _>(&mut self.world);
        let group = self.tick_id % SLEEP_GROUPS;
        let sleepers: Vec<Entity> = self
            .world
            .entities()
            .iter()
            .copied()
            .filter(|entity| entity.id() % SLEEP_GROUPS == group)
            .collect();
        ops::group_enable::<Sleeping, _>(&mut self.world, &sleepers);
        report.sleeping = ops::count::<Sleeping, _>(&self.world);

        report.live = ops::count::<Entity, _>(&self.world);
        let transforms = ops::array::<Transform, _>(&self.world);
        if !transforms.is_empty() {
            let sum: Vec3 = transforms.iter().map(|t| t.position).sum();
            report.mean_position = (sum / transforms.count() as f32).to_array();
        }

        debug!(
            tick_id = self.tick_id,
            moved = report.moved,
            expired = report.expired,
            live = report.live,
            "tick complete"
        );
        Ok(report)
    }

    /// Run the configured number of ticks.
    ///
    /// # Errors
    ///
    /// Stops at the first tick that fails.
    pub fn run(&mut self) -> Result<Vec<TickReport>, SelectError> {
        let dt = 1.0 / self.config.tick_rate;
        info!(
            tick_rate = self.config.tick_rate,
            ticks = self.config.ticks,
            "starting tick loop"
        );

        let mut reports = Vec::with_capacity(self.config.ticks as usize);
        for _ in 0..self.config.ticks {
            let start = Instant::now();
            let report = self.tick(dt)?;
            info!(
                tick_id = report.tick_id,
                moved = report.moved,
                expired = report.expired,
                debris = report.debris,
                live = report.live,
                elapsed_us = start.elapsed().as_micros() as u64,
                "tick"
            );
            reports.push(report);
        }
        Ok(reports)
    }
}
