//! The simulated world.
//!
//! Walkers circle the map and broadcast footstep noise through the spatial
//! router. Guards listen around their posts and raise alerts on the global
//! router when a step is loud enough; an async task consumes those alerts.
//! Every few ticks a hit goes through the combat pipeline on the global
//! router:
//!
//! | Priority | Listener | Effect                                        |
//! |----------|----------|-----------------------------------------------|
//! | Highest  | Shield   | Absorbs the hit, cancels and interrupts       |
//! | Higher   | Armor    | Halves physical damage by overriding the hit  |
//! | Default  | Health   | Applies the (possibly reduced) damage         |
//! | Monitor  | Logger   | Records the final outcome                     |

use gameplay_message_router::{
    ChannelTag, ListenerHandle, ListenerOptions, MessageContext, MessagePriority, MessageRouter,
    MessageType, Payload, RouterConfig, RouterStats, SpatialMessageRouter, TargetId, Vec3,
    WorldContext,
};
use crate::config::SimulationSettings;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const NOISE_CHANNEL: &str = "World.Noise";
pub const FOOTSTEP_CHANNEL: &str = "World.Noise.Footstep";
pub const ALERT_CHANNEL: &str = "AI.Guard.Alerted";
pub const DAMAGE_CHANNEL: &str = "Combat.Damage";

/// Footsteps at least this loud make a guard raise an alert.
const ALERT_LOUDNESS: f32 = 0.8;
const HIT_DAMAGE: u32 = 20;
const STARTING_HEALTH: i64 = 100;
const PATROL_EVERY: u64 = 25;
const PATROL_STEP: f64 = 0.2;

/// Noise made by a walker.
#[derive(Debug, Clone)]
pub struct Footstep {
    pub walker: usize,
    pub loudness: f32,
}

/// Raised by a guard that heard a loud footstep.
#[derive(Debug, Clone)]
pub struct GuardAlerted {
    pub guard: usize,
    pub walker: usize,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    Physical,
    Fire,
}

impl DamageKind {
    pub fn channel(self) -> ChannelTag {
        match self {
            DamageKind::Physical => ChannelTag::new("Combat.Damage.Physical"),
            DamageKind::Fire => ChannelTag::new("Combat.Damage.Fire"),
        }
    }
}

/// A hit travelling through the combat pipeline.
#[derive(Debug, Clone)]
pub struct DamageEvent {
    pub amount: u32,
    pub kind: DamageKind,
}

#[derive(Debug)]
struct Player {
    id: TargetId,
    name: &'static str,
    health: AtomicI64,
    shield_charges: AtomicU32,
}

/// Shared world state. Also answers the routers' liveness questions: a
/// player at zero health is no longer a valid target.
#[derive(Debug)]
struct WorldState {
    active: AtomicBool,
    players: Vec<Player>,
    footsteps_heard: AtomicU64,
    damage_applied: AtomicU64,
    hits_blocked: AtomicU64,
}

impl WorldState {
    fn player(&self, id: TargetId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

impl WorldContext for WorldState {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn is_target_valid(&self, target: TargetId) -> bool {
        self.player(target)
            .is_some_and(|p| p.health.load(Ordering::Acquire) > 0)
    }
}

struct Walker {
    orbit: f64,
    angle: f64,
}

struct Guard {
    angle: f64,
    distance: f64,
    handle: ListenerHandle,
}

impl Guard {
    fn post(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.angle.cos(),
            self.distance * self.angle.sin(),
            0.0,
        )
    }
}

/// Totals gathered over a run.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub ticks: u64,
    pub footsteps_heard: u64,
    pub alerts: u64,
    pub damage_applied: u64,
    pub hits_blocked: u64,
    /// Remaining health per player, by name
    pub health: Vec<(&'static str, i64)>,
    pub global: RouterStats,
    pub spatial: RouterStats,
}

/// The simulated world and the two routers it drives.
pub struct SimWorld {
    settings: SimulationSettings,
    global: MessageRouter,
    spatial: SpatialMessageRouter,
    state: Arc<WorldState>,
    walkers: Vec<Walker>,
    guards: Vec<Guard>,
    alert_task: JoinHandle<u64>,
    footstep_channel: ChannelTag,
    hits: u64,
    ticks: u64,
}

impl SimWorld {
    /// Builds the world and registers every listener. Must be called from
    /// within a Tokio runtime.
    pub fn new(router_config: &RouterConfig, settings: &SimulationSettings) -> Self {
        let global = MessageRouter::with_config(router_config.clone());
        let spatial = SpatialMessageRouter::with_config(router_config.clone());

        let state = Arc::new(WorldState {
            active: AtomicBool::new(true),
            players: vec![
                Player {
                    id: TargetId::new(),
                    name: "Bram",
                    health: AtomicI64::new(STARTING_HEALTH),
                    shield_charges: AtomicU32::new(0),
                },
                Player {
                    id: TargetId::new(),
                    name: "Aria",
                    health: AtomicI64::new(STARTING_HEALTH),
                    shield_charges: AtomicU32::new(3),
                },
            ],
            footsteps_heard: AtomicU64::new(0),
            damage_applied: AtomicU64::new(0),
            hits_blocked: AtomicU64::new(0),
        });
        global.set_world_context(state.clone());
        spatial.set_world_context(state.clone());

        register_combat_pipeline(&global, &state);
        let alert_task = spawn_alert_watcher(&global);

        let walkers = (0..settings.walkers)
            .map(|i| Walker {
                orbit: settings.world_size / 2.0 * (i + 1) as f64 / (settings.walkers + 1) as f64,
                angle: TAU * i as f64 / settings.walkers.max(1) as f64,
            })
            .collect();

        let guards = (0..settings.guards)
            .map(|i| {
                let mut guard = Guard {
                    angle: TAU * i as f64 / settings.guards.max(1) as f64,
                    distance: settings.world_size / 4.0,
                    handle: ListenerHandle::default(),
                };
                guard.handle = register_guard(
                    &spatial,
                    &global,
                    &state,
                    i,
                    guard.post(),
                    settings.hearing_radius,
                );
                guard
            })
            .collect();

        info!(
            "🗺️ World ready: {} walkers, {} guards, {} players",
            settings.walkers,
            settings.guards,
            state.players.len()
        );

        Self {
            settings: settings.clone(),
            global,
            spatial,
            state,
            walkers,
            guards,
            alert_task,
            footstep_channel: ChannelTag::new(FOOTSTEP_CHANNEL),
            hits: 0,
            ticks: 0,
        }
    }

    pub fn global_router(&self) -> &MessageRouter {
        &self.global
    }

    pub fn spatial_router(&self) -> &SpatialMessageRouter {
        &self.spatial
    }

    /// Advances the world by one tick.
    pub fn tick(&mut self, tick: u64) {
        self.ticks += 1;

        for (index, walker) in self.walkers.iter_mut().enumerate() {
            if walker.orbit > 0.0 {
                walker.angle += self.settings.walker_speed / walker.orbit;
            }
            let position = Vec3::new(
                walker.orbit * walker.angle.cos(),
                walker.orbit * walker.angle.sin(),
                0.0,
            );
            let loudness = if (tick + index as u64) % 4 == 0 { 1.0 } else { 0.4 };
            self.spatial.broadcast_at(
                &self.footstep_channel,
                &mut Footstep {
                    walker: index,
                    loudness,
                },
                position,
            );
        }

        if tick % PATROL_EVERY == 0 {
            for guard in &mut self.guards {
                guard.angle += PATROL_STEP;
                let post = guard.post();
                self.spatial.update_location(&guard.handle, post, None);
            }
        }

        if tick % self.settings.damage_every == 0 {
            self.hit();
        }

        if tick % 50 == 0 {
            let stats = self.spatial.stats();
            info!(
                "📊 Tick {} - {} footsteps heard | {} spatial deliveries | {} occupied cells",
                tick,
                self.state.footsteps_heard.load(Ordering::Relaxed),
                stats.deliveries,
                self.spatial.cell_count()
            );
        }
    }

    fn hit(&mut self) {
        self.hits += 1;
        let player = &self.state.players[((self.hits - 1) % self.state.players.len() as u64) as usize];
        let kind = if self.hits % 3 == 0 {
            DamageKind::Fire
        } else {
            DamageKind::Physical
        };

        let mut event = DamageEvent {
            amount: HIT_DAMAGE,
            kind,
        };
        let result = self
            .global
            .broadcast_to(&kind.channel(), &mut event, player.id);
        if result.cancelled {
            debug!("🛡️ Hit on {} was absorbed", player.name);
        }
    }

    /// Stops the world, drops every listener and collects the totals.
    pub async fn finish(self) -> SimulationReport {
        self.state.active.store(false, Ordering::Release);

        let global = self.global.stats();
        let spatial = self.spatial.stats();
        self.global.reset();
        self.spatial.reset();

        // The alert stream ends once its listener is gone.
        let alerts = match self.alert_task.await {
            Ok(count) => count,
            Err(e) => {
                warn!("⚠️ Alert watcher failed: {}", e);
                0
            }
        };

        SimulationReport {
            ticks: self.ticks,
            footsteps_heard: self.state.footsteps_heard.load(Ordering::Relaxed),
            alerts,
            damage_applied: self.state.damage_applied.load(Ordering::Relaxed),
            hits_blocked: self.state.hits_blocked.load(Ordering::Relaxed),
            health: self
                .state
                .players
                .iter()
                .map(|p| (p.name, p.health.load(Ordering::Relaxed)))
                .collect(),
            global,
            spatial,
        }
    }
}

fn register_combat_pipeline(global: &MessageRouter, state: &Arc<WorldState>) {
    for (index, player) in state.players.iter().enumerate() {
        if player.shield_charges.load(Ordering::Relaxed) > 0 {
            let state = state.clone();
            global.register(
                DAMAGE_CHANNEL,
                ListenerOptions::partial()
                    .with_priority(MessagePriority::Highest)
                    .with_target(player.id),
                move |ctx: &mut MessageContext<'_>, _hit: &DamageEvent| {
                    let player = &state.players[index];
                    let absorbed = player
                        .shield_charges
                        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
                        .is_ok();
                    if absorbed {
                        state.hits_blocked.fetch_add(1, Ordering::Relaxed);
                        ctx.cancel_message(true, true);
                    }
                },
            );
        }

        let state = state.clone();
        global.register(
            DAMAGE_CHANNEL,
            ListenerOptions::partial().with_target(player.id),
            move |_ctx: &mut MessageContext<'_>, hit: &DamageEvent| {
                let player = &state.players[index];
                let damage = hit.amount as i64;
                let remaining = player.health.fetch_sub(damage, Ordering::AcqRel) - damage;
                state.damage_applied.fetch_add(hit.amount as u64, Ordering::Relaxed);
                if remaining <= 0 {
                    info!("💀 {} is down", player.name);
                }
            },
        );
    }

    global.register_raw(
        &MessageType::of::<DamageEvent>(),
        DamageKind::Physical.channel(),
        ListenerOptions::partial().with_priority(MessagePriority::Higher),
        Arc::new(|_ctx: &mut MessageContext<'_>, payload: &mut Payload<'_>| {
            let reduced = payload.get::<DamageEvent>().map(|hit| DamageEvent {
                amount: hit.amount / 2,
                kind: hit.kind,
            });
            if let Some(reduced) = reduced {
                payload.override_with(reduced);
            }
        }),
    );

    global.register(
        DAMAGE_CHANNEL,
        ListenerOptions::partial().with_priority(MessagePriority::Monitor),
        |ctx: &mut MessageContext<'_>, hit: &DamageEvent| {
            debug!("📊 {} resolved as {:?} (target {:?})", ctx.channel(), hit, ctx.target());
        },
    );
}

fn spawn_alert_watcher(global: &MessageRouter) -> JoinHandle<u64> {
    let mut alerts = global.listen::<GuardAlerted>(ALERT_CHANNEL, ListenerOptions::default());
    tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(alert) = alerts.recv().await {
            count += 1;
            debug!(
                "🚨 Guard {} heard walker {} at {}",
                alert.payload.guard, alert.payload.walker, alert.payload.position
            );
        }
        count
    })
}

fn register_guard(
    spatial: &SpatialMessageRouter,
    global: &MessageRouter,
    state: &Arc<WorldState>,
    guard: usize,
    post: Vec3,
    hearing_radius: f64,
) -> ListenerHandle {
    let state = state.clone();
    let global = global.clone();
    let alert_channel = ChannelTag::new(ALERT_CHANNEL);

    spatial.register_at(
        NOISE_CHANNEL,
        post,
        hearing_radius,
        ListenerOptions::partial(),
        move |ctx: &mut MessageContext<'_>, step: &Footstep| {
            state.footsteps_heard.fetch_add(1, Ordering::Relaxed);
            if step.loudness >= ALERT_LOUDNESS {
                global.broadcast(
                    &alert_channel,
                    &mut GuardAlerted {
                        guard,
                        walker: step.walker,
                        position: ctx.origin().unwrap_or_default(),
                    },
                );
            }
        },
    )
}
