//! Fixed-timestep loop wiring the world to its systems.

use std::{collections::BTreeSet, fmt, time::Duration};

use anyhow::Result;
use glam::Vec2;
use prophecy_core::{Command, EntityId, EntityKind, EntityView, Event, Outcome, RoomKey, RoomView};
use prophecy_rendering::{compose_frame, Color, DrawRequest, FrameStyle, RenderingBackend};
use prophecy_system_boss_patterns::{BossPatterns, Config as BossConfig};
use prophecy_system_enemy_ai::EnemyAi;
use prophecy_system_player_control::{InputFrame, Key, MouseButton, PlayerControl};
use prophecy_world::{self as world, query, World};
use tracing::{debug, info};

use crate::{content::Content, settings::Settings};

const STRIKE_DISTANCE: f32 = 160.0;
const DASH_DISTANCE: f32 = 320.0;
const DASH_EVERY: u64 = 90;
const DEAD_ZONE: f32 = 8.0;

/// Drives one world through its systems for a fixed number of steps.
pub(crate) struct Runner {
    world: World,
    player_control: PlayerControl,
    enemy_ai: EnemyAi,
    boss_patterns: BossPatterns,
    autopilot: Autopilot,
    frame: InputFrame,
    backend: FrameCounter,
    style: FrameStyle,
    pending: Vec<Event>,
    dt: Duration,
    ticks: u64,
    restarts: u32,
    render_every: u64,
    summary: Summary,
}

impl Runner {
    /// Builds the world from `content` and starts the first session.
    pub(crate) fn new(settings: Settings, content: Content) -> Result<Self> {
        let runner = settings.runner;
        let mut world = World::new(settings.world, content.rooms, content.animations)?;
        let mut pending = Vec::new();
        world::apply(&mut world, Command::Reset, &mut pending)?;

        Ok(Self {
            world,
            player_control: PlayerControl::new(),
            enemy_ai: EnemyAi::new(),
            boss_patterns: BossPatterns::new(BossConfig::new(runner.seed)),
            autopilot: Autopilot::default(),
            frame: InputFrame::new(),
            backend: FrameCounter::default(),
            style: FrameStyle::default(),
            pending,
            dt: Duration::from_secs(1) / runner.tick_rate.max(1),
            ticks: runner.ticks,
            restarts: runner.restarts,
            render_every: runner.render_every,
            summary: Summary::default(),
        })
    }

    /// Runs until the step budget is spent or the last session ends.
    pub(crate) fn run(mut self) -> Result<Summary> {
        for step in 0..self.ticks {
            if !self.step(step)? {
                break;
            }
        }
        let pending = std::mem::take(&mut self.pending);
        self.summary.observe(&pending, query::player(&self.world));
        self.summary.frames_drawn = self.backend.frames;
        self.summary.draw_requests = self.backend.requests;
        Ok(self.summary)
    }

    fn step(&mut self, step: u64) -> Result<bool> {
        let view = query::entity_view(&self.world);
        let room = query::room_view(&self.world);
        self.autopilot.drive(&mut self.frame, room.as_ref(), &view);

        let mut events = std::mem::take(&mut self.pending);
        world::apply(&mut self.world, Command::Tick { dt: self.dt }, &mut events)?;
        self.summary.ticks += 1;

        let view = query::entity_view(&self.world);
        let mut commands = Vec::new();
        let signals = self
            .player_control
            .handle(&events, &self.frame, &view, &mut commands);
        if signals.toggle_fullscreen {
            info!("fullscreen toggle requested");
        }
        if signals.pause {
            info!("pause requested");
        }
        self.enemy_ai.handle(&view, &mut commands);
        self.boss_patterns.handle(&events, &view, &mut commands);

        self.summary.observe(&events, query::player(&self.world));
        for command in commands {
            world::apply(&mut self.world, command, &mut self.pending)?;
        }

        if self.render_every > 0 && step % self.render_every == 0 {
            if let Some(room) = query::room_view(&self.world) {
                let entities = query::entity_view(&self.world);
                let _ = compose_frame(
                    &mut self.backend,
                    &self.style,
                    &room,
                    &entities,
                    query::outcome(&self.world),
                )?;
            }
        }

        let Some(outcome) = query::outcome(&self.world) else {
            return Ok(true);
        };
        info!(?outcome, replays = query::replays(&self.world), "session over");
        if self.restarts == 0 {
            return Ok(false);
        }
        self.restarts -= 1;
        world::apply(&mut self.world, Command::Reset, &mut self.pending)?;
        Ok(true)
    }
}

/// Scripted stand-in for a human at the keyboard.
///
/// Walks towards the nearest hostile creature and swings at it; with the
/// room cleared it heads for a door leading somewhere new.
#[derive(Debug, Default)]
struct Autopilot {
    step: u64,
    clicking: bool,
    visited: BTreeSet<RoomKey>,
}

impl Autopilot {
    fn drive(&mut self, frame: &mut InputFrame, room: Option<&RoomView>, view: &EntityView) {
        frame.advance();
        self.step += 1;
        for key in [Key::W, Key::A, Key::S, Key::D, Key::LeftShift] {
            frame.release(key);
        }

        let Some(player) = view.player().filter(|player| player.valid) else {
            frame.set_mouse(MouseButton::Left, false);
            return;
        };
        if let Some(room) = room {
            let _ = self.visited.insert(room.key.clone());
        }
        let center = player.bounds.center();

        let hostile = view
            .iter()
            .filter(|entity| {
                entity.valid && matches!(entity.kind, EntityKind::Enemy | EntityKind::Boss)
            })
            .map(|entity| entity.bounds.center())
            .min_by(|a, b| center.distance(*a).total_cmp(&center.distance(*b)));
        let goal = hostile.or_else(|| room.and_then(|room| self.exit(room)));

        let Some(goal) = goal else {
            frame.set_mouse(MouseButton::Left, false);
            return;
        };
        let offset = goal - center;
        press_towards(frame, offset);

        let distance = offset.length();
        if hostile.is_some() && distance <= STRIKE_DISTANCE {
            self.clicking = !self.clicking;
        } else {
            self.clicking = false;
        }
        frame.set_mouse(MouseButton::Left, self.clicking);
        if distance > DASH_DISTANCE && self.step % DASH_EVERY == 0 {
            frame.press(Key::LeftShift);
        }
    }

    /// Center of a door leading to a room not yet visited, else any door.
    fn exit(&self, room: &RoomView) -> Option<Vec2> {
        let doors = || room.tiles.iter().filter(|tile| tile.leads_to.is_some());
        doors()
            .find(|tile| {
                tile.leads_to
                    .as_ref()
                    .is_some_and(|target| !self.visited.contains(target))
            })
            .or_else(|| doors().next())
            .map(|tile| tile.bounds.center())
    }
}

fn press_towards(frame: &mut InputFrame, offset: Vec2) {
    if offset.x > DEAD_ZONE {
        frame.press(Key::D);
    } else if offset.x < -DEAD_ZONE {
        frame.press(Key::A);
    }
    if offset.y > DEAD_ZONE {
        frame.press(Key::S);
    } else if offset.y < -DEAD_ZONE {
        frame.press(Key::W);
    }
}

/// Headless backend that only counts what it is asked to draw.
#[derive(Debug, Default)]
struct FrameCounter {
    frames: u64,
    requests: u64,
}

impl RenderingBackend for FrameCounter {
    fn begin_frame(&mut self, _clear_color: Color) -> Result<()> {
        Ok(())
    }

    fn submit(&mut self, _request: DrawRequest) -> Result<()> {
        self.requests += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.frames += 1;
        Ok(())
    }
}

/// Totals gathered from the world's events.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    /// Steps simulated.
    pub(crate) ticks: u64,
    /// Result of every finished session, in order.
    pub(crate) outcomes: Vec<Outcome>,
    /// Health the player removed from others.
    pub(crate) damage_dealt: f32,
    /// Health the player lost.
    pub(crate) damage_taken: f32,
    /// Creatures other than the player that died.
    pub(crate) kills: u32,
    /// Projectiles launched by anyone.
    pub(crate) projectiles: u32,
    /// Successful skill casts.
    pub(crate) casts: u32,
    /// Rooms the player entered.
    pub(crate) rooms_entered: u32,
    /// Frames composed for rendering.
    pub(crate) frames_drawn: u64,
    /// Draw requests submitted across all frames.
    pub(crate) draw_requests: u64,
}

impl Summary {
    fn observe(&mut self, events: &[Event], player: Option<EntityId>) {
        for event in events {
            match event {
                Event::Damaged {
                    attacker,
                    target,
                    amount,
                    ..
                } => {
                    if Some(*target) == player {
                        self.damage_taken += amount;
                    } else if Some(*attacker) == player {
                        self.damage_dealt += amount;
                    }
                }
                Event::EntityDied { kind, .. } => {
                    if !matches!(kind, EntityKind::Player | EntityKind::Projectile) {
                        self.kills += 1;
                    }
                }
                Event::ProjectileLaunched { .. } => self.projectiles += 1,
                Event::SkillCast { entity, skill } => {
                    debug!(entity = entity.get(), skill = %skill, "skill cast");
                    self.casts += 1;
                }
                Event::RoomEntered { .. } => self.rooms_entered += 1,
                Event::OutcomeDecided { outcome } => self.outcomes.push(*outcome),
                _ => {}
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks simulated:   {}", self.ticks)?;
        let outcomes: Vec<String> = self
            .outcomes
            .iter()
            .map(|outcome| format!("{outcome:?}"))
            .collect();
        if outcomes.is_empty() {
            writeln!(f, "outcome:           undecided")?;
        } else {
            writeln!(f, "outcomes:          {}", outcomes.join(", "))?;
        }
        writeln!(f, "damage dealt:      {:.1}", self.damage_dealt)?;
        writeln!(f, "damage taken:      {:.1}", self.damage_taken)?;
        writeln!(f, "creatures slain:   {}", self.kills)?;
        writeln!(f, "projectiles:       {}", self.projectiles)?;
        writeln!(f, "skills cast:       {}", self.casts)?;
        writeln!(f, "rooms entered:     {}", self.rooms_entered)?;
        write!(
            f,
            "frames drawn:      {} ({} requests)",
            self.frames_drawn, self.draw_requests
        )
    }
}
