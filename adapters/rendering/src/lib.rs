#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Prophecy adapters.
//!
//! Backends receive [`DrawRequest`]s and composite them without feeding
//! anything back into the simulation. [`compose_frame`] turns world views
//! into requests so every backend draws the same frame.

use anyhow::Result as AnyResult;
use glam::Vec2;
use prophecy_core::{EntityKind, EntitySnapshot, EntityView, Outcome, Rect, RoomView, TileKind};
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white; leaves sprites untinted.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// What a request draws.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawHandle {
    /// A cell of the named sprite sheet.
    Sprite {
        /// Sheet name as loaded by the asset collaborator.
        sheet: String,
        /// Area of the sheet to copy.
        source: Rect,
    },
    /// Terrain texture for the tile category.
    Tile(TileKind),
    /// Untextured rectangle filled with the tint.
    Solid,
    /// A line of text drawn at the destination's top-left corner.
    Text(String),
}

/// Mirroring applied to a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    /// Mirror along the vertical axis.
    pub horizontal: bool,
    /// Mirror along the horizontal axis.
    pub vertical: bool,
}

/// Layer key; requests with larger keys are drawn on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawOrder(u32);

impl DrawOrder {
    /// Raw key value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Hands out strictly increasing draw-order keys for one frame.
#[derive(Debug, Default)]
pub struct DrawOrderKeys {
    next: u32,
}

impl DrawOrderKeys {
    /// Starts a frame at key zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next key; no two calls on one instance share a key.
    pub fn next_key(&mut self) -> DrawOrder {
        let key = DrawOrder(self.next);
        self.next = self.next.saturating_add(1);
        key
    }
}

/// Single visual submitted to a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRequest {
    /// What to draw.
    pub handle: DrawHandle,
    /// Where to draw it, in world pixels.
    pub destination: Rect,
    /// Multiplicative tint.
    pub tint: Color,
    /// Clockwise rotation in radians around the destination center.
    pub rotation: f32,
    /// Per-axis scale applied around the destination center.
    pub scale: Vec2,
    /// Mirroring.
    pub flip: Flip,
    /// Layer key.
    pub order: DrawOrder,
}

impl DrawRequest {
    /// Creates an untinted, unrotated request.
    #[must_use]
    pub fn new(handle: DrawHandle, destination: Rect, order: DrawOrder) -> Self {
        Self {
            handle,
            destination,
            tint: Color::WHITE,
            rotation: 0.0,
            scale: Vec2::ONE,
            flip: Flip::default(),
            order,
        }
    }

    /// Replaces the tint.
    #[must_use]
    pub fn tinted(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    /// Replaces the mirroring.
    #[must_use]
    pub fn flipped(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }
}

/// Colors and sizes used by [`compose_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Tint applied to wall tiles.
    pub wall: Color,
    /// Tint applied to floor tiles.
    pub floor: Color,
    /// Tint applied to door tiles.
    pub door: Color,
    /// Fill used for entities without a sprite frame.
    pub placeholder: Color,
    /// Background of health bars.
    pub health_back: Color,
    /// Remaining-health portion of health bars.
    pub health_fill: Color,
    /// Height of health bars in pixels.
    pub health_bar_height: i32,
    /// Gap between a health bar and the entity below it.
    pub health_bar_gap: i32,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            clear_color: Color::from_rgb_u8(0x10, 0x10, 0x18),
            wall: Color::from_rgb_u8(0x4a, 0x46, 0x52),
            floor: Color::WHITE,
            door: Color::from_rgb_u8(0xc8, 0xa0, 0x5a),
            placeholder: Color::from_rgb_u8(0xd0, 0x40, 0x40),
            health_back: Color::from_rgb_u8(0x30, 0x0c, 0x0c),
            health_fill: Color::from_rgb_u8(0xd8, 0x28, 0x28),
            health_bar_height: 8,
            health_bar_gap: 4,
        }
    }
}

/// Rendering backend capable of presenting Prophecy frames.
pub trait RenderingBackend {
    /// Starts a frame cleared to `clear_color`.
    fn begin_frame(&mut self, clear_color: Color) -> AnyResult<()>;

    /// Queues a request for the current frame.
    fn submit(&mut self, request: DrawRequest) -> AnyResult<()>;

    /// Presents the current frame.
    fn end_frame(&mut self) -> AnyResult<()>;
}

/// Backend that keeps every presented frame in memory.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    frames: Vec<RecordedFrame>,
    current: Option<RecordedFrame>,
}

/// Frame captured by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedFrame {
    /// Color the frame was cleared to.
    pub clear_color: Color,
    /// Requests in submission order.
    pub requests: Vec<DrawRequest>,
}

impl RecordingBackend {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented so far.
    #[must_use]
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Most recently presented frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }
}

impl RenderingBackend for RecordingBackend {
    fn begin_frame(&mut self, clear_color: Color) -> AnyResult<()> {
        if self.current.is_some() {
            return Err(RenderingError::FrameAlreadyOpen.into());
        }
        self.current = Some(RecordedFrame {
            clear_color,
            requests: Vec::new(),
        });
        Ok(())
    }

    fn submit(&mut self, request: DrawRequest) -> AnyResult<()> {
        let frame = self.current.as_mut().ok_or(RenderingError::NoOpenFrame)?;
        if let Some(last) = frame.requests.last() {
            if request.order <= last.order {
                return Err(RenderingError::OrderNotIncreasing {
                    previous: last.order.get(),
                    received: request.order.get(),
                }
                .into());
            }
        }
        frame.requests.push(request);
        Ok(())
    }

    fn end_frame(&mut self) -> AnyResult<()> {
        let frame = self.current.take().ok_or(RenderingError::NoOpenFrame)?;
        self.frames.push(frame);
        Ok(())
    }
}

/// Submits one frame showing `room`, the `entities` inside it and, once the
/// session is over, its `outcome`.
///
/// Tiles are drawn first, then entities from the top of the room down, each
/// non-player creature followed by its health bar. Returns the number of
/// submitted requests.
pub fn compose_frame<B>(
    backend: &mut B,
    style: &FrameStyle,
    room: &RoomView,
    entities: &EntityView,
    outcome: Option<Outcome>,
) -> AnyResult<usize>
where
    B: RenderingBackend + ?Sized,
{
    let mut keys = DrawOrderKeys::new();
    let mut submitted = 0;
    backend.begin_frame(style.clear_color)?;

    for tile in &room.tiles {
        let tint = match tile.kind {
            TileKind::Wall => style.wall,
            TileKind::Floor => style.floor,
            TileKind::Door(_) => style.door,
        };
        backend.submit(
            DrawRequest::new(DrawHandle::Tile(tile.kind), tile.bounds, keys.next_key()).tinted(tint),
        )?;
        submitted += 1;
    }

    let mut visible: Vec<&EntitySnapshot> = entities.iter().filter(|entity| entity.visible).collect();
    visible.sort_by_key(|entity| (entity.bounds.bottom(), entity.id));
    for entity in visible {
        backend.submit(entity_request(style, entity, keys.next_key()))?;
        submitted += 1;
        if shows_health_bar(entity) {
            for request in health_bar(style, entity, &mut keys) {
                backend.submit(request)?;
                submitted += 1;
            }
        }
    }

    if let Some(outcome) = outcome {
        let banner = match outcome {
            Outcome::Victory => "Victory",
            Outcome::Defeat => "Defeat",
        };
        let anchor = Rect::new(room.bounds.x, room.bounds.y, room.bounds.width, 0);
        backend.submit(DrawRequest::new(
            DrawHandle::Text(banner.to_owned()),
            anchor,
            keys.next_key(),
        ))?;
        submitted += 1;
    }

    backend.end_frame()?;
    Ok(submitted)
}

fn entity_request(style: &FrameStyle, entity: &EntitySnapshot, order: DrawOrder) -> DrawRequest {
    match &entity.frame {
        Some(frame) => DrawRequest::new(
            DrawHandle::Sprite {
                sheet: frame.sheet.clone(),
                source: frame.source,
            },
            entity.bounds,
            order,
        )
        .flipped(Flip {
            horizontal: frame.flip_horizontal,
            vertical: false,
        }),
        None => DrawRequest::new(DrawHandle::Solid, entity.bounds, order).tinted(style.placeholder),
    }
}

fn shows_health_bar(entity: &EntitySnapshot) -> bool {
    entity.valid && !matches!(entity.kind, EntityKind::Player | EntityKind::Projectile)
}

fn health_bar(
    style: &FrameStyle,
    entity: &EntitySnapshot,
    keys: &mut DrawOrderKeys,
) -> [DrawRequest; 2] {
    let bounds = entity.bounds;
    let back = Rect::new(
        bounds.x,
        bounds.y - style.health_bar_gap - style.health_bar_height,
        bounds.width,
        style.health_bar_height,
    );
    let ratio = if entity.max_health > 0.0 {
        (entity.health / entity.max_health).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let fill = Rect::new(
        back.x,
        back.y,
        (back.width as f32 * ratio).round() as i32,
        back.height,
    );
    [
        DrawRequest::new(DrawHandle::Solid, back, keys.next_key()).tinted(style.health_back),
        DrawRequest::new(DrawHandle::Solid, fill, keys.next_key()).tinted(style.health_fill),
    ]
}

/// Errors raised by backends that validate their call sequence.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// A request or frame end arrived outside a frame.
    NoOpenFrame,
    /// A frame was started before the previous one ended.
    FrameAlreadyOpen,
    /// A request reused or lowered the previous draw-order key.
    OrderNotIncreasing {
        /// Key of the previous request.
        previous: u32,
        /// Key of the rejected request.
        received: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOpenFrame => write!(f, "no frame is open"),
            Self::FrameAlreadyOpen => write!(f, "the previous frame was never ended"),
            Self::OrderNotIncreasing { previous, received } => write!(
                f,
                "draw order must increase within a frame (previous {previous}, received {received})"
            ),
        }
    }
}

impl Error for RenderingError {}
