//! Sprite-sheet animation descriptors and per-entity playback.
//!
//! A sheet is described by a plain-text config whose first line is the cell
//! size `width,height` and whose remaining lines read
//! `row,name,frames,fps,duration`. Defects are logged and skipped; rows the
//! config does not describe are inferred from the sheet itself.

use std::{collections::BTreeMap, collections::HashMap, rc::Rc, time::Duration};

use prophecy_core::{MajorIssue, Rect, SpriteFrame};
use thiserror::Error;
use tracing::{debug, warn};

/// Cell size assumed when the config header is unusable.
pub const DEFAULT_CELL: (u32, u32) = (32, 32);
/// Playback rate assumed when a row omits it.
pub const DEFAULT_FPS: f32 = 10.0;
/// Fastest playback rate a row may ask for.
pub const MAX_FPS: f32 = 1_000.0;
/// Name given to rows without a descriptor.
pub const UNDEFINED_ANIMATION: &str = "Undefined";

const STANDARD_ROWS: [&str; 3] = ["Stand", "Move", "Attack"];

/// Pixel data of a loaded sheet as far as animation setup needs it.
pub trait SpriteSheet {
    /// Width and height of the sheet in pixels.
    fn size(&self) -> (u32, u32);

    /// Reports whether the cell is an empty divider.
    fn is_blank(&self, cell: Rect) -> bool;
}

/// Sheet known only by its size; no cell is ever blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SpriteSheet for SheetSize {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_blank(&self, _cell: Rect) -> bool {
        false
    }
}

/// Recoverable defect found in an animation config.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnimationConfigDefect {
    /// A value could not be parsed.
    #[error("wrong syntax at line {line}")]
    WrongSyntax {
        /// One-based line number.
        line: usize,
    },
    /// Fewer values than `row,name,frames` were given.
    #[error("missing parameters at line {line}")]
    MissingParameters {
        /// One-based line number.
        line: usize,
    },
    /// A timing value was unusable and replaced by its default.
    #[error("timing out of range at line {line}")]
    OutOfRange {
        /// One-based line number.
        line: usize,
    },
}

/// One row of an animation config.
#[derive(Clone, Debug, PartialEq)]
pub struct RowDescriptor {
    /// Zero-based sheet row.
    pub row: u32,
    /// Animation name.
    pub name: String,
    /// Number of frames.
    pub frames: u32,
    /// Frames per second.
    pub fps: f32,
    /// Seconds of playback; zero or less loops forever.
    pub duration: f32,
}

/// Parsed animation config.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Cell size in pixels.
    pub cell: (u32, u32),
    /// Descriptors keyed by row.
    pub rows: BTreeMap<u32, RowDescriptor>,
    /// Defects that were skipped.
    pub defects: Vec<AnimationConfigDefect>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            cell: DEFAULT_CELL,
            rows: BTreeMap::new(),
            defects: Vec::new(),
        }
    }
}

/// Parses an animation config, collecting defects instead of failing.
#[must_use]
pub fn parse_animation_config(text: &str) -> AnimationConfig {
    let mut config = AnimationConfig::default();
    let mut lines = text.lines().enumerate().map(|(index, line)| (index + 1, line));

    if let Some((line, header)) = lines.next() {
        match parse_cell(header) {
            Some(cell) => config.cell = cell,
            None => config.defects.push(AnimationConfigDefect::WrongSyntax { line }),
        }
    }

    for (line, content) in lines {
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            continue;
        }
        match parse_row(&compact, line, &mut config.defects) {
            Ok(descriptor) => {
                let _ = config.rows.insert(descriptor.row, descriptor);
            }
            Err(defect) => config.defects.push(defect),
        }
    }
    config
}

fn parse_cell(header: &str) -> Option<(u32, u32)> {
    let compact: String = header.chars().filter(|c| !c.is_whitespace()).collect();
    let (width, height) = compact.split_once(',')?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

fn parse_row(
    compact: &str,
    line: usize,
    defects: &mut Vec<AnimationConfigDefect>,
) -> Result<RowDescriptor, AnimationConfigDefect> {
    let parts: Vec<&str> = compact.split(',').collect();
    if parts.len() < 3 {
        return Err(AnimationConfigDefect::MissingParameters { line });
    }
    let syntax = || AnimationConfigDefect::WrongSyntax { line };

    let row: u32 = parts[0].parse().map_err(|_| syntax())?;
    let name = parts[1];
    if name.is_empty() {
        return Err(syntax());
    }
    let frames: u32 = parts[2].parse().map_err(|_| syntax())?;
    if frames == 0 {
        return Err(syntax());
    }
    let fps = match parts.get(3).filter(|value| !value.is_empty()) {
        Some(value) => value.parse::<f32>().map_err(|_| syntax())?,
        None => DEFAULT_FPS,
    };
    let fps = if !fps.is_finite() || fps > MAX_FPS {
        defects.push(AnimationConfigDefect::OutOfRange { line });
        DEFAULT_FPS
    } else if fps > 0.0 {
        fps
    } else {
        DEFAULT_FPS
    };
    let duration = match parts.get(4).filter(|value| !value.is_empty()) {
        Some(value) => value.parse::<f32>().map_err(|_| syntax())?,
        None => frames as f32 / fps,
    };
    let duration = if duration.is_finite() {
        duration
    } else {
        defects.push(AnimationConfigDefect::OutOfRange { line });
        frames as f32 / fps
    };

    Ok(RowDescriptor {
        row,
        name: name.to_owned(),
        frames,
        fps,
        duration,
    })
}

/// Playable animation cut from one sheet row.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    row: u32,
    name: String,
    frames: u32,
    fps: f32,
    duration: f32,
}

impl AnimationClip {
    /// Sheet row.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Name used to select the clip.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of frames.
    #[must_use]
    pub const fn frames(&self) -> u32 {
        self.frames
    }

    /// Frames per second.
    #[must_use]
    pub const fn fps(&self) -> f32 {
        self.fps
    }

    /// Reports whether the clip loops instead of ending.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.duration <= 0.0
    }

    fn seconds_per_frame(&self) -> f32 {
        let fps = if self.fps.is_finite() && self.fps > 0.0 {
            self.fps.min(MAX_FPS)
        } else {
            DEFAULT_FPS
        };
        1.0 / fps
    }
}

/// Every clip of one sheet, indexed by row and by name.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSet {
    sheet: String,
    cell: (u32, u32),
    clips: Vec<AnimationClip>,
}

impl AnimationSet {
    /// Builds the clips of `sheet_name` from its config and pixel data.
    #[must_use]
    pub fn build(sheet_name: &str, config: &AnimationConfig, sheet: &dyn SpriteSheet) -> Self {
        let (cell_width, cell_height) = config.cell;
        let (width, height) = sheet.size();
        let columns = width / cell_width;
        let total_rows = height / cell_height;

        let mut clips = Vec::with_capacity(total_rows as usize);
        for row in 0..total_rows {
            let mut clip = match config.rows.get(&row) {
                Some(descriptor) => AnimationClip {
                    row,
                    name: descriptor.name.clone(),
                    frames: descriptor.frames,
                    fps: descriptor.fps,
                    duration: descriptor.duration,
                },
                None => {
                    let frames = leading_frames(sheet, row, columns, config.cell);
                    AnimationClip {
                        row,
                        name: UNDEFINED_ANIMATION.to_owned(),
                        frames,
                        fps: DEFAULT_FPS,
                        duration: frames as f32 / DEFAULT_FPS,
                    }
                }
            };
            if let Some(standard) = STANDARD_ROWS.get(row as usize) {
                clip.name = (*standard).to_owned();
            }
            if clip.frames > columns {
                warn!(
                    sheet = sheet_name,
                    row,
                    frames = clip.frames,
                    columns,
                    "animation has more frames than the sheet has columns"
                );
            }
            clips.push(clip);
        }

        let described = config.rows.keys().filter(|row| **row < total_rows).count();
        if (described as u32) < total_rows {
            warn!(
                sheet = sheet_name,
                loaded = described,
                total = total_rows,
                "insufficient row definitions"
            );
        }
        for row in config.rows.keys().filter(|row| **row >= total_rows) {
            warn!(sheet = sheet_name, row, "descriptor points past the last sheet row");
        }

        Self {
            sheet: sheet_name.to_owned(),
            cell: config.cell,
            clips,
        }
    }

    /// Sheet name.
    #[must_use]
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Clip at sheet row `row`.
    #[must_use]
    pub fn clip_at(&self, row: usize) -> Option<&AnimationClip> {
        self.clips.get(row)
    }

    /// Clip called `name`, ignoring case. The first row wins on duplicates.
    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.index_of(name).and_then(|index| self.clips.get(index))
    }

    /// Number of clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Reports whether the sheet holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.clips
            .iter()
            .position(|clip| clip.name.eq_ignore_ascii_case(name))
    }
}

/// Frames before the first blank cell of a row, at least one.
fn leading_frames(sheet: &dyn SpriteSheet, row: u32, columns: u32, cell: (u32, u32)) -> u32 {
    let (width, height) = (cell.0 as i32, cell.1 as i32);
    let frames = (0..columns)
        .take_while(|column| {
            let area = Rect::new(*column as i32 * width, row as i32 * height, width, height);
            !sheet.is_blank(area)
        })
        .count() as u32;
    frames.max(1)
}

/// Loaded animation sets keyed by case-insensitive sheet name.
#[derive(Clone, Debug, Default)]
pub struct AnimationLibrary {
    sets: HashMap<String, Rc<AnimationSet>>,
}

impl AnimationLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and stores the set for `name`, logging every config defect.
    ///
    /// A missing config falls back to defaults for every row.
    pub fn load(
        &mut self,
        name: &str,
        config: Option<&str>,
        sheet: &dyn SpriteSheet,
    ) -> Rc<AnimationSet> {
        let parsed = match config {
            Some(text) => parse_animation_config(text),
            None => {
                warn!(sheet = name, "animation config missing, using defaults");
                AnimationConfig::default()
            }
        };
        for defect in &parsed.defects {
            warn!(sheet = name, %defect, "animation config defect");
        }
        let set = Rc::new(AnimationSet::build(name, &parsed, sheet));
        let _ = self.sets.insert(name.to_ascii_lowercase(), Rc::clone(&set));
        set
    }

    /// Set loaded under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<AnimationSet>> {
        self.sets.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Number of loaded sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Reports whether nothing has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Per-entity playback state.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    set: Option<Rc<AnimationSet>>,
    current: usize,
    default: usize,
    frame: u32,
    counter: f32,
    fixed: bool,
    fixed_facing: bool,
    facing_left: bool,
}

impl Animator {
    /// Starts playing `default` from `set`.
    pub fn new(set: Rc<AnimationSet>, default: &str) -> Result<Self, MajorIssue> {
        let Some(index) = set.index_of(default) else {
            return Err(MajorIssue::MissingAnimation {
                sheet: set.sheet.clone(),
                animation: default.to_owned(),
            });
        };
        Ok(Self {
            set: Some(set),
            current: index,
            default: index,
            ..Self::default()
        })
    }

    /// Animator without any sheet; every request is refused.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Reports whether the sheet holds an animation called `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.set
            .as_ref()
            .is_some_and(|set| set.index_of(name).is_some())
    }

    /// Name of the playing animation.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.set
            .as_ref()
            .and_then(|set| set.clips.get(self.current))
            .map(AnimationClip::name)
    }

    /// Index of the displayed frame.
    #[must_use]
    pub const fn frame_index(&self) -> u32 {
        self.frame
    }

    /// Switches to `name`.
    ///
    /// Refused while a different animation is fixed unless `ignore_fixed`, and
    /// refused for the playing animation unless `can_be_same`. A successful
    /// switch restarts playback at the first frame.
    pub fn set_animation(&mut self, name: &str, can_be_same: bool, ignore_fixed: bool) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        let Some(index) = set.index_of(name) else {
            debug!(sheet = %set.sheet, animation = name, "animation not found");
            return false;
        };
        if self.fixed && !ignore_fixed && index != self.current {
            return false;
        }
        if index == self.current && !can_be_same {
            return false;
        }
        self.current = index;
        self.frame = 0;
        self.counter = 0.0;
        true
    }

    /// Locks the playing animation against ordinary switches.
    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    /// Reports whether the playing animation is locked.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Locks the facing against [`Animator::face`].
    pub fn set_fixed_facing(&mut self, fixed: bool) {
        self.fixed_facing = fixed;
    }

    /// Turns toward the sign of `horizontal` unless facing is locked.
    pub fn face(&mut self, horizontal: f32) {
        if self.fixed_facing {
            return;
        }
        if horizontal < 0.0 {
            self.facing_left = true;
        } else if horizontal > 0.0 {
            self.facing_left = false;
        }
    }

    /// Advances playback by `dt`.
    ///
    /// When a finite animation other than the default runs past its last
    /// frame, playback returns to the default animation, both locks are
    /// released, and the name of the finished animation is returned.
    pub fn advance(&mut self, dt: Duration) -> Option<String> {
        let set = Rc::clone(self.set.as_ref()?);
        self.counter += dt.as_secs_f32();

        let mut expired = None;
        if let Some(clip) = set.clips.get(self.current) {
            if !clip.is_continuous() && self.current != self.default {
                let per_frame = clip.seconds_per_frame();
                let pending = (self.counter / per_frame) as u32;
                let last = clip.frames.saturating_sub(1);
                if self.frame.saturating_add(pending) > last {
                    let carry = self.counter - (last - self.frame + 1) as f32 * per_frame;
                    self.fixed = false;
                    self.fixed_facing = false;
                    let name = clip.name.clone();
                    let default = set.clips[self.default].name.clone();
                    if self.set_animation(&default, false, false) {
                        self.counter = carry.max(0.0);
                    }
                    expired = Some(name);
                }
            }
        }

        if let Some(clip) = set.clips.get(self.current) {
            let per_frame = clip.seconds_per_frame();
            let steps = (self.counter / per_frame).floor();
            if steps >= 1.0 {
                self.counter -= steps * per_frame;
                let frames = clip.frames.max(1);
                let steps = (steps as u64 % u64::from(frames)) as u32;
                self.frame = (self.frame % frames + steps) % frames;
            }
        }
        expired
    }

    /// Sheet cell currently displayed.
    #[must_use]
    pub fn frame(&self) -> Option<SpriteFrame> {
        let set = self.set.as_ref()?;
        let clip = set.clips.get(self.current)?;
        let (width, height) = (set.cell.0 as i32, set.cell.1 as i32);
        Some(SpriteFrame {
            sheet: set.sheet.clone(),
            animation: clip.name.clone(),
            source: Rect::new(
                self.frame as i32 * width,
                clip.row as i32 * height,
                width,
                height,
            ),
            flip_horizontal: self.facing_left,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "32, 32\n0,Idle,4,8,0\n1,Walk,6\n3,Death,3,10,0.3\n4,Hurt,2,20,0.1\n";

    fn sheet() -> SheetSize {
        SheetSize {
            width: 32 * 6,
            height: 32 * 5,
        }
    }

    fn set() -> Rc<AnimationSet> {
        Rc::new(AnimationSet::build(
            "Hero",
            &parse_animation_config(CONFIG),
            &sheet(),
        ))
    }

    #[test]
    fn parses_header_and_rows_with_defaults() {
        let config = parse_animation_config(CONFIG);
        assert_eq!(config.cell, (32, 32));
        assert!(config.defects.is_empty());
        let walk = &config.rows[&1];
        assert_eq!(walk.fps, DEFAULT_FPS);
        assert!((walk.duration - 0.6).abs() < 1e-6);
    }

    #[test]
    fn malformed_lines_are_reported_and_skipped() {
        let config = parse_animation_config("16 x 16\n0,Idle\nfoo,Bar,2\n2,Cast,3,12,1\n");
        assert_eq!(config.cell, DEFAULT_CELL);
        assert_eq!(
            config.defects,
            vec![
                AnimationConfigDefect::WrongSyntax { line: 1 },
                AnimationConfigDefect::MissingParameters { line: 2 },
                AnimationConfigDefect::WrongSyntax { line: 3 },
            ]
        );
        assert_eq!(config.rows.len(), 1);
    }

    #[test]
    fn unusable_timings_fall_back_to_defaults() {
        let config = parse_animation_config("32, 32\n0,Stand,4,inf\n1,Move,4,1e30\n2,Attack,4,8,inf\n");
        assert_eq!(
            config.defects,
            vec![
                AnimationConfigDefect::OutOfRange { line: 2 },
                AnimationConfigDefect::OutOfRange { line: 3 },
                AnimationConfigDefect::OutOfRange { line: 4 },
            ]
        );
        assert_eq!(config.rows[&0].fps, DEFAULT_FPS);
        assert_eq!(config.rows[&1].fps, DEFAULT_FPS);
        assert!((config.rows[&2].duration - 0.5).abs() < 1e-6);

        let set = Rc::new(AnimationSet::build("Broken", &config, &sheet()));
        let mut animator = Animator::new(set, "Stand").expect("default exists");
        let _ = animator.advance(Duration::from_millis(250));
        assert_eq!(animator.frame_index(), 2);
    }

    #[test]
    fn standard_rows_are_renamed_and_gaps_inferred() {
        let set = set();
        assert_eq!(set.len(), 5);
        assert_eq!(set.clip_at(0).map(AnimationClip::name), Some("Stand"));
        assert_eq!(set.clip_at(1).map(AnimationClip::name), Some("Move"));
        let inferred = set.clip_at(2).expect("row 2");
        assert_eq!(inferred.name(), "Attack");
        assert_eq!(inferred.frames(), 6, "no blank cells on a size-only sheet");
        assert!(set.clip("death").is_some(), "lookup ignores case");
    }

    #[test]
    fn blank_cells_end_inferred_rows() {
        struct Divided;
        impl SpriteSheet for Divided {
            fn size(&self) -> (u32, u32) {
                (32 * 8, 32 * 4)
            }
            fn is_blank(&self, cell: Rect) -> bool {
                cell.y == 96 && cell.x >= 96
            }
        }
        let set = AnimationSet::build("Divided", &AnimationConfig::default(), &Divided);
        let clip = set.clip_at(3).expect("row 3");
        assert_eq!(clip.name(), UNDEFINED_ANIMATION);
        assert_eq!(clip.frames(), 3);
    }

    #[test]
    fn fixed_animation_blocks_ordinary_switches() {
        let mut animator = Animator::new(set(), "Stand").expect("default exists");
        assert!(!animator.set_animation("Stand", false, false), "same animation");
        assert!(animator.set_animation("Hurt", true, false));
        animator.set_fixed(true);
        assert!(!animator.set_animation("Move", false, false));
        assert!(animator.set_animation("Death", false, true));
        assert!(!animator.set_animation("Missing", true, true));
    }

    #[test]
    fn finite_animation_returns_to_default_and_reports_expiry() {
        let mut animator = Animator::new(set(), "Stand").expect("default exists");
        assert!(animator.set_animation("Hurt", true, false));
        animator.set_fixed(true);
        animator.set_fixed_facing(true);

        assert_eq!(animator.advance(Duration::from_millis(60)), None);
        assert_eq!(animator.frame_index(), 1);
        assert_eq!(animator.advance(Duration::from_millis(60)), Some("Hurt".to_owned()));
        assert_eq!(animator.current(), Some("Stand"));
        assert!(!animator.is_fixed());
    }

    #[test]
    fn continuous_animation_wraps() {
        let mut animator = Animator::new(set(), "Stand").expect("default exists");
        assert_eq!(animator.advance(Duration::from_millis(625)), None);
        assert_eq!(animator.frame_index(), 1, "five frames at 8 fps wrap past four");
    }

    #[test]
    fn missing_default_is_a_major_issue() {
        assert!(matches!(
            Animator::new(set(), "Fly"),
            Err(MajorIssue::MissingAnimation { .. })
        ));
    }

    #[test]
    fn frame_points_at_current_cell() {
        let mut animator = Animator::new(set(), "Stand").expect("default exists");
        assert!(animator.set_animation("Move", false, false));
        animator.face(-1.0);
        let _ = animator.advance(Duration::from_millis(100));
        let frame = animator.frame().expect("frame");
        assert_eq!(frame.source, Rect::new(32, 32, 32, 32));
        assert!(frame.flip_horizontal);
    }
}
