// ABOUTME: Popover visibility state machine plus the resize drag and snap animation it drives
// ABOUTME: Consumes UI events and returns Effects; applying them to real windows is the shell's job

use crate::config::Preferences;
use crate::geometry::{Frame, Point};
use crate::preferences::PreferenceChange;
use crate::preset::SizePreset;
use crate::resize::{DragSession, SnapAnimation};
use std::time::{Duration, Instant};

/// A status-item click arriving this soon after an automatic dismissal is the
/// same click that caused the focus loss, so it must not re-open the popover.
pub const REOPEN_GUARD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverState {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopoverEvent {
    IconPressed {
        button: PointerButton,
        icon_frame: Option<Frame>,
    },
    OutsidePointerDown(Point),
    FocusLost,
    PreferencesChanged(PreferenceChange),
    DragBegan,
    /// Net downward displacement since the drag began.
    DragMoved(f64),
    DragEnded(f64),
    DragCancelled(f64),
    AnimationTick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Show(Frame),
    Hide,
    SetFrame(Frame),
    FreezeContent,
    ThawContent,
    /// The drag settled on a preset other than the stored one.
    CommitPreset(SizePreset),
}

#[derive(Debug)]
pub struct PopoverController {
    state: PopoverState,
    frame: Option<Frame>,
    icon_frame: Option<Frame>,
    drag: Option<DragSession>,
    animation: Option<SnapAnimation>,
    frozen: bool,
    auto_dismissed_at: Option<Instant>,
}

impl Default for PopoverController {
    fn default() -> Self {
        Self::new()
    }
}

impl PopoverController {
    pub fn new() -> Self {
        Self {
            state: PopoverState::Hidden,
            frame: None,
            icon_frame: None,
            drag: None,
            animation: None,
            frozen: false,
            auto_dismissed_at: None,
        }
    }

    pub fn state(&self) -> PopoverState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.state == PopoverState::Shown
    }

    #[cfg(test)]
    pub fn frame(&self) -> Option<Frame> {
        self.frame
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// `prefs` is read at event time so a focus-retention toggle applies to
    /// the very next outside click.
    pub fn handle(&mut self, event: PopoverEvent, prefs: &Preferences, now: Instant) -> Vec<Effect> {
        match event {
            PopoverEvent::IconPressed { button, icon_frame } => {
                if icon_frame.is_some() {
                    self.icon_frame = icon_frame;
                }
                match button {
                    PointerButton::Primary => self.toggle(prefs, now),
                    PointerButton::Secondary => {
                        tracing::debug!("Secondary click on status item, context menu only");
                        Vec::new()
                    }
                }
            }

            PopoverEvent::OutsidePointerDown(point) => {
                if !self.is_shown() || prefs.retain_focus || self.hit_test(point) {
                    return Vec::new();
                }
                tracing::debug!(x = point.x, y = point.y, "Pointer down outside popover");
                self.auto_dismiss(now)
            }

            PopoverEvent::FocusLost => {
                if !self.is_shown() || prefs.retain_focus {
                    return Vec::new();
                }
                tracing::debug!("Popover lost focus");
                self.auto_dismiss(now)
            }

            PopoverEvent::PreferencesChanged(change) => self.apply_preference(change),

            PopoverEvent::DragBegan => self.begin_drag(prefs),

            PopoverEvent::DragMoved(downward) => {
                let shown = self.is_shown();
                match self.drag.as_ref() {
                    Some(session) if shown => {
                        let frame = session.update(downward);
                        self.frame = Some(frame);
                        vec![Effect::SetFrame(frame)]
                    }
                    _ => Vec::new(),
                }
            }

            PopoverEvent::DragEnded(downward) => self.end_drag(downward, prefs, now),

            // Cancelled drags snap exactly like released ones.
            PopoverEvent::DragCancelled(downward) => self.end_drag(downward, prefs, now),

            PopoverEvent::AnimationTick => self.tick(now),
        }
    }

    fn toggle(&mut self, prefs: &Preferences, now: Instant) -> Vec<Effect> {
        if self.is_shown() {
            return self.hide();
        }

        if let Some(dismissed) = self.auto_dismissed_at.take() {
            if now.saturating_duration_since(dismissed) < REOPEN_GUARD {
                tracing::debug!("Ignoring status item click that closed the popover");
                return Vec::new();
            }
        }

        let size = prefs.size_preset.content_size();
        let frame = match self.icon_frame {
            Some(icon) => Frame::anchored_below(icon, size),
            None => self
                .frame
                .map(|previous| previous.with_size(size))
                .unwrap_or_else(|| Frame::new(Point::default(), size)),
        };

        self.state = PopoverState::Shown;
        self.frame = Some(frame);
        tracing::info!(preset = %prefs.size_preset, "Popover shown");
        vec![Effect::Show(frame)]
    }

    fn auto_dismiss(&mut self, now: Instant) -> Vec<Effect> {
        self.auto_dismissed_at = Some(now);
        self.hide()
    }

    fn hide(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.drag.take().is_some() {
            tracing::debug!("Discarding drag session on hide");
        }
        if let Some(animation) = self.animation.take() {
            self.frame = Some(animation.to);
        }
        if self.frozen {
            self.frozen = false;
            effects.push(Effect::ThawContent);
        }

        self.state = PopoverState::Hidden;
        tracing::info!("Popover hidden");
        effects.push(Effect::Hide);
        effects
    }

    fn hit_test(&self, point: Point) -> bool {
        let in_popover = self.frame.is_some_and(|frame| frame.contains(point));
        let on_icon = self.icon_frame.is_some_and(|icon| icon.contains(point));
        in_popover || on_icon
    }

    fn apply_preference(&mut self, change: PreferenceChange) -> Vec<Effect> {
        match change {
            PreferenceChange::RetainFocus(retain) => {
                tracing::debug!(retain, "Focus retention updated");
                Vec::new()
            }
            PreferenceChange::SizePreset(preset) => {
                // A running drag or snap already owns the geometry.
                if !self.is_shown() || self.drag.is_some() || self.animation.is_some() {
                    return Vec::new();
                }
                let Some(frame) = self.frame else {
                    return Vec::new();
                };
                let target = frame.with_size(preset.content_size());
                if target == frame {
                    return Vec::new();
                }
                self.frame = Some(target);
                vec![Effect::SetFrame(target)]
            }
        }
    }

    fn begin_drag(&mut self, prefs: &Preferences) -> Vec<Effect> {
        let Some(frame) = self.frame.filter(|_| self.is_shown()) else {
            return Vec::new();
        };
        if self.drag.is_some() {
            return Vec::new();
        }

        // Grabbing the handle mid-snap starts from where the snap was headed.
        let start_frame = match self.animation.take() {
            Some(animation) => animation.to,
            None => frame,
        };
        self.frame = Some(start_frame);
        self.drag = Some(DragSession::begin(prefs.size_preset, start_frame));
        tracing::debug!(preset = %prefs.size_preset, "Resize drag began");

        if self.frozen {
            return vec![Effect::SetFrame(start_frame)];
        }
        self.frozen = true;
        vec![Effect::FreezeContent, Effect::SetFrame(start_frame)]
    }

    fn end_drag(&mut self, downward: f64, prefs: &Preferences, now: Instant) -> Vec<Effect> {
        let Some(session) = self.drag.take() else {
            return Vec::new();
        };

        let release = session.finish(downward);
        let target = release.frame.with_size(release.preset.content_size());
        tracing::info!(
            from = %session.start_preset,
            to = %release.preset,
            displacement = downward,
            "Resize drag released"
        );

        self.frame = Some(release.frame);
        self.animation = Some(SnapAnimation::new(release.frame, target, now));

        let mut effects = vec![Effect::SetFrame(release.frame)];
        if release.preset != prefs.size_preset {
            effects.push(Effect::CommitPreset(release.preset));
        }
        effects
    }

    fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let Some(animation) = self.animation else {
            return Vec::new();
        };

        let (frame, done) = animation.sample(now);
        self.frame = Some(frame);
        let mut effects = vec![Effect::SetFrame(frame)];

        if done {
            self.animation = None;
            if self.frozen {
                self.frozen = false;
                effects.push(Effect::ThawContent);
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::resize::SNAP_DURATION;

    fn icon() -> Frame {
        Frame::new(Point::new(800.0, 0.0), Size::new(24.0, 22.0))
    }

    fn prefs(size_preset: SizePreset, retain_focus: bool) -> Preferences {
        Preferences {
            size_preset,
            retain_focus,
        }
    }

    fn primary() -> PopoverEvent {
        PopoverEvent::IconPressed {
            button: PointerButton::Primary,
            icon_frame: Some(icon()),
        }
    }

    fn shown(prefs: &Preferences, now: Instant) -> PopoverController {
        let mut controller = PopoverController::new();
        controller.handle(primary(), prefs, now);
        assert!(controller.is_shown());
        controller
    }

    fn far_away() -> Point {
        Point::new(5.0, 900.0)
    }

    #[test]
    fn test_primary_click_shows_with_stored_preset_size() {
        let prefs = prefs(SizePreset::Large, true);
        let mut controller = PopoverController::new();

        let effects = controller.handle(primary(), &prefs, Instant::now());

        let expected = Frame::anchored_below(icon(), SizePreset::Large.content_size());
        assert_eq!(effects, vec![Effect::Show(expected)]);
        assert_eq!(controller.state(), PopoverState::Shown);
    }

    #[test]
    fn test_second_primary_click_hides() {
        let prefs = prefs(SizePreset::Mid, true);
        let now = Instant::now();
        let mut controller = shown(&prefs, now);

        let effects = controller.handle(primary(), &prefs, now + Duration::from_secs(1));

        assert_eq!(effects, vec![Effect::Hide]);
        assert_eq!(controller.state(), PopoverState::Hidden);
    }

    #[test]
    fn test_secondary_click_never_changes_state() {
        let prefs = prefs(SizePreset::Mid, false);
        let now = Instant::now();
        let secondary = PopoverEvent::IconPressed {
            button: PointerButton::Secondary,
            icon_frame: Some(icon()),
        };

        let mut controller = PopoverController::new();
        assert!(controller.handle(secondary, &prefs, now).is_empty());
        assert!(!controller.is_shown());

        let mut controller = shown(&prefs, now);
        assert!(controller.handle(secondary, &prefs, now).is_empty());
        assert!(controller.is_shown());
    }

    #[test]
    fn test_outside_click_ignored_when_retaining_focus() {
        let prefs = prefs(SizePreset::Mid, true);
        let now = Instant::now();
        let mut controller = shown(&prefs, now);

        let effects = controller.handle(PopoverEvent::OutsidePointerDown(far_away()), &prefs, now);

        assert!(effects.is_empty());
        assert!(controller.is_shown());
    }

    #[test]
    fn test_outside_click_dismisses_when_transient() {
        let prefs = prefs(SizePreset::Mid, false);
        let now = Instant::now();
        let mut controller = shown(&prefs, now);

        let effects = controller.handle(PopoverEvent::OutsidePointerDown(far_away()), &prefs, now);

        assert_eq!(effects, vec![Effect::Hide]);
        assert!(!controller.is_shown());
    }

    #[test]
    fn test_click_inside_popover_or_on_icon_does_not_dismiss() {
        let prefs = prefs(SizePreset::Mid, false);
        let now = Instant::now();
        let mut controller = shown(&prefs, now);
        let frame = controller.frame().unwrap();

        let inside = Point::new(frame.origin.x + 10.0, frame.origin.y + 10.0);
        assert!(controller.handle(PopoverEvent::OutsidePointerDown(inside), &prefs, now).is_empty());

        let on_icon = Point::new(810.0, 10.0);
        assert!(controller.handle(PopoverEvent::OutsidePointerDown(on_icon), &prefs, now).is_empty());
        assert!(controller.is_shown());
    }

    #[test]
    fn test_focus_toggle_applies_to_next_outside_click_without_reshow() {
        let retaining = prefs(SizePreset::Mid, true);
        let transient = prefs(SizePreset::Mid, false);
        let now = Instant::now();
        let mut controller = shown(&retaining, now);

        assert!(controller.handle(PopoverEvent::OutsidePointerDown(far_away()), &retaining, now).is_empty());

        let effects = controller.handle(
            PopoverEvent::PreferencesChanged(PreferenceChange::RetainFocus(false)),
            &transient,
            now,
        );
        assert!(effects.is_empty());
        assert!(controller.is_shown());

        let effects = controller.handle(PopoverEvent::OutsidePointerDown(far_away()), &transient, now);
        assert_eq!(effects, vec![Effect::Hide]);
    }

    #[test]
    fn test_focus_loss_only_dismisses_when_transient() {
        let now = Instant::now();

        let retaining = prefs(SizePreset::Mid, true);
        let mut controller = shown(&retaining, now);
        assert!(controller.handle(PopoverEvent::FocusLost, &retaining, now).is_empty());
        assert!(controller.is_shown());

        let transient = prefs(SizePreset::Mid, false);
        let mut controller = shown(&transient, now);
        assert_eq!(controller.handle(PopoverEvent::FocusLost, &transient, now), vec![Effect::Hide]);
    }

    #[test]
    fn test_icon_click_that_caused_focus_loss_does_not_reopen() {
        let prefs = prefs(SizePreset::Mid, false);
        let now = Instant::now();
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::FocusLost, &prefs, now);
        let effects = controller.handle(primary(), &prefs, now + Duration::from_millis(50));
        assert!(effects.is_empty());
        assert!(!controller.is_shown());

        // A deliberate later click opens it again
        let effects = controller.handle(primary(), &prefs, now + Duration::from_secs(2));
        assert!(matches!(effects.as_slice(), [Effect::Show(_)]));
    }

    #[test]
    fn test_size_change_while_shown_resizes_in_place() {
        let now = Instant::now();
        let before = prefs(SizePreset::Mid, true);
        let mut controller = shown(&before, now);
        let origin = controller.frame().unwrap().origin;

        let after = prefs(SizePreset::Small, true);
        let effects = controller.handle(
            PopoverEvent::PreferencesChanged(PreferenceChange::SizePreset(SizePreset::Small)),
            &after,
            now,
        );

        let expected = Frame::new(origin, SizePreset::Small.content_size());
        assert_eq!(effects, vec![Effect::SetFrame(expected)]);
        assert!(controller.is_shown());
    }

    #[test]
    fn test_size_change_while_hidden_is_applied_on_next_show() {
        let now = Instant::now();
        let mut controller = PopoverController::new();
        let large = prefs(SizePreset::Large, true);

        let effects = controller.handle(
            PopoverEvent::PreferencesChanged(PreferenceChange::SizePreset(SizePreset::Large)),
            &large,
            now,
        );
        assert!(effects.is_empty());

        let effects = controller.handle(primary(), &large, now);
        assert_eq!(
            effects,
            vec![Effect::Show(Frame::anchored_below(icon(), SizePreset::Large.content_size()))]
        );
    }

    #[test]
    fn test_drag_freezes_resizes_commits_and_thaws() {
        let start = Instant::now();
        let prefs = prefs(SizePreset::SmallMid, true);
        let mut controller = shown(&prefs, start);
        let origin = controller.frame().unwrap().origin;

        let effects = controller.handle(PopoverEvent::DragBegan, &prefs, start);
        assert_eq!(effects[0], Effect::FreezeContent);
        assert!(controller.is_dragging());

        let effects = controller.handle(PopoverEvent::DragMoved(40.0), &prefs, start);
        let [Effect::SetFrame(mid_drag)] = effects.as_slice() else {
            panic!("expected a single SetFrame, got {effects:?}");
        };
        assert_eq!(mid_drag.origin, origin);
        assert!(mid_drag.size.height > SizePreset::SmallMid.content_size().height);
        assert!(mid_drag.size.height < SizePreset::Mid.content_size().height);

        let effects = controller.handle(PopoverEvent::DragEnded(80.0), &prefs, start);
        assert!(effects.contains(&Effect::CommitPreset(SizePreset::Mid)));
        assert!(!controller.is_dragging());
        assert!(controller.is_animating());

        let effects = controller.handle(PopoverEvent::AnimationTick, &prefs, start + SNAP_DURATION);
        assert_eq!(
            effects,
            vec![
                Effect::SetFrame(Frame::new(origin, SizePreset::Mid.content_size())),
                Effect::ThawContent,
            ]
        );
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_drag_released_at_start_commits_nothing() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::Mid, true);
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::DragBegan, &prefs, now);
        let effects = controller.handle(PopoverEvent::DragEnded(0.0), &prefs, now);

        assert!(!effects.iter().any(|e| matches!(e, Effect::CommitPreset(_))));
    }

    #[test]
    fn test_cancelled_drag_snaps_like_release() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::Mid, true);
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::DragBegan, &prefs, now);
        let effects = controller.handle(PopoverEvent::DragCancelled(-500.0), &prefs, now);

        assert!(effects.contains(&Effect::CommitPreset(SizePreset::Small)));
    }

    #[test]
    fn test_hide_during_drag_discards_session_and_thaws() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::Mid, true);
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::DragBegan, &prefs, now);
        let effects = controller.handle(primary(), &prefs, now + Duration::from_secs(1));

        assert_eq!(effects, vec![Effect::ThawContent, Effect::Hide]);
        assert!(!controller.is_dragging());
        assert!(controller.handle(PopoverEvent::DragEnded(80.0), &prefs, now).is_empty());
    }

    #[test]
    fn test_drag_events_ignored_while_hidden() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::Mid, true);
        let mut controller = PopoverController::new();

        assert!(controller.handle(PopoverEvent::DragBegan, &prefs, now).is_empty());
        assert!(controller.handle(PopoverEvent::DragMoved(50.0), &prefs, now).is_empty());
        assert!(controller.handle(PopoverEvent::AnimationTick, &prefs, now).is_empty());
    }

    #[test]
    fn test_size_notification_during_snap_is_ignored() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::SmallMid, true);
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::DragBegan, &prefs, now);
        controller.handle(PopoverEvent::DragEnded(80.0), &prefs, now);

        let effects = controller.handle(
            PopoverEvent::PreferencesChanged(PreferenceChange::SizePreset(SizePreset::Mid)),
            &prefs,
            now,
        );
        assert!(effects.is_empty());
        assert!(controller.is_animating());
    }

    #[test]
    fn test_size_change_during_drag_is_ignored() {
        let now = Instant::now();
        let prefs = prefs(SizePreset::Mid, true);
        let mut controller = shown(&prefs, now);

        controller.handle(PopoverEvent::DragBegan, &prefs, now);
        controller.handle(PopoverEvent::DragMoved(30.0), &prefs, now);
        let frame_mid_drag = controller.frame();

        let effects = controller.handle(
            PopoverEvent::PreferencesChanged(PreferenceChange::SizePreset(SizePreset::Small)),
            &prefs,
            now,
        );
        assert!(effects.is_empty());
        assert!(controller.is_dragging());
        assert_eq!(controller.frame(), frame_mid_drag);

        // The drag still settles from its own start preset
        let effects = controller.handle(PopoverEvent::DragEnded(30.0), &prefs, now);
        assert!(!effects.iter().any(|e| matches!(e, Effect::CommitPreset(_))));
    }
}
