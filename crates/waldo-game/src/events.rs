//! Typed game events and the FIFO dispatcher that routes them.

use std::collections::VecDeque;

use anyhow::Result;
use waldo_engine::coords::WindowSize;
use waldo_engine::input::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

use crate::controller::{GameController, Outcome, Stage};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GameEvent {
    /// Left-button press in window pixels.
    Click { x: i32, y: i32 },
    Resize(WindowSize),
    Key(Key),
    CloseRequested,
}

impl GameEvent {
    /// Keeps left-button presses and fresh key presses; drops everything else.
    pub fn from_input(ev: &InputEvent) -> Option<Self> {
        match ev {
            InputEvent::PointerButton(b)
                if b.button == MouseButton::Left && b.state == MouseButtonState::Pressed =>
            {
                let (x, y) = b.pixel();
                Some(GameEvent::Click { x, y })
            }
            InputEvent::Key {
                key,
                state: KeyState::Pressed,
                repeat: false,
                ..
            } => Some(GameEvent::Key(*key)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, ev: GameEvent) {
        self.pending.push_back(ev);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Dispatches every pending event in arrival order and merges the
    /// outcomes. Stops at the first error; later events stay queued.
    pub fn drain<S: Stage + ?Sized>(
        &mut self,
        controller: &mut GameController,
        stage: &mut S,
    ) -> Result<Outcome> {
        let mut outcome = Outcome::Continue;
        if self.is_empty() {
            return Ok(outcome);
        }
        log::trace!("draining {} events", self.len());
        while let Some(ev) = self.pending.pop_front() {
            outcome = outcome.merge(dispatch(controller, stage, ev)?);
        }
        Ok(outcome)
    }
}

/// Routes one event to its handler.
pub fn dispatch<S: Stage + ?Sized>(
    controller: &mut GameController,
    stage: &mut S,
    ev: GameEvent,
) -> Result<Outcome> {
    log::trace!("dispatching {ev:?}");
    match ev {
        GameEvent::Click { x, y } => Ok(controller.on_click(stage, x, y)),
        GameEvent::Resize(size) => controller.on_resize(stage, size),
        GameEvent::Key(key) => Ok(controller.on_key_press(key)),
        GameEvent::CloseRequested => Ok(controller.on_close_requested()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_box::BoundingBox;
    use crate::controller::tests::FakeStage;
    use crate::controller::SessionState;
    use waldo_engine::input::{Modifiers, PointerButtonEvent};

    fn button(button: MouseButton, state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button,
            state,
            x: 12.7,
            y: 40.2,
            modifiers: Modifiers::default(),
        })
    }

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat,
        }
    }

    // ── translation ───────────────────────────────────────────────────────

    #[test]
    fn left_press_becomes_a_click() {
        let ev = GameEvent::from_input(&button(MouseButton::Left, MouseButtonState::Pressed));
        assert_eq!(ev, Some(GameEvent::Click { x: 12, y: 40 }));
    }

    #[test]
    fn releases_and_other_buttons_are_dropped() {
        assert_eq!(GameEvent::from_input(&button(MouseButton::Left, MouseButtonState::Released)), None);
        assert_eq!(GameEvent::from_input(&button(MouseButton::Right, MouseButtonState::Pressed)), None);
        assert_eq!(GameEvent::from_input(&InputEvent::PointerLeft), None);
    }

    #[test]
    fn only_fresh_key_presses_pass() {
        assert_eq!(
            GameEvent::from_input(&key(Key::Escape, KeyState::Pressed, false)),
            Some(GameEvent::Key(Key::Escape))
        );
        assert_eq!(GameEvent::from_input(&key(Key::Escape, KeyState::Pressed, true)), None);
        assert_eq!(GameEvent::from_input(&key(Key::Escape, KeyState::Released, false)), None);
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    fn setup() -> (GameController, FakeStage) {
        let bbox = BoundingBox::new(200, 100, 240, 120).unwrap();
        (GameController::new(bbox), FakeStage::new((100, 100), (400, 400)))
    }

    #[test]
    fn events_are_handled_in_arrival_order() {
        let (mut game, mut stage) = setup();
        let mut queue = EventQueue::new();
        queue.push(GameEvent::Resize(WindowSize::new(100, 100).unwrap()));
        queue.push(GameEvent::Click { x: 5, y: 5 });
        queue.push(GameEvent::Resize(WindowSize::new(50, 50).unwrap()));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.drain(&mut game, &mut stage).unwrap(), Outcome::Redraw);
        assert!(queue.is_empty());
        assert_eq!(stage.captures, 2);
        assert_eq!(game.markers().len(), 1);
        assert_eq!(stage.transformer.window_size(), WindowSize::new(50, 50).unwrap());
    }

    #[test]
    fn click_uses_the_size_current_at_dispatch() {
        let (mut game, mut stage) = setup();
        let mut queue = EventQueue::new();
        // (55, 27) in a 200x200 window is image (110, 54): a miss. In the
        // 100x100 window it would have been a hit.
        queue.push(GameEvent::Resize(WindowSize::new(200, 200).unwrap()));
        queue.push(GameEvent::Click { x: 55, y: 27 });
        queue.drain(&mut game, &mut stage).unwrap();
        assert_eq!(game.state(), SessionState::Playing);
    }

    #[test]
    fn strongest_outcome_wins() {
        let (mut game, mut stage) = setup();
        let mut queue = EventQueue::new();
        queue.push(GameEvent::Click { x: 5, y: 5 });
        queue.push(GameEvent::Key(Key::Escape));
        queue.push(GameEvent::Key(Key::Space));
        assert_eq!(queue.drain(&mut game, &mut stage).unwrap(), Outcome::ConfirmExit);

        queue.push(GameEvent::CloseRequested);
        queue.push(GameEvent::Click { x: 55, y: 27 });
        assert_eq!(queue.drain(&mut game, &mut stage).unwrap(), Outcome::Celebrate);
    }
}
