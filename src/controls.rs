use macroquad::prelude::*;

use crate::event::ListenerError;
use crate::game::Game;
use crate::interactable::Velocity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    ZoomOut,
    ZoomIn,
    Pause,
}

/// Keyboard state turned into player velocity, zoom and pause.
///
/// Movement keys add to or subtract from an intent accumulator on press and
/// release; the player's velocity is the smoothed intent.
pub struct Controls {
    bindings: Vec<(KeyCode, InputAction)>,
    max_velocity: f32,
    zoom_step: f32,
    intent: Velocity,
}

impl Controls {
    pub fn new(max_velocity: f32, zoom_step: f32) -> Self {
        Self {
            bindings: vec![
                (KeyCode::Up, InputAction::Up),
                (KeyCode::W, InputAction::Up),
                (KeyCode::Down, InputAction::Down),
                (KeyCode::S, InputAction::Down),
                (KeyCode::Left, InputAction::Left),
                (KeyCode::A, InputAction::Left),
                (KeyCode::Right, InputAction::Right),
                (KeyCode::D, InputAction::Right),
                (KeyCode::Minus, InputAction::ZoomOut),
                (KeyCode::Equal, InputAction::ZoomIn),
                (KeyCode::P, InputAction::Pause),
            ],
            max_velocity,
            zoom_step,
            intent: Velocity::ZERO,
        }
    }

    pub fn intent(&self) -> Velocity {
        self.intent
    }

    /// Press and release edges since the last frame.
    pub fn poll(&self) -> Vec<(InputAction, bool)> {
        let mut edges = Vec::new();
        for &(key, action) in &self.bindings {
            if is_key_pressed(key) {
                edges.push((action, true));
            }
            if is_key_released(key) {
                edges.push((action, false));
            }
        }
        edges
    }

    pub fn apply(&mut self, game: &mut Game, action: InputAction, pressed: bool) -> Result<(), ListenerError> {
        let sign = if pressed { 1.0 } else { -1.0 };
        let step = self.max_velocity * sign;
        let facing = match action {
            InputAction::Pause => {
                if pressed {
                    game.toggle_pause();
                }
                return Ok(());
            }
            InputAction::ZoomOut | InputAction::ZoomIn => {
                if pressed {
                    let dir = if action == InputAction::ZoomIn { 1.0 } else { -1.0 };
                    game.zoom(self.zoom_step * dir);
                }
                return Ok(());
            }
            InputAction::Up => {
                self.intent.vy -= step;
                None
            }
            InputAction::Down => {
                self.intent.vy += step;
                None
            }
            InputAction::Left => {
                self.intent.vx -= step;
                pressed.then_some(-1.0)
            }
            InputAction::Right => {
                self.intent.vx += step;
                pressed.then_some(1.0)
            }
        };

        let Some(player) = game.player() else {
            return Ok(());
        };
        let Some(scene) = game.scene_mut() else {
            return Ok(());
        };
        let entities = scene.entities_mut();
        if let (Some(sign), Some(object)) = (facing, entities.get_mut(player)) {
            object.scene_mut().mirror_x(Some(sign));
        }
        entities.set_velocity(player, self.intent.smooth_circular())?;
        Ok(())
    }
}
