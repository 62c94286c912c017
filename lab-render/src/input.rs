use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow, WindowFocused};
use tracing::info;

/// Pointer capture. Movement and look input only apply while locked.
#[derive(Resource, Debug, Default)]
pub struct ControlLock {
    pub locked: bool,
}

pub fn update_control_lock(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut focus_events: EventReader<WindowFocused>,
    mut lock: ResMut<ControlLock>,
) {
    let mut locked = lock.locked;
    let mut focus_lost = false;
    for ev in focus_events.read() {
        focus_lost |= !ev.focused;
    }

    if focus_lost || keys.just_pressed(KeyCode::Escape) {
        locked = false;
    } else if mouse.just_pressed(MouseButton::Left) {
        locked = true;
    }

    if locked != lock.locked {
        lock.locked = locked;
        info!(locked, "pointer lock changed");
    }
}

pub fn apply_cursor_lock(
    lock: Res<ControlLock>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Some(mut window) = windows.iter_mut().next() else {
        return;
    };

    if lock.locked {
        if window.cursor_options.grab_mode != CursorGrabMode::Locked {
            window.cursor_options.grab_mode = CursorGrabMode::Locked;
        }
        if window.cursor_options.visible {
            window.cursor_options.visible = false;
        }
    } else {
        if window.cursor_options.grab_mode != CursorGrabMode::None {
            window.cursor_options.grab_mode = CursorGrabMode::None;
        }
        if !window.cursor_options.visible {
            window.cursor_options.visible = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ControlLock>()
            .add_event::<WindowFocused>()
            .add_systems(Update, update_control_lock);
        app
    }

    fn locked(app: &App) -> bool {
        app.world().resource::<ControlLock>().locked
    }

    #[test]
    fn click_locks_and_escape_releases() {
        let mut app = lock_app();
        app.update();
        assert!(!locked(&app));

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        assert!(locked(&app));

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .clear();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();
        assert!(!locked(&app));
    }

    #[test]
    fn focus_loss_releases() {
        let mut app = lock_app();
        app.world_mut().resource_mut::<ControlLock>().locked = true;
        app.world_mut().send_event(WindowFocused {
            window: Entity::PLACEHOLDER,
            focused: false,
        });
        app.update();
        assert!(!locked(&app));
    }
}
