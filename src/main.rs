/// Entry point and frame loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use tracing::{error, info};

use config::GameConfig;
use domain::direction::HeldDirections;
use sim::event::MoveEvent;
use sim::map::{load_map, PixelSize};
use sim::scene::Overworld;
use sim::Millis;
use ui::gamepad::GamepadState;
use ui::input::{KeyboardState, INTERACT_KEYS, MUSIC_KEYS, QUIT_KEYS};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    logging::init_tracing();
    if let Err(e) = run() {
        error!(error = %e, "fatal");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    info!("shutdown");
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = GameConfig::load();
    let map = load_map(&config.map, &config.maps_dir)?;

    let viewport = PixelSize::new(config.camera.viewport_width, config.camera.viewport_height);
    let mut scene = Overworld::new(map, &config.movement);
    scene.initialize(viewport);

    let mut renderer = Renderer::new(viewport);
    renderer.init()?;

    let mut sound = SoundEngine::new();
    let result = frame_loop(&mut scene, &mut renderer, sound.as_mut(), &config);

    // Restore the terminal before any error reaches the user.
    renderer.cleanup()?;
    result
}

fn frame_loop(
    scene: &mut Overworld,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = KeyboardState::new(
        config.input.key_hold_timeout_ms,
        config.input.key_repeat_delay_ms,
    );
    // Windows consoles report releases without enhancement.
    kb.honor_release = renderer.keyboard_enhanced() || cfg!(windows);
    let mut gp = GamepadState::new(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.frame_sleep_ms);
    let start = Instant::now();

    loop {
        kb.drain_events();
        gp.update();
        let now = start.elapsed().as_millis() as Millis;

        if kb.ctrl_c_pressed() || kb.any_pressed(QUIT_KEYS) || gp.quit_pressed() {
            return Ok(());
        }

        if kb.any_pressed(INTERACT_KEYS) || gp.interact_pressed() {
            scene.interact(now);
            if let Some(sfx) = sound.as_deref() {
                sfx.play_interact();
            }
        }
        if kb.any_pressed(MUSIC_KEYS) || gp.music_pressed() {
            let on = scene.toggle_music(now);
            if let Some(sfx) = sound.as_deref_mut() {
                sfx.set_music(on);
            }
        }

        let held = merge(kb.held_directions(), gp.held_directions());
        let events = scene.update(now, held);
        if let Some(sfx) = sound.as_deref() {
            play_event_sounds(sfx, &events);
        }

        renderer.render(scene)?;
        std::thread::sleep(frame_sleep);
    }
}

/// Keyboard and gamepad feed the same logical directions.
fn merge(a: HeldDirections, b: HeldDirections) -> HeldDirections {
    HeldDirections {
        left: a.left || b.left,
        right: a.right || b.right,
        up: a.up || b.up,
        down: a.down || b.down,
    }
}

fn play_event_sounds(sfx: &SoundEngine, events: &[MoveEvent]) {
    if events.iter().any(|e| matches!(e, MoveEvent::Blocked { .. })) {
        sfx.play_bump();
    }
}
