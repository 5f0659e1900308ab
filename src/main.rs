/// Entry point and frame loop.

mod app;
mod config;
mod domain;
mod logging;
mod net;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;

use app::{App, AppSettings, View};
use config::GameConfig;
use domain::entity::FrameInput;
use net::api::HttpBackend;
use net::wallet::{parse_units, JsonRpcWallet};
use net::{NetClient, PaymentTerms};
use sim::save::SaveStore;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Wallet prompts wait on a human; only a dead endpoint should time out.
const WALLET_TIMEOUT: Duration = Duration::from_secs(120);

fn main() {
    let config = GameConfig::load();
    let store = SaveStore::locate();

    if let Err(e) = logging::init(store.dir(), &config.general.log_file) {
        eprintln!("Logging disabled: {e:#}");
    }
    tracing::info!(save_dir = %store.dir().display(), "starting flappy-base");

    let net = match start_network(&config) {
        Ok(net) => net,
        Err(e) => {
            eprintln!("Startup failed: {e:#}");
            return;
        }
    };

    let mut app = App::new(
        AppSettings::from_config(&config),
        store,
        net.score_sink(),
        StdRng::from_entropy(),
    );

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut app, &net, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        tracing::error!("game loop failed: {e:#}");
        eprintln!("Game error: {e:#}");
    }

    println!();
    println!("Thanks for playing Flappy Base!");
    println!("Best Score: {}", app.best_score);
}

fn start_network(config: &GameConfig) -> Result<NetClient> {
    let w = &config.wallet;
    let amount = parse_units(&w.entry_fee, w.token_decimals)
        .with_context(|| format!("invalid entry fee {:?}", w.entry_fee))?;
    let terms = PaymentTerms {
        token: w.token_address.clone(),
        receiver: w.receiver_address.clone(),
        amount,
    };
    net::spawn(
        HttpBackend::new(&config.backend),
        JsonRpcWallet::new(&w.rpc_url, WALLET_TIMEOUT),
        terms,
    )
}

fn game_loop(
    app: &mut App,
    net: &NetClient,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_rate = Duration::from_millis(config.general.tick_rate_ms);
    let tick_ms = config.general.tick_rate_ms.min(u32::MAX as u64) as u32;
    let mut last_tick = Instant::now();
    let mut pending_flap = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(app, &kb, &gp) {
            break;
        }

        // Flaps between ticks are latched so a fast tap is never lost.
        if app.view == View::Playing && detect_flap(&kb, &gp) {
            pending_flap = true;
        }

        while let Some(resp) = net.try_recv() {
            app.on_response(resp);
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput { flap: std::mem::take(&mut pending_flap) };
            let events = app.tick(tick_ms, input);
            sound::play_events(sound, &events);
            last_tick = Instant::now();
        }

        for req in app.drain_outbox() {
            net.send(req);
        }

        renderer.render(app).context("rendering frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn detect_flap(kb: &InputState, gp: &GamepadState) -> bool {
    kb.any_pressed(&[KeyCode::Char(' '), KeyCode::Up])
        || kb.letter_pressed('w')
        || kb.clicked()
        || gp.flap_pressed()
}

/// View-level keys. Returns true when the player quits.
fn handle_meta(app: &mut App, kb: &InputState, gp: &GamepadState) -> bool {
    let esc = kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed();
    let enter = kb.was_pressed(KeyCode::Enter) || gp.confirm_pressed();

    match app.view {
        View::Menu => {
            if kb.letter_pressed('q') || esc {
                return true;
            }
            if kb.letter_pressed('p') || enter {
                app.practice_click();
            } else if kb.letter_pressed('c') {
                app.competition_click();
            } else if kb.letter_pressed('w') {
                app.toggle_wallet();
            } else if kb.letter_pressed('l') {
                app.open_leaderboard();
            }
        }
        View::Playing => {
            if esc {
                app.back_to_menu();
            }
        }
        View::GameOver => {
            if kb.letter_pressed('r') || enter {
                app.retry();
            } else if kb.letter_pressed('m') || esc {
                app.back_to_menu();
            }
        }
        View::Leaderboard => {
            if kb.letter_pressed('d') {
                app.export_rewards();
            } else if kb.letter_pressed('x') || esc {
                app.close_leaderboard();
            }
        }
        View::Paying => {}
    }
    false
}
