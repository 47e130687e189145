//! Browser shell: canvas rendering, input listeners and the frame loop.
//!
//! All game rules live in [`crate::engine`]; this module owns the DOM side of
//! the contract: it feeds the engine elapsed time and normalized tap
//! coordinates, and turns the engine's tiles and events into pixels, overlay
//! text and feedback tones. Within a frame the session is always advanced
//! before queued taps are drained, so a tap can never land on a tile that
//! already expired this frame.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use crate::SONGS;
use crate::engine::{
    Beatmap, EndReason, GameConfig, GameEvent, HighScore, Session, TileKind,
};

mod audio;

const BOARD_WIDTH: u32 = 400;
const BOARD_HEIGHT: u32 = 600;
/// Clamp stalled frames (tab switches) so the board does not teleport.
const MAX_FRAME_MS: f64 = 250.0;
const FLASH_DURATION_MS: f64 = 150.0;
const HIGH_SCORE_KEY: &str = "rhythmTilesHighScore";

enum Screen {
    SongSelect,
    Playing,
    GameOver { final_score: u32, new_best: bool },
}

/// Transient hit-zone flash after a successful tap.
struct Flash {
    lane: u8,
    start_ms: f64,
}

/// Runtime shell state, one per page.
struct App {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    screen: Screen,
    session: Option<Session>,
    high_score: HighScore,
    /// Taps collected by the listeners, normalized to board space; drained
    /// once per frame after the session has been advanced.
    pending_taps: Vec<(f64, f64)>,
    audio: Option<audio::Feedback>,
    flashes: Vec<Flash>,
    last_ts: f64,
}

thread_local! {
    static APP: std::cell::RefCell<Option<App>> = const { std::cell::RefCell::new(None) };
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub fn start() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Create / reuse the board canvas.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("rt-board-canvas") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("rt-board-canvas");
        c.set_width(BOARD_WIDTH);
        c.set_height(BOARD_HEIGHT);
        c.set_attribute("style", "position:fixed; left:50%; top:50%; transform:translate(-50%,-50%); box-shadow:0 0 32px 0 rgba(0,0,0,0.18); border-radius:12px; border:2px solid #222; background:#181818; z-index:20; touch-action:none; cursor:pointer;").ok();
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_text_align("center");

    // Score / best overlays (DOM, updated each frame).
    for (id, text, left) in [
        ("rt-score", "Score: 0", "12px"),
        ("rt-highscore", "Best: 0", "140px"),
    ] {
        if doc.get_element_by_id(id).is_none() {
            if let Some(body) = doc.body() {
                let div = doc.create_element("div")?;
                div.set_id(id);
                div.set_text_content(Some(text));
                div.set_attribute("style", &format!("position:fixed; top:10px; left:{left}; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;")).ok();
                body.append_child(&div)?;
            }
        }
    }

    let app = App {
        canvas: canvas.clone(),
        ctx,
        screen: Screen::SongSelect,
        session: None,
        high_score: HighScore::new(load_high_score()),
        pending_taps: Vec::new(),
        audio: audio::Feedback::new(),
        flashes: Vec::new(),
        last_ts: 0.0,
    };
    APP.with(|a| a.replace(Some(app)));

    // Mouse input: offset coordinates are already canvas-local.
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let x = f64::from(evt.offset_x()) / f64::from(BOARD_WIDTH);
            let y = f64::from(evt.offset_y()) / f64::from(BOARD_HEIGHT);
            queue_tap(x, y);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Touch input: translate the first touch point via the canvas rect and
    // suppress the synthetic mouse event that would follow.
    {
        let canvas_touch = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::TouchEvent| {
            evt.prevent_default();
            let Some(touch) = evt.touches().get(0) else {
                return;
            };
            let rect = canvas_touch.get_bounding_client_rect();
            let x = (f64::from(touch.client_x()) - rect.left()) / f64::from(BOARD_WIDTH);
            let y = (f64::from(touch.client_y()) - rect.top()) / f64::from(BOARD_HEIGHT);
            queue_tap(x, y);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    start_frame_loop();
    Ok(())
}

fn queue_tap(x: f64, y: f64) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            app.pending_taps.push((x, y));
        }
    });
}

fn start_frame_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        APP.with(|cell| {
            if let Some(app) = cell.borrow_mut().as_mut() {
                tick(app, ts);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn tick(app: &mut App, now: f64) {
    let dt = if app.last_ts > 0.0 {
        (now - app.last_ts).clamp(0.0, MAX_FRAME_MS)
    } else {
        0.0
    };
    app.last_ts = now;

    // Advance first, then drain taps: a tile that expired this frame must not
    // be hittable by a tap queued earlier in the same frame.
    let mut events = Vec::new();
    if let Some(session) = app.session.as_mut() {
        events.extend(session.advance(dt));
    }
    let taps = std::mem::take(&mut app.pending_taps);
    match app.screen {
        Screen::Playing => {
            if let Some(session) = app.session.as_mut() {
                for (x, y) in taps {
                    events.extend(session.tap_position(x, y));
                }
            }
        }
        Screen::SongSelect => {
            for (x, y) in taps {
                if let Some(index) = song_at(x, y) {
                    start_session(app, index, now);
                    break;
                }
            }
        }
        Screen::GameOver { .. } => {
            if !taps.is_empty() {
                app.session = None;
                app.screen = Screen::SongSelect;
            }
        }
    }

    for event in events {
        match event {
            GameEvent::Spawned { .. } => {}
            GameEvent::Hit { lane, kind, .. } => {
                app.flashes.push(Flash {
                    lane,
                    start_ms: now,
                });
                if let Some(audio) = &app.audio {
                    match kind {
                        TileKind::Long => audio.long_tap(),
                        _ => audio.tap(),
                    }
                }
            }
            GameEvent::Ended {
                reason,
                final_score,
            } => {
                let new_best = app.high_score.record(final_score);
                if new_best {
                    store_high_score(app.high_score.get());
                }
                if let Some(audio) = &app.audio {
                    if reason != EndReason::Cleared {
                        audio.game_over();
                    }
                }
                app.screen = Screen::GameOver {
                    final_score,
                    new_best,
                };
            }
        }
    }

    app.flashes.retain(|f| now - f.start_ms < FLASH_DURATION_MS);
    render(app, now);
    update_overlays(app);
}

fn start_session(app: &mut App, song_index: usize, now: f64) {
    let song = &SONGS[song_index];
    let config = GameConfig::with_base_speed(song.base_speed);
    let beatmap = Beatmap::generate_with_kinds(
        song.beatmap_len,
        config.lane_count,
        seed(now),
        song.long_pct,
        song.decoy_pct,
    );
    app.session = Some(Session::start(beatmap, config));
    app.flashes.clear();
    app.screen = Screen::Playing;
}

#[cfg(feature = "rng")]
fn seed(_now: f64) -> u64 {
    crate::engine::random_seed()
}

#[cfg(not(feature = "rng"))]
fn seed(now: f64) -> u64 {
    // Deterministic-ish fallback: frame timestamps have sub-ms resolution.
    (now * 1000.0) as u64
}

// --- Persistence ------------------------------------------------------------

fn load_high_score() -> u32 {
    window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(HIGH_SCORE_KEY).ok().flatten())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn store_high_score(value: u32) {
    if let Some(storage) = window().and_then(|w| w.local_storage().ok().flatten()) {
        storage.set_item(HIGH_SCORE_KEY, &value.to_string()).ok();
    }
}

// --- Rendering ---------------------------------------------------------------

/// Song button rect in normalized board space, matching `song_at`.
fn song_rect(index: usize) -> (f64, f64, f64, f64) {
    (0.125, 0.3 + index as f64 * 0.15, 0.75, 0.1)
}

fn song_at(x: f64, y: f64) -> Option<usize> {
    (0..SONGS.len()).find(|&i| {
        let (rx, ry, rw, rh) = song_rect(i);
        x >= rx && x < rx + rw && y >= ry && y < ry + rh
    })
}

fn render(app: &App, now: f64) {
    let w = f64::from(app.canvas.width());
    let h = f64::from(app.canvas.height());
    let ctx = &app.ctx;

    ctx.set_fill_style_str("#181818");
    ctx.fill_rect(0.0, 0.0, w, h);

    match &app.screen {
        Screen::SongSelect => render_song_select(ctx, w, h),
        Screen::Playing => {
            if let Some(session) = &app.session {
                render_board(app, session, now, w, h);
            }
        }
        Screen::GameOver {
            final_score,
            new_best,
        } => {
            if let Some(session) = &app.session {
                render_board(app, session, now, w, h);
            }
            render_game_over(ctx, w, h, *final_score, *new_best);
        }
    }
}

fn render_song_select(ctx: &CanvasRenderingContext2d, w: f64, h: f64) {
    ctx.set_fill_style_str("#ffd166");
    ctx.set_font("32px 'Fira Code', monospace");
    ctx.fill_text("Rhythm Tiles", w / 2.0, h * 0.18).ok();
    ctx.set_font("14px 'Fira Code', monospace");
    ctx.set_fill_style_str("#aaaaaa");
    ctx.fill_text("pick a track", w / 2.0, h * 0.23).ok();

    for (i, song) in SONGS.iter().enumerate() {
        let (rx, ry, rw, rh) = song_rect(i);
        let (px, py, pw, ph) = (rx * w, ry * h, rw * w, rh * h);
        ctx.set_fill_style_str("#242424");
        ctx.fill_rect(px, py, pw, ph);
        ctx.set_stroke_style_str("#444444");
        ctx.set_line_width(2.0);
        ctx.stroke_rect(px, py, pw, ph);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_font("18px 'Fira Code', monospace");
        ctx.fill_text(song.title, w / 2.0, py + ph * 0.45).ok();
        ctx.set_fill_style_str("#888888");
        ctx.set_font("12px 'Fira Code', monospace");
        ctx.fill_text(song.artist, w / 2.0, py + ph * 0.78).ok();
    }
}

fn render_board(app: &App, session: &Session, now: f64, w: f64, h: f64) {
    let ctx = &app.ctx;
    let config = session.config();
    let lanes = f64::from(config.lane_count);
    let lane_w = w / lanes;

    // Hit zone band.
    ctx.set_fill_style_str("rgba(255,220,120,0.08)");
    ctx.fill_rect(
        0.0,
        config.hit_zone_top() * h,
        w,
        config.hit_zone_height * h,
    );

    // Lane separators.
    ctx.set_stroke_style_str("#2e2e2e");
    ctx.set_line_width(2.0);
    for lane in 1..config.lane_count {
        let x = f64::from(lane) * lane_w;
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
        ctx.stroke();
    }

    // Tap flashes in the hit zone.
    for flash in &app.flashes {
        let alpha = 1.0 - (now - flash.start_ms) / FLASH_DURATION_MS;
        if alpha <= 0.0 {
            continue;
        }
        ctx.set_fill_style_str(&format!("rgba(255,220,120,{:.3})", alpha * 0.35));
        ctx.fill_rect(
            f64::from(flash.lane) * lane_w,
            config.hit_zone_top() * h,
            lane_w,
            config.hit_zone_height * h,
        );
    }

    // Tiles. `position` is the leading (bottom) edge, normalized.
    for tile in session.tiles() {
        let height = match tile.kind {
            TileKind::Long => config.tile_height * 1.6,
            _ => config.tile_height,
        } * h;
        let bottom = tile.position * h;
        let x = f64::from(tile.lane) * lane_w;
        let color = match tile.kind {
            TileKind::Normal => "#4a9eff",
            TileKind::Long => "#ffd166",
            TileKind::Decoy => "#ff4d4d",
        };
        ctx.set_fill_style_str(color);
        ctx.fill_rect(x + 3.0, bottom - height, lane_w - 6.0, height);
        if tile.kind == TileKind::Decoy {
            ctx.set_stroke_style_str("rgba(0,0,0,0.7)");
            ctx.set_line_width(3.0);
            ctx.begin_path();
            ctx.move_to(x + 10.0, bottom - height + 10.0);
            ctx.line_to(x + lane_w - 10.0, bottom - 10.0);
            ctx.move_to(x + lane_w - 10.0, bottom - height + 10.0);
            ctx.line_to(x + 10.0, bottom - 10.0);
            ctx.stroke();
        }
    }

    // Miss line.
    ctx.set_stroke_style_str("#555555");
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(0.0, h - 1.0);
    ctx.line_to(w, h - 1.0);
    ctx.stroke();
}

fn render_game_over(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    final_score: u32,
    new_best: bool,
) {
    ctx.set_fill_style_str("rgba(0,0,0,0.55)");
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str("#ffffff");
    ctx.set_font("42px 'Fira Code', monospace");
    ctx.fill_text("GAME OVER", w / 2.0, h / 2.0 - 20.0).ok();
    ctx.set_font("20px 'Fira Code', monospace");
    ctx.fill_text(&format!("score {final_score}"), w / 2.0, h / 2.0 + 20.0)
        .ok();
    if new_best {
        ctx.set_fill_style_str("#ffd166");
        ctx.fill_text("new best!", w / 2.0, h / 2.0 + 50.0).ok();
    }
    ctx.set_fill_style_str("#aaaaaa");
    ctx.set_font("14px 'Fira Code', monospace");
    ctx.fill_text("tap to continue", w / 2.0, h / 2.0 + 86.0).ok();
}

fn update_overlays(app: &App) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    if let Some(el) = doc.get_element_by_id("rt-score") {
        let score = app.session.as_ref().map(Session::score).unwrap_or(0);
        el.set_text_content(Some(&format!("Score: {score}")));
    }
    if let Some(el) = doc.get_element_by_id("rt-highscore") {
        el.set_text_content(Some(&format!("Best: {}", app.high_score.get())));
    }
}
