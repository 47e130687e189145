//! Web Audio feedback tones.
//!
//! Fire-and-forget: the engine never waits on sound and every failure here is
//! swallowed, so a browser without Web Audio plays a silent but intact game.

use web_sys::{AudioContext, OscillatorType};

pub struct Feedback {
    ctx: AudioContext,
}

impl Feedback {
    pub fn new() -> Option<Self> {
        AudioContext::new().ok().map(|ctx| Self { ctx })
    }

    /// Short sine blip for a normal hit (same tone the prototype used).
    pub fn tap(&self) {
        self.blip(440.0, 0.2);
    }

    /// Brighter blip for a long tile.
    pub fn long_tap(&self) {
        self.blip(587.3, 0.25);
    }

    /// Low tone on game over.
    pub fn game_over(&self) {
        self.blip(110.0, 0.45);
    }

    fn blip(&self, freq: f32, dur: f64) {
        let Ok(osc) = self.ctx.create_oscillator() else {
            return;
        };
        let Ok(gain) = self.ctx.create_gain() else {
            return;
        };
        if osc.connect_with_audio_node(&gain).is_err() {
            return;
        }
        if gain
            .connect_with_audio_node(&self.ctx.destination())
            .is_err()
        {
            return;
        }
        osc.set_type(OscillatorType::Sine);
        let t = self.ctx.current_time();
        osc.frequency().set_value_at_time(freq, t).ok();
        gain.gain().set_value_at_time(0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + dur)
            .ok();
        if osc.start().is_ok() {
            osc.stop_with_when(t + dur).ok();
        }
    }
}
