//! System prompt synthesis from server profiles

mod synthesizer;

pub use synthesizer::{generate_prompt, DEFAULT_MAX_STEPS, FALLBACK_WEATHER_SECRET};
