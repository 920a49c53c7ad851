//! WebAssembly bindings for the Modern Art engine.
//!
//! This module exposes the reducer to JavaScript through wasm-bindgen. State
//! and events cross the boundary as JSON strings in the same shape the client
//! already uses.

use wasm_bindgen::prelude::*;

use crate::event::Event;
use crate::game::{GameState, Outcome};
use crate::rules::Rules;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create an empty table. `rules_json` may be empty for the default rules.
    #[wasm_bindgen(constructor)]
    pub fn new(rules_json: &str) -> Result<WasmGame, JsValue> {
        let rules = if rules_json.trim().is_empty() {
            Rules::default()
        } else {
            Rules::from_json(rules_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid rules: {}", e)))?
        };

        Ok(WasmGame {
            state: GameState::with_rules(rules),
        })
    }

    /// Resume from a state snapshot
    #[wasm_bindgen(js_name = fromState)]
    pub fn from_state(state_json: &str) -> Result<WasmGame, JsValue> {
        let state: GameState = serde_json::from_str(state_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid state JSON: {}", e)))?;
        Ok(WasmGame { state })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the rules in effect as JSON
    #[wasm_bindgen(js_name = getRules)]
    pub fn get_rules(&self) -> String {
        serde_json::to_string(&self.state.rules).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether the event would pass validation
    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self, event_json: &str) -> bool {
        Event::from_json(event_json)
            .map(|event| self.state.is_valid(&event))
            .unwrap_or(false)
    }

    /// Apply an event from JSON. Returns whether it changed the state; the
    /// error string explains a refusal.
    #[wasm_bindgen(js_name = applyEvent)]
    pub fn apply_event(&mut self, event_json: &str) -> Result<bool, JsValue> {
        let event = Event::from_json(event_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid event JSON: {}", e)))?;

        match self.state.apply(&event) {
            Outcome::Applied(next) => {
                self.state = next;
                Ok(true)
            }
            Outcome::Rejected(e) | Outcome::Faulted(e) => {
                Err(JsValue::from_str(&format!("Event skipped: {}", e)))
            }
        }
    }

    /// Get the current round index
    #[wasm_bindgen(js_name = getRoundIndex)]
    pub fn get_round_index(&self) -> u32 {
        self.state.round_index
    }

    /// Get a user's total score over closed rounds
    #[wasm_bindgen(js_name = getTotalScore)]
    pub fn get_total_score(&self, user_id: &str) -> i64 {
        self.state.total_score(user_id)
    }
}
