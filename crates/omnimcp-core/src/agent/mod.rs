//! Tool-calling conversation driver

mod tool_loop;

pub use tool_loop::{
    recent_tool_names, LoopOutcome, LoopSettings, LoopState, ToolLoop, CONTINUE_PROMPT,
    LOOK_BACK_MESSAGES,
};
