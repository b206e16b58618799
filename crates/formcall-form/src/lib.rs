//! The form core: what the agent knows about the caller, and how that
//! knowledge reaches the frontend.
//!
//! A [`FormSession`] owns one [`formcall_types::FormState`]. Two paths
//! mutate it:
//!
//! - the language model, through the named tools in [`tools`]
//!   (`update_name`, `get_phone`, `submit_form`, ...), which get a spoken
//!   confirmation back;
//! - the frontend, whose `{"field", "value"}` packets the
//!   [`UpdateListener`] applies directly.
//!
//! Both paths end in the same [`Broadcaster`], which publishes the full
//! snapshot lossily on the session's data channel after every mutation.
//!
//! # Errors
//!
//! Nothing in here is fatal. Undecodable packets and unknown selectors are
//! logged by the listener and dropped; an incomplete form on submission is
//! an ordinary [`SubmitOutcome`], not an error.

pub mod broadcast;
pub mod error;
pub mod listener;
pub mod store;
pub mod tools;

pub use broadcast::{Broadcaster, StatePublisher};
pub use error::{FormError, PublishError};
pub use listener::{decode_update, UpdateListener};
pub use store::{FormSession, SubmitOutcome};
pub use tools::{
    dispatch, dispatch_turn, tool_definitions, FormTool, ToolCall, ToolDefinition, ToolResult,
    ToolTurn,
};
