//! These models represent the objects passed between the chat client, the relay and the
//! hosted model APIs
//!
//! The chat client, the relay and the upstream providers all speak the OpenAI chat
//! completion message shape, so a single set of structs serves every hop:
//! - chat client messages, sent from the client to the relay
//! - openai-compatible messages, forwarded from the relay to the upstream provider
//!
//! Content may arrive either as a bare string or as a list of typed parts. The two forms are
//! treated as equivalent wherever text is inspected.
pub mod content;
pub mod message;
pub mod role;
