//! Remote mutation client for the ReplyDesk server.
//!
//! [`api::CommentApi`] is the seam the desk talks to; [`api::ReplyDeskApi`]
//! implements it over HTTP with [`reqwest`]. Wire shapes and response
//! interpretation live in [`messages`].

pub mod api;
pub mod messages;
