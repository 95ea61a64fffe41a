//! Desk event stream.
//!
//! [`bus::EventBus`] fans out [`bus::DeskEvent`]s to any number of
//! subscribers; [`follower::StatsFollower`] keeps an additional stats widget
//! in step with the delta stream.

pub mod bus;
pub mod follower;
