// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub API access: client creation, typed CRUD over dynamic objects, and
//! waiting for asynchronous convergence.

pub mod client;
pub mod resource;
pub mod wait;

pub use client::create_hub_client;
pub use resource::{KubeResourceClient, ResourceClient};
pub use wait::{poll_until_ready, PollOptions};
