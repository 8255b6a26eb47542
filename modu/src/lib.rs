// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

pub mod chat;
pub mod client;
pub mod config;
pub mod message;
pub mod sse;
pub mod transcript;
