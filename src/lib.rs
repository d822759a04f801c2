//! # Navi
//!
//! Category-scoped retrieval-augmented answering for campus knowledge.
//!
//! A question arrives with an optional category ("College of
//! Engineering", "Library"), is embedded, matched against knowledge
//! entries indexed under that category, and answered by a generation
//! model instructed to use only the retrieved context. Every failure
//! becomes a degraded reply with a stable reason code instead of an error.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────┐   ┌───────────┐
//! │ CLI / HTTP   │──▶│ navi-core AnsweringPipeline  │──▶│  SQLite   │
//! │ (navi, Axum) │   │ parse ▶ retrieve ▶ prompt ▶  │   │ knowledge │
//! └──────────────┘   │ generate                     │   └───────────┘
//!                    └──────────────┬───────────────┘
//!                                   ▼
//!                    ┌──────────────────────────────┐
//!                    │ Gemini / OpenAI / Ollama     │
//!                    │ (retry, backoff, timeouts)   │
//!                    └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! navi init                                   # create database
//! navi seed ./data/campus-data.json           # embed and load a corpus
//! navi ask "[Context: Library] When do you close?" --explain
//! navi serve                                  # start the chat API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`transport`] | Retry, backoff, and timeouts for provider calls |
//! | [`provider`] | Provider endpoints and authentication |
//! | [`embedding`] | HTTP embedding adapters |
//! | [`generation`] | HTTP generation adapters |
//! | [`sqlite_store`] | SQLite-backed vector store |
//! | [`pipeline`] | Pipeline construction from config |
//! | [`server`] | Chat HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ask;
pub mod config;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod provider;
pub mod search;
pub mod seed;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod transport;
