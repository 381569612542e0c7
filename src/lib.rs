//! # Repo Scribe
//!
//! Explains every file of a set of cloned repositories with a language
//! model, stores the explanations and their embeddings in a hosted vector
//! catalog, and answers natural-language questions about the code from
//! the closest matches.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌────────────────────┐
//! │ git clone  │──▶│ Registration │──▶│                    │
//! │ ./repos/*  │   │   (walk)     │   │  Catalog (Supabase)│
//! └────────────┘   └──────────────┘   │  code_vectors      │
//!                  ┌──────────────┐   │                    │
//!                  │   Backfill   │◀─▶│                    │
//!                  │ explain+embed│   └─────────┬──────────┘
//!                  └──────────────┘             │ match RPC
//!                                       ┌───────▼──────┐
//!                                       │    Query     │──▶ answer
//!                                       │   Pipeline   │
//!                                       └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scribe clone                       # clone the configured repositories
//! scribe sync                        # register new files, then explain them
//! scribe ask "How is forcing data regridded?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`error`] | Typed errors for external HTTP calls |
//! | [`reader`] | Content Reader (denylist, decoding, notebooks) |
//! | [`llm`] | Text-generation client |
//! | [`embedding`] | Embedding client and the Embedder |
//! | [`summarize`] | Summarizer |
//! | [`supabase_store`] | Hosted catalog client |
//! | [`connector_git`] | Repository cloning |
//! | [`connector_fs`] | Directory walk for registration |
//! | [`ingest`] | Registration pass and `sync` |
//! | [`backfill`] | Backfill pass |
//! | [`search`] | Query Pipeline |
//! | [`services`] | Explicitly constructed client bundle |
//! | [`sources`] | Configured repository listing |
//! | [`stats`] | Catalog progress overview |

pub mod backfill;
pub mod config;
pub mod connector_fs;
pub mod connector_git;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod reader;
pub mod search;
pub mod services;
pub mod sources;
pub mod stats;
pub mod summarize;
pub mod supabase_store;
