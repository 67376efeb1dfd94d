//! # Cadence Core Library
//!
//! A task management library built around recurring-task series: completing
//! an occurrence schedules the next one, and deleting a series retires it
//! while preserving its history.
//!
//! ## Features
//!
//! - **Series Lifecycle**: Completing a recurring task atomically spawns its
//!   successor; deleting one terminates the series without erasing finished
//!   occurrences
//! - **Optimistic State**: An in-memory snapshot answers reads instantly and
//!   reconciles with the store after every mutation
//! - **Calendar-Aware Recurrence**: Daily, weekday, weekly, monthly and
//!   yearly rules with month-length and leap-year clamping
//! - **Pluggable Stores**: The same lifecycle runs against SQLite or an
//!   in-memory store with fault injection for tests
//! - **Stable Wire Format**: Records cross the store boundary under
//!   persisted field names, translated by a lossless codec
//!
//! ## Core Modules
//!
//! - [`manager`]: The lifecycle manager owning the task snapshot
//! - [`models`]: Core data structures and patch types
//! - [`recurrence`]: Next-occurrence scheduling policy
//! - [`store`]: Record store trait plus SQLite and in-memory backends
//! - [`codec`]: Field-name translation between application and store
//! - [`error`]: Error types surfaced by the lifecycle layer
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::manager::TaskManager;
//! use cadence_core::models::{Recurrence, TaskDraft};
//! use cadence_core::store::SqliteStore;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Open the database and load this owner's tasks
//!     let store = SqliteStore::connect("tasks.db").await?;
//!     let manager = TaskManager::new(store);
//!     let owner = Uuid::now_v7();
//!     manager.fetch_all(owner).await?;
//!
//!     // Add a recurring task
//!     let draft = TaskDraft {
//!         title: "Daily standup".to_string(),
//!         recurrence: Recurrence::Daily,
//!         ..Default::default()
//!     };
//!
//!     let task = manager.add(draft).await?;
//!     println!("Created task: {}", task.title);
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod manager;
pub mod models;
pub mod recurrence;
pub mod store;
