//! CMR Agent
//!
//! The orchestration layer of the data-discovery agent:
//! - `Pipeline`, the stage sequencer threading one `QueryState` per run
//! - `LanguageOracle`, the optional text-completion capability
//! - Intent decomposition, term-expansion planning and synthesis, each with
//!   a deterministic variant used when no oracle is configured
//! - `SessionStore` for conversation history across runs
//!
//! # Example
//!
//! ```rust,no_run
//! use cmr_agent::Pipeline;
//! use cmr_core::AgentConfig;
//!
//! # async fn run() -> Result<(), cmr_agent::AgentError> {
//! let pipeline = Pipeline::builder()
//!     .with_config(AgentConfig::default().with_env_overrides())
//!     .build()?;
//! let state = pipeline
//!     .run("rainfall 2010-2012 over sub-saharan africa")
//!     .await;
//! println!("{}", state.synthesis.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod intent;
pub mod oracle;
pub mod pipeline;
pub mod planning;
pub mod session;
pub mod synthesis;

pub use error::{AgentError, AgentResult, OracleError};
pub use intent::IntentClassifier;
pub use oracle::{FallbackOracle, LanguageOracle};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use planning::{Planner, TermExpander};
pub use session::{InMemorySessionStore, SessionStore};
pub use synthesis::Synthesizer;
