//! LUIS quickstart
//!
//! Creates a LUIS app with an intent, a prebuilt entity, a hierarchical
//! machine-learned entity and a phrase list; attaches features; labels one
//! example; trains, publishes and queries the app.
//!
//! ```no_run
//! use luis_quickstart::{AuthoringClient, Quickstart, QuickstartConfig, RuntimeClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QuickstartConfig::from_env()?;
//! let authoring = AuthoringClient::from_config(&config)?;
//! let prediction = RuntimeClient::from_config(&config)?;
//!
//! let report = Quickstart::new(&authoring, &prediction)
//!     .with_poll_policy(config.poll)
//!     .run()
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report.prediction.prediction)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod luis;
pub mod quickstart;

pub use config::{PollPolicy, QuickstartConfig};
pub use error::{QuickstartError, Result};
pub use luis::{AuthoringApi, AuthoringClient, PredictionApi, RuntimeClient};
pub use quickstart::{Quickstart, QuickstartReport, SampleApp, Step};
