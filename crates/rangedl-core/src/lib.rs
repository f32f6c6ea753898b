//! Resumable multi-block HTTP downloads.
//!
//! A [`session::DownloadSession`] probes the resource, splits it into blocks
//! tracked by a persistent [`ledger::Ledger`], fetches blocks concurrently and
//! moves the finished file into place.

pub mod config;
pub mod control;
pub mod fetch;
pub mod http;
pub mod ledger;
pub mod logging;
pub mod notify;
pub mod probe;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod url_model;

pub use control::CancelToken;
pub use notify::{DownloadListener, FinishCode};
pub use session::{DownloadSession, SessionError, SessionOutcome};
