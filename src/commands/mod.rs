/*!
 * CLI command implementations
 */

pub mod ingest;
pub mod init;
pub mod input;

pub use ingest::{ingest, IngestReport};
pub use init::write_default_config;
pub use input::{parse_session, parse_telemetry};
