pub mod report;
pub mod runner;
pub mod webhook;
pub mod yahoo;

pub use report::ReportAssembler;
pub use runner::{InstrumentOutcome, RunSummary, Runner};
pub use webhook::WebhookSink;
pub use yahoo::YahooClient;
