pub mod args;
pub mod launch;
pub mod resolve;
pub mod scan;
pub mod synthesize;
