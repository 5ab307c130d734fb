//! Text generation for insights, narration and document extraction
//!
//! The rest of the crate only sees `TextGenerator`; `HttpTextGenerator`
//! is the one real implementation. Tests substitute their own.

mod http;

pub use http::HttpTextGenerator;

use crate::error::FinanceResult;

/// Something that turns a prompt into text
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> FinanceResult<String>;
}
