use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("response did not contain the expected content")]
    EmptyResponse,

    #[error("failed to parse structured output: {0}")]
    Parse(#[from] serde_json::Error),
}
