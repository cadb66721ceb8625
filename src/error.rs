use thiserror::Error;

/// Why a panel could not be fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("api url {0} cannot take a path")]
    NotABase(String),

    #[error("refusing to forward {0}: path leaves /api")]
    InvalidPath(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Why a panel was left unrendered.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no {0} in layout")]
    MissingTarget(&'static str),

    #[error("could not encode chart: {0}")]
    Chart(#[from] serde_json::Error),
}
