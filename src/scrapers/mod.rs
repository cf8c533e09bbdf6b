pub mod cards;
pub mod discovery;
pub mod extract;
pub mod http;
pub mod jsonld;
pub mod pagination;
pub mod squarefoot;
pub mod traits;
pub mod types;

pub use http::HttpFetcher;
pub use squarefoot::SquarefootScraper;
